//! The byte-stream contract the transaction engine runs on, plus the TCP
//! implementation used with real hardware.
//!
//! The engine owns the transport for exactly one command batch: it calls
//! [`Transport::open`] at the start, arms a deadline before each write and
//! read, and closes the transport when the batch ends. Anything satisfying
//! this shape works — the LAN port of the supply, a serial bridge, or the
//! scripted mock used in tests.

use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Minimal capability set the engine requires from a connection.
pub trait Transport {
    fn open(&mut self) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;

    /// Arm an absolute deadline for subsequent reads and writes.
    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Write the whole buffer, retrying short writes.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "transport accepted no data",
                    ));
                }
                Ok(written) => buf = &buf[written..],
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// How long [`TcpTransport::open`] waits for the connection to come up.
const DIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// TCP transport for the LAN interface of the supply.
///
/// The stream exists only between `open` and `close`; every batch dials a
/// fresh connection, matching the device's single-session semantics.
pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Address the supply's LAN port, e.g. host `"192.168.1.50"` port `9221`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            stream: None,
        }
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not open"))
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> io::Result<()> {
        let mut last_err = None;
        for addr in self.addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, DIAL_TIMEOUT) {
                Ok(stream) => {
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "address resolved to nothing")
        }))
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(stream) = self.stream.take() {
            stream.shutdown(Shutdown::Both)?;
        }
        Ok(())
    }

    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        // Sockets take relative timeouts; a zero duration would be rejected,
        // so an already-expired deadline degrades to the shortest one.
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(Duration::from_millis(1));
        let stream = self.stream()?;
        stream.set_read_timeout(Some(remaining))?;
        stream.set_write_timeout(Some(remaining))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self.stream()?, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(self.stream()?, buf)
    }
}
