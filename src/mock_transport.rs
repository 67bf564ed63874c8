//! We use this mocking module in unit tests to emulate the device connection.

use std::collections::VecDeque;
use std::io;
use std::time::Instant;

use crate::transport::Transport;

/// Our mock type used to emulate the supply's stream connection.
///
/// Replies are scripted per read call: the device answers each request with
/// one line, so each `read` hands out exactly one queued chunk.
pub struct MockTransport {
    /// Everything written through the transport, in order.
    write_buffer: Vec<u8>,
    /// Pre-configured reply chunks, one per expected read.
    read_queue: VecDeque<Vec<u8>>,
    open_calls: usize,
    close_calls: usize,
    deadline_calls: usize,
    write_calls: usize,
    read_calls: usize,
    /// Flag to simulate a connection failure.
    should_error_on_open: bool,
    /// Fail the nth write (1-based), if set.
    fail_write_at: Option<usize>,
    /// Fail the nth read (1-based), if set.
    fail_read_at: Option<usize>,
    /// Flag to simulate deadline arming failures.
    should_error_on_deadline: bool,
    /// Flag to simulate a close failure.
    should_error_on_close: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            write_buffer: Vec::new(),
            read_queue: VecDeque::new(),
            open_calls: 0,
            close_calls: 0,
            deadline_calls: 0,
            write_calls: 0,
            read_calls: 0,
            should_error_on_open: false,
            fail_write_at: None,
            fail_read_at: None,
            should_error_on_deadline: false,
            should_error_on_close: false,
        }
    }

    /// Queue one reply line; the terminator is appended here.
    pub fn push_reply(&mut self, line: &str) {
        self.read_queue.push_back(format!("{line}\r\n").into_bytes());
    }

    /// Queue raw bytes served by a single read, exactly as given.
    pub fn push_raw(&mut self, data: &[u8]) {
        self.read_queue.push_back(data.to_vec());
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.write_buffer
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn deadline_calls(&self) -> usize {
        self.deadline_calls
    }

    pub fn set_open_error(&mut self, should_error: bool) {
        self.should_error_on_open = should_error;
    }

    /// Make the nth write (1-based) fail.
    pub fn fail_write_at(&mut self, nth: usize) {
        self.fail_write_at = Some(nth);
    }

    /// Make the nth read (1-based) fail.
    pub fn fail_read_at(&mut self, nth: usize) {
        self.fail_read_at = Some(nth);
    }

    pub fn set_deadline_error(&mut self, should_error: bool) {
        self.should_error_on_deadline = should_error;
    }

    pub fn set_close_error(&mut self, should_error: bool) {
        self.should_error_on_close = should_error;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> io::Result<()> {
        self.open_calls += 1;
        if self.should_error_on_open {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "simulated"));
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.close_calls += 1;
        if self.should_error_on_close {
            return Err(io::Error::other("simulated"));
        }
        Ok(())
    }

    fn set_deadline(&mut self, _deadline: Instant) -> io::Result<()> {
        self.deadline_calls += 1;
        if self.should_error_on_deadline {
            return Err(io::Error::other("simulated"));
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_calls += 1;
        if self.fail_read_at == Some(self.read_calls) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "simulated"));
        }
        let chunk = self
            .read_queue
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "no reply queued"))?;
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls += 1;
        if self.fail_write_at == Some(self.write_calls) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated"));
        }
        self.write_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_one_reply_per_read() {
        let mut mock = MockTransport::new();
        mock.push_reply("12.00V");
        mock.push_reply("1");

        let mut buf = [0u8; 64];
        let n = mock.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"12.00V\r\n");
        let n = mock.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"1\r\n");

        // Queue exhausted.
        assert!(mock.read(&mut buf).is_err());
    }

    #[test]
    fn records_writes_in_order() {
        let mut mock = MockTransport::new();
        mock.write(b"V1O?\r\n").unwrap();
        mock.write(b"OP1?\r\n").unwrap();
        assert_eq!(mock.written(), b"V1O?\r\nOP1?\r\n");
    }

    #[test]
    fn fails_the_requested_write() {
        let mut mock = MockTransport::new();
        mock.fail_write_at(2);
        assert!(mock.write(b"first").is_ok());
        assert!(mock.write(b"second").is_err());
        assert_eq!(mock.written(), b"first");
    }

    #[test]
    fn counts_lifecycle_calls() {
        let mut mock = MockTransport::new();
        mock.open().unwrap();
        mock.set_deadline(Instant::now()).unwrap();
        mock.close().unwrap();
        assert_eq!(mock.open_calls(), 1);
        assert_eq!(mock.deadline_calls(), 1);
        assert_eq!(mock.close_calls(), 1);
    }
}
