//! Client for the CPX400 dual-output bench supply.
//!
//! Every public operation runs as one transaction: the transport is opened,
//! the commands of the batch are written and answered strictly in order, and
//! the transport is closed again whatever happened in between. The device
//! assumes in-order request/response within a session, so a batch never
//! interleaves with another — `&mut self` on every operation enforces that
//! per client.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Protocol line terminator for both directions.
const LINE_TERMINATOR: &str = "\r\n";

/// Replies are a handful of bytes; this caps a single read.
const REPLY_BUFFER_LEN: usize = 64;

/// Deadline applied to each read and write unless overridden.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);

/// You can create a CpxPsu over anything implementing [`Transport`].
///
/// For its methods we use the nomenclature that "set" means to write a
/// configuration, "get" means to read back a configuration value, and "read"
/// means to get a measured value.
///
/// Voltages and currents are handled as the decimal strings the protocol
/// carries. Parsing them into floats is left to the caller so no precision is
/// lost on the way through.
pub struct CpxPsu<T: Transport> {
    transport: T,
    deadline: Duration,
}

/// Snapshot of one output section, built fresh per query.
///
/// Fields decoded from replies that failed framing stay at their defaults;
/// treat an empty string as "unknown", not as a device value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Section {
    pub enabled: bool,
    pub actual_voltage: String,
    pub set_voltage: String,
    pub actual_current: String,
    pub set_current: String,
}

/// Configures and validates a [`CpxPsu`].
pub struct Builder<T> {
    transport: Option<T>,
    deadline: Duration,
}

impl<T: Transport> Builder<T> {
    pub fn new() -> Self {
        Self {
            transport: None,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Per-operation read/write deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Fails with [`Error::NoTransport`] when no transport was supplied.
    pub fn build(self) -> Result<CpxPsu<T>> {
        let transport = self.transport.ok_or(Error::NoTransport)?;
        Ok(CpxPsu {
            transport,
            deadline: self.deadline,
        })
    }
}

impl<T: Transport> Default for Builder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> CpxPsu<T> {
    /// Create a client with the default deadline.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn builder() -> Builder<T> {
        Builder::new()
    }

    /// Query the full view of one section: output state, measured and
    /// configured voltage, measured and configured current.
    ///
    /// A malformed state token is logged and leaves `enabled` at its default;
    /// fields whose reply failed framing stay empty.
    pub fn section(&mut self, section: u32) -> Result<Section> {
        let commands = [
            Command::get_state(section),
            Command::actual_voltage(section),
            Command::set_voltage(section),
            Command::actual_current(section),
            Command::set_current(section),
        ];
        let replies = self.transact(&commands)?;

        let mut result = Section::default();
        if let Some(token) = replies.get(&commands[0].wire()) {
            match parse_state(token) {
                Ok(enabled) => result.enabled = enabled,
                Err(err) => error!("error on parsing state: {err}"),
            }
        }
        if let Some(value) = replies.get(&commands[1].wire()) {
            result.actual_voltage = value.clone();
        }
        if let Some(value) = replies.get(&commands[2].wire()) {
            result.set_voltage = value.clone();
        }
        if let Some(value) = replies.get(&commands[3].wire()) {
            result.actual_current = value.clone();
        }
        if let Some(value) = replies.get(&commands[4].wire()) {
            result.set_current = value.clone();
        }
        Ok(result)
    }

    /// Read the measured output voltage of a section.
    pub fn read_voltage(&mut self, section: u32) -> Result<String> {
        self.query(Command::actual_voltage(section))
    }

    /// Get the configured voltage setpoint of a section.
    pub fn get_voltage(&mut self, section: u32) -> Result<String> {
        self.query(Command::set_voltage(section))
    }

    /// Read the measured output current of a section.
    pub fn read_current(&mut self, section: u32) -> Result<String> {
        self.query(Command::actual_current(section))
    }

    /// Get the configured current limit of a section.
    pub fn get_current(&mut self, section: u32) -> Result<String> {
        self.query(Command::set_current(section))
    }

    /// Read whether the section's output is enabled.
    pub fn get_output_state(&mut self, section: u32) -> Result<bool> {
        let token = self.query(Command::get_state(section))?;
        parse_state(&token)
    }

    /// Enable or disable the section's output.
    ///
    /// The state is read back in the same transaction and returned, so the
    /// result reflects what the device actually did, not what was requested.
    pub fn set_output_state(&mut self, section: u32, on: bool) -> Result<bool> {
        let commands = [Command::set_state(section, on), Command::get_state(section)];
        let replies = self.transact(&commands)?;
        let token = replies
            .get(&commands[1].wire())
            .cloned()
            .unwrap_or_default();
        parse_state(&token)
    }

    /// Single-command batch; an absent entry decodes to an empty string.
    fn query(&mut self, command: Command) -> Result<String> {
        let wire = command.wire();
        let replies = self.transact(std::slice::from_ref(&command))?;
        Ok(replies.get(&wire).cloned().unwrap_or_default())
    }

    /// Execute an ordered command batch over a freshly opened transport.
    ///
    /// Open, write and read failures abort the batch; framing failures skip
    /// only the affected command, leaving its key absent from the map. Keys
    /// are the exact wire strings, so a batch issuing the identical command
    /// twice collapses to the last reply.
    fn transact(&mut self, commands: &[Command]) -> Result<HashMap<String, String>> {
        debug!("connecting");
        self.transport.open().map_err(|err| {
            error!("failed to connect: {err}");
            Error::Connect(err)
        })?;
        // Guard drops on every exit path, so the transport always closes.
        let conn = OpenGuard {
            transport: &mut self.transport,
        };

        let mut replies = HashMap::new();
        let mut buffer = [0u8; REPLY_BUFFER_LEN];
        for command in commands {
            let wire = command.wire();
            arm_deadline(&mut *conn.transport, self.deadline);
            debug!("writing {wire:?}");
            let frame = format!("{wire}{LINE_TERMINATOR}");
            if let Err(err) = conn.transport.write_all(frame.as_bytes()) {
                error!("error on write: {err}");
                return Err(err.into());
            }
            if command.write_only() {
                continue;
            }

            arm_deadline(&mut *conn.transport, self.deadline);
            let size = match conn.transport.read(&mut buffer) {
                Ok(size) => size,
                Err(err) => {
                    error!("error on read: {err}");
                    return Err(err.into());
                }
            };
            let raw = String::from_utf8_lossy(&buffer[..size]);
            let line = raw.strip_suffix(LINE_TERMINATOR).unwrap_or(raw.as_ref());
            debug!("received {line:?}");

            let tokens: Vec<&str> = line.split(' ').collect();
            match command.parse(&tokens) {
                Ok(value) => {
                    replies.insert(wire, value);
                }
                Err(err) => error!("error: {err}, on parsing reply to {wire}"),
            }
        }

        Ok(replies)
    }
}

/// Closes the transport when the transaction scope ends, including on early
/// returns and panics. A close failure never overrides the batch result.
struct OpenGuard<'a, T: Transport> {
    transport: &'a mut T,
}

impl<T: Transport> Drop for OpenGuard<'_, T> {
    fn drop(&mut self) {
        debug!("disconnecting");
        if let Err(err) = self.transport.close() {
            error!("failed to disconnect: {err}");
        }
    }
}

/// Arming a deadline is best-effort; a failure is logged, not fatal.
fn arm_deadline<T: Transport>(transport: &mut T, timeout: Duration) {
    if let Err(err) = transport.set_deadline(Instant::now() + timeout) {
        error!("error on setting deadline: {err}");
    }
}

fn parse_state(token: &str) -> Result<bool> {
    match token {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(Error::InvalidState(other.to_string())),
    }
}
