//! Wire encoding and reply decoding for the CPX400 command set.
//!
//! Each command kind pairs its request string with the decoding rule for the
//! reply it provokes, so the two cannot drift apart. Replies are single ASCII
//! lines; the engine hands them to [`Command::parse`] already stripped of the
//! `\r\n` terminator and split on single spaces.

use strum_macros::EnumIter;

use crate::error::{Error, Result};

/// All request kinds understood by the CPX400.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub(crate) enum Kind {
    /// Measured output voltage, e.g. request `V1O?`, reply `12.00V`.
    ActualVoltage,
    /// Configured voltage setpoint, e.g. request `V1?`, reply `V1 12.00`.
    SetVoltage,
    /// Measured output current, e.g. request `I1O?`, reply `0.50A`.
    ActualCurrent,
    /// Configured current limit, e.g. request `I1?`, reply `I1 1.00`.
    SetCurrent,
    /// Output enable state, e.g. request `OP1?`, reply `1`.
    GetState,
    /// Output enable write, e.g. `OP1 1`. The device sends no reply.
    SetState,
}

/// A single protocol operation against one output section.
///
/// Sections use the device-native 1-based numbering and are rendered as
/// decimal in the wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Command {
    kind: Kind,
    section: u32,
    value: Option<bool>,
}

impl Command {
    pub(crate) fn actual_voltage(section: u32) -> Self {
        Self { kind: Kind::ActualVoltage, section, value: None }
    }

    pub(crate) fn set_voltage(section: u32) -> Self {
        Self { kind: Kind::SetVoltage, section, value: None }
    }

    pub(crate) fn actual_current(section: u32) -> Self {
        Self { kind: Kind::ActualCurrent, section, value: None }
    }

    pub(crate) fn set_current(section: u32) -> Self {
        Self { kind: Kind::SetCurrent, section, value: None }
    }

    pub(crate) fn get_state(section: u32) -> Self {
        Self { kind: Kind::GetState, section, value: None }
    }

    pub(crate) fn set_state(section: u32, on: bool) -> Self {
        Self { kind: Kind::SetState, section, value: Some(on) }
    }

    /// Render the request as it goes on the wire, without the terminator.
    pub(crate) fn wire(&self) -> String {
        match self.kind {
            Kind::ActualVoltage => format!("V{}O?", self.section),
            Kind::SetVoltage => format!("V{}?", self.section),
            Kind::ActualCurrent => format!("I{}O?", self.section),
            Kind::SetCurrent => format!("I{}?", self.section),
            Kind::GetState => format!("OP{}?", self.section),
            Kind::SetState => {
                let on = matches!(self.value, Some(true));
                format!("OP{} {}", self.section, if on { "1" } else { "0" })
            }
        }
    }

    /// Whether the device stays silent after this command.
    pub(crate) fn write_only(&self) -> bool {
        matches!(self.kind, Kind::SetState)
    }

    /// Decode a reply line, split on single spaces.
    ///
    /// Token-count mismatches yield [`Error::UnexpectedReplyLength`]. Calling
    /// this on a write-only command is a bug in the engine, not a runtime
    /// condition, and panics.
    pub(crate) fn parse(&self, tokens: &[&str]) -> Result<String> {
        match self.kind {
            Kind::ActualVoltage => {
                let token = single(tokens)?;
                Ok(token.strip_suffix('V').unwrap_or(token).to_string())
            }
            Kind::ActualCurrent => {
                let token = single(tokens)?;
                Ok(token.strip_suffix('A').unwrap_or(token).to_string())
            }
            Kind::SetVoltage | Kind::SetCurrent => second(tokens).map(str::to_string),
            Kind::GetState => single(tokens).map(str::to_string),
            Kind::SetState => unreachable!("write-only command has no reply to parse"),
        }
    }
}

fn single<'a>(tokens: &[&'a str]) -> Result<&'a str> {
    match tokens {
        [token] => Ok(token),
        _ => Err(Error::UnexpectedReplyLength),
    }
}

fn second<'a>(tokens: &[&'a str]) -> Result<&'a str> {
    match tokens {
        [_, token] => Ok(token),
        _ => Err(Error::UnexpectedReplyLength),
    }
}
