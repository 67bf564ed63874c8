//! This crate provides an interface for remote-controlling the Aim-TTi CPX400
//! series of dual-output bench power supplies.
//!
//! The device speaks a line-oriented ASCII protocol over a byte stream,
//! usually the LAN port. Requests and replies are single lines terminated
//! with `\r\n`:
//!
//! | Request | Reply | Meaning |
//! |---|---|---|
//! | `V1O?` | `12.00V` | Measured voltage of section 1 |
//! | `V1?` | `V1 12.50` | Voltage setpoint of section 1 |
//! | `I1O?` | `0.50A` | Measured current of section 1 |
//! | `I1?` | `I1 1.00` | Current limit of section 1 |
//! | `OP1?` | `1` | Output state of section 1 |
//! | `OP1 1` | (none) | Enable output of section 1 |
//!
//! Output sections are numbered from 1, as on the device itself.
//!
//! Every operation of [`psu::CpxPsu`] runs as its own transaction: the
//! transport is opened, the commands are exchanged in order with a deadline
//! armed per read and write, and the transport is closed again. Values travel
//! as the decimal strings the protocol carries so nothing is lost to float
//! round-trips.
//!
//! The client runs over anything implementing [`transport::Transport`];
//! [`transport::TcpTransport`] covers the common case. [`monitor::Monitor`]
//! adds background polling for presentation layers that want periodic
//! refreshes.
//!
//! Diagnostics go through the [`log`] facade: protocol traces at debug level,
//! faults at error level.

pub mod error;
pub mod monitor;
pub mod psu;
pub mod transport;

mod command;

#[cfg(test)]
mod mock_transport;
