//! Serial log output for nRF52 boards.
//!
//! A one-byte-in-flight transmit ring fed from thread context and drained by
//! the UARTE's transmit-complete interrupt, plus the output port a logging
//! front end writes records through.
#![cfg_attr(not(test), no_std)]

// must come first, the other modules use its macros
#[macro_use]
mod fmt;

pub mod config;
pub mod fault;
pub mod hal;
pub mod port;
pub mod record;
pub mod ring;
pub mod serial;

#[cfg(test)]
mod mock;

pub use config::{BaudRate, Error, SerialConfig, TX_BUFFER_SIZE};
pub use port::{IrqLock, LogPort, NoLock, OutputGuard, OutputLock};
pub use record::{Level, RecordInfo, Ticks};
pub use serial::Serial;
