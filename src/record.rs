//! Record prefix.
//!
//! Every record starts with `<level>/<tag> [<time> <process> <thread>] `.
//! The time and origin fields come from the board through [`RecordInfo`];
//! empty origin fields are left out.

use core::fmt::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Assert,
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
}

impl Level {
    pub const fn letter(self) -> char {
        match self {
            Level::Assert => 'A',
            Level::Error => 'E',
            Level::Warn => 'W',
            Level::Info => 'I',
            Level::Debug => 'D',
            Level::Verbose => 'V',
        }
    }
}

/// When and where a record was produced.
pub trait RecordInfo {
    fn write_time<W: Write>(&self, w: &mut W) -> fmt::Result;

    fn process(&self) -> &str {
        ""
    }

    fn thread(&self) -> &str {
        ""
    }
}

/// A tick count and the name of the context that logs.
#[derive(Clone, Copy, Debug)]
pub struct Ticks<'a> {
    pub ticks: u32,
    pub thread: &'a str,
}

impl RecordInfo for Ticks<'_> {
    fn write_time<W: Write>(&self, w: &mut W) -> fmt::Result {
        write!(w, "tick:{:010}", self.ticks)
    }

    fn thread(&self) -> &str {
        self.thread
    }
}

pub fn write_header<W: Write, I: RecordInfo>(
    w: &mut W,
    level: Level,
    tag: &str,
    info: &I,
) -> fmt::Result {
    write!(w, "{}/{} [", level.letter(), tag)?;
    info.write_time(w)?;
    for field in [info.process(), info.thread()] {
        if !field.is_empty() {
            write!(w, " {}", field)?;
        }
    }
    w.write_str("] ")
}
