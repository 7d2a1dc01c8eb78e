//! Log output port.
//!
//! The logging front end hands finished records to [`LogPort::output`] and
//! brackets multi-part records with [`LogPort::lock`], which returns a guard
//! that releases the lock when it goes out of scope.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::hal::Transmit;
use crate::record::{self, Level, RecordInfo};
use crate::serial::Serial;

/// Completion polls a polled write waits for one free slot before it gives
/// up on the hardware and drops the rest.
pub const POLL_LIMIT: u32 = 1_000_000;

/// Mutual exclusion between log writers.
pub trait OutputLock {
    type Guard;

    /// Holding the lock keeps the serial interrupt from running, so output
    /// under it has to poll the hardware for free ring slots.
    const MASKS_INTERRUPTS: bool;

    fn acquire(&self) -> Self::Guard;
}

/// Masks interrupts for as long as the guard lives. For builds without a
/// scheduler.
pub struct IrqLock;

pub struct IrqGuard(critical_section::RestoreState);

impl OutputLock for IrqLock {
    type Guard = IrqGuard;

    const MASKS_INTERRUPTS: bool = true;

    fn acquire(&self) -> IrqGuard {
        // SAFETY: released exactly once when the guard drops; guards are
        // scoped so releases nest in reverse order of acquisition.
        IrqGuard(unsafe { critical_section::acquire() })
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        // SAFETY: the state came from the matching `acquire`.
        unsafe { critical_section::release(self.0) }
    }
}

/// For ports that already sit behind a lock, such as an RTIC resource.
pub struct NoLock;

impl OutputLock for NoLock {
    type Guard = ();

    const MASKS_INTERRUPTS: bool = false;

    fn acquire(&self) {}
}

pub struct LogPort<'a, U, L, const N: usize> {
    serial: &'a Serial<U, N>,
    lock: L,
    lock_enabled: AtomicBool,
    output_enabled: AtomicBool,
    polled: AtomicBool,
}

impl<'a, U, L, const N: usize> LogPort<'a, U, L, N> {
    pub const fn new(serial: &'a Serial<U, N>, lock: L) -> Self {
        Self {
            serial,
            lock,
            lock_enabled: AtomicBool::new(true),
            output_enabled: AtomicBool::new(true),
            polled: AtomicBool::new(false),
        }
    }

    pub fn serial(&self) -> &'a Serial<U, N> {
        self.serial
    }

    /// With the lock disabled, [`lock`](Self::lock) hands out guards that
    /// hold nothing. Fault handlers turn it off so a writer that died
    /// holding the lock can't silence them.
    pub fn set_lock_enabled(&self, enabled: bool) {
        self.lock_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Switches all output on or off.
    pub fn set_output_enabled(&self, enabled: bool) {
        self.output_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn output_enabled(&self) -> bool {
        self.output_enabled.load(Ordering::Relaxed)
    }

    /// Waits for ring space by polling the hardware instead of dropping
    /// bytes. Only sound while the serial interrupt can't run.
    pub fn set_polled(&self, polled: bool) {
        self.polled.store(polled, Ordering::Relaxed);
    }
}

impl<'a, U: Transmit, L: OutputLock, const N: usize> LogPort<'a, U, L, N> {
    /// Sends a finished log record. Returns how many bytes were queued.
    pub fn output(&self, bytes: &[u8]) -> usize {
        self.emit(bytes, self.polled.load(Ordering::Relaxed))
    }

    pub fn lock(&self) -> OutputGuard<'_, 'a, U, L, N> {
        let held = if self.lock_enabled.load(Ordering::Relaxed) {
            Some(self.lock.acquire())
        } else {
            None
        };
        let polled =
            self.polled.load(Ordering::Relaxed) || (held.is_some() && L::MASKS_INTERRUPTS);

        OutputGuard {
            port: self,
            polled,
            truncated: false,
            _held: held,
        }
    }

    fn emit(&self, bytes: &[u8], polled: bool) -> usize {
        if !self.output_enabled() {
            return 0;
        }
        if !polled {
            return self.serial.write(bytes);
        }

        for (i, &byte) in bytes.iter().enumerate() {
            let mut spins = 0;
            while self.serial.pending() >= N {
                if spins == POLL_LIMIT {
                    // the UARTE is not finishing bytes, e.g. never set up
                    self.serial.note_dropped((bytes.len() - i) as u32);
                    return i;
                }
                self.serial.poll_transmit_complete();
                spins += 1;
            }
            self.serial.put_byte(byte);
        }
        bytes.len()
    }
}

/// Output access while the port lock is held.
///
/// Once a piece of the record is cut short, the rest of the record is
/// dropped too, so the line never goes out with a hole in it.
pub struct OutputGuard<'p, 'a, U, L: OutputLock, const N: usize> {
    port: &'p LogPort<'a, U, L, N>,
    polled: bool,
    truncated: bool,
    _held: Option<L::Guard>,
}

impl<U: Transmit, L: OutputLock, const N: usize> OutputGuard<'_, '_, U, L, N> {
    pub fn output(&mut self, bytes: &[u8]) -> usize {
        if self.truncated {
            self.port.serial.note_dropped(bytes.len() as u32);
            return 0;
        }
        let sent = self.port.emit(bytes, self.polled);
        if sent < bytes.len() && self.port.output_enabled() {
            self.truncated = true;
        }
        sent
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Writes one full record: header, message and line end.
    pub fn record<I: RecordInfo>(
        &mut self,
        level: Level,
        tag: &str,
        info: &I,
        args: fmt::Arguments<'_>,
    ) -> fmt::Result {
        record::write_header(&mut *self, level, tag, info)?;
        fmt::Write::write_fmt(self, args)?;
        fmt::Write::write_str(self, "\r\n")
    }
}

impl<U: Transmit, L: OutputLock, const N: usize> fmt::Write for OutputGuard<'_, '_, U, L, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output(s.as_bytes());
        if self.truncated {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}
