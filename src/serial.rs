//! Interrupt driven serial driver.
//!
//! Thread context enqueues with [`Serial::put_byte`]; the peripheral's
//! interrupt calls [`Serial::on_transmit_complete`] to feed the next byte.
//! Both paths update the ring inside a short critical section and talk to
//! the hardware outside of it.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use critical_section::Mutex;
use embedded_hal::serial;

use crate::hal::{Receive, Transmit};
use crate::ring::{Full, TxRing};

#[derive(Clone, Copy)]
struct RxState {
    latched: Option<u8>,
    enabled: bool,
}

impl RxState {
    const fn new() -> Self {
        Self {
            latched: None,
            enabled: false,
        }
    }
}

pub struct Serial<U, const N: usize> {
    tx: Mutex<RefCell<TxRing<N>>>,
    rx: Mutex<Cell<RxState>>,
    uart: U,
}

impl<U, const N: usize> Serial<U, N> {
    pub const fn new(uart: U) -> Self {
        Self {
            tx: Mutex::new(RefCell::new(TxRing::new())),
            rx: Mutex::new(Cell::new(RxState::new())),
            uart,
        }
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Empties the ring, clears the in-flight flag and the receive latch.
    ///
    /// Call before the peripheral interrupt is unmasked.
    pub fn init(&self) {
        critical_section::with(|cs| {
            self.tx.borrow_ref_mut(cs).reset();
            self.rx.borrow(cs).set(RxState::new());
        });
        debug!("serial: {=usize} byte transmit ring", N);
    }

    /// Bytes waiting or on the wire.
    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.tx.borrow_ref(cs).len())
    }

    /// Bytes rejected because the ring was full.
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.tx.borrow_ref(cs).dropped())
    }

    /// Counts bytes a caller gave up on without offering them to the ring.
    pub(crate) fn note_dropped(&self, count: u32) {
        critical_section::with(|cs| self.tx.borrow_ref_mut(cs).note_dropped(count));
    }

    /// Latches a received byte. Interrupt context.
    pub fn on_receive(&self, byte: u8) {
        let overrun = critical_section::with(|cs| {
            let cell = self.rx.borrow(cs);
            let mut rx = cell.get();
            let overrun = rx.latched.replace(byte).is_some();
            cell.set(rx);
            overrun
        });
        if overrun {
            warn!("serial: unread byte overwritten");
        }
    }

    /// Reports a peripheral error event. Nothing is retried.
    pub fn on_error(&self, source: u32) {
        error!("Error: reported by UART peripheral, source {=u32:#x}", source);
    }
}

impl<U: Transmit, const N: usize> Serial<U, N> {
    /// Queues one byte for transmission.
    ///
    /// Returns `false` and drops the byte when the ring is full. When the
    /// line is idle the oldest byte goes out before this returns.
    pub fn put_byte(&self, byte: u8) -> bool {
        match critical_section::with(|cs| self.tx.borrow_ref_mut(cs).push(byte)) {
            Ok(Some(start)) => {
                self.uart.start_transmit(start);
                true
            }
            Ok(None) => true,
            Err(Full) => false,
        }
    }

    /// Queues `bytes` in order and returns how many were accepted.
    ///
    /// Stops at the first rejected byte; the rest count as dropped.
    pub fn write(&self, bytes: &[u8]) -> usize {
        for (i, &byte) in bytes.iter().enumerate() {
            if !self.put_byte(byte) {
                self.note_dropped((bytes.len() - i - 1) as u32);
                return i;
            }
        }
        bytes.len()
    }

    /// The hardware finished the in-flight byte. Interrupt context.
    pub fn on_transmit_complete(&self) {
        if let Some(next) = critical_section::with(|cs| self.tx.borrow_ref_mut(cs).complete()) {
            self.uart.start_transmit(next);
        }
    }

    /// Services a finished byte without the interrupt.
    ///
    /// For code that runs with the completion interrupt masked. The hardware
    /// event is consumed, so the interrupt won't see the same completion.
    pub fn poll_transmit_complete(&self) -> bool {
        if self.uart.take_transmit_complete() {
            self.on_transmit_complete();
            true
        } else {
            false
        }
    }

    pub fn is_idle(&self) -> bool {
        critical_section::with(|cs| self.tx.borrow_ref(cs).is_empty())
            && !self.uart.transmit_in_progress()
    }
}

impl<U: Receive, const N: usize> Serial<U, N> {
    /// Enables interrupt driven reception and arms the first byte.
    pub fn enable_receive(&self) {
        critical_section::with(|cs| {
            self.rx.borrow(cs).set(RxState {
                latched: None,
                enabled: true,
            })
        });
        self.uart.start_receive();
    }

    pub fn disable_receive(&self) {
        critical_section::with(|cs| {
            let cell = self.rx.borrow(cs);
            let mut rx = cell.get();
            rx.enabled = false;
            cell.set(rx);
        });
        self.uart.stop_receive();
    }

    /// Takes the latched byte, re-arming the receiver while reception is
    /// enabled.
    ///
    /// With reception disabled an empty latch falls through to a polled
    /// read of the peripheral.
    pub fn get_byte(&self) -> Option<u8> {
        let (byte, enabled) = critical_section::with(|cs| {
            let cell = self.rx.borrow(cs);
            let mut rx = cell.get();
            let byte = rx.latched.take();
            cell.set(rx);
            (byte, rx.enabled)
        });
        match byte {
            Some(byte) => {
                if enabled {
                    self.uart.start_receive();
                }
                Some(byte)
            }
            None if !enabled => self.uart.poll_receive(),
            None => None,
        }
    }
}

impl<U: Transmit, const N: usize> serial::Write<u8> for Serial<U, N> {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.put_byte(word) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<U: Receive, const N: usize> serial::Read<u8> for Serial<U, N> {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.get_byte().ok_or(nb::Error::WouldBlock)
    }
}
