//! UARTE0 behind the serial driver.
//!
//! The HAL sets the peripheral up (pins, baud rate, parity); after that the
//! driver talks to the registers directly, one byte per EasyDMA transfer,
//! and the UARTE0 interrupt reports ENDTX / ENDRX / ERROR.

use core::ptr::{addr_of, addr_of_mut};
use core::sync::atomic::{compiler_fence, AtomicBool, Ordering};

use elog_serial::hal::{Receive, Transmit};
use elog_serial::{BaudRate, Serial, SerialConfig};
use nrf52840_hal::pac::{uarte0, UARTE0};
use nrf52840_hal::uarte::{Baudrate, Parity, Pins, Uarte};

// EasyDMA only reads and writes RAM, so the bytes live in statics.
static mut TX_BYTE: u8 = 0;
static mut RX_BYTE: u8 = 0;

pub struct Uarte0 {
    busy: AtomicBool,
    // a polled receive is waiting for ENDRX
    rx_armed: AtomicBool,
}

impl Uarte0 {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            rx_armed: AtomicBool::new(false),
        }
    }

    fn regs(&self) -> &'static uarte0::RegisterBlock {
        // SAFETY: the HAL driver that owned the peripheral was handed to
        // `attach`; from then on only this type touches it.
        unsafe { &*UARTE0::ptr() }
    }

    /// Takes over a configured HAL driver and enables the events the serial
    /// driver runs on.
    pub fn attach(&self, uarte: Uarte<UARTE0>) {
        // Prevent the uart handle from being dropped and thus being deinitalized
        core::mem::forget(uarte);

        let regs = self.regs();
        regs.events_endtx.reset();
        regs.events_endrx.reset();
        regs.events_error.reset();
        self.busy.store(false, Ordering::Relaxed);
        self.rx_armed.store(false, Ordering::Relaxed);

        regs.intenset
            .write(|w| w.endtx().set().endrx().set().error().set());
    }

    /// The byte of a finished receive. `None` when the receive was stopped
    /// before anything arrived.
    pub fn take_received(&self) -> Option<u8> {
        let regs = self.regs();
        if regs.events_endrx.read().bits() == 0 {
            return None;
        }
        regs.events_endrx.reset();
        self.rx_armed.store(false, Ordering::Relaxed);
        compiler_fence(Ordering::SeqCst);

        if regs.rxd.amount.read().bits() == 0 {
            return None;
        }
        // SAFETY: the DMA transfer into RX_BYTE has ended.
        Some(unsafe { addr_of!(RX_BYTE).read_volatile() })
    }

    /// The ERRORSRC bits of a pending error event, cleared.
    pub fn take_error(&self) -> Option<u32> {
        let regs = self.regs();
        if regs.events_error.read().bits() == 0 {
            return None;
        }
        regs.events_error.reset();

        let source = regs.errorsrc.read().bits();
        // write-one-to-clear
        regs.errorsrc.write(|w| unsafe { w.bits(source) });
        Some(source)
    }
}

impl Default for Uarte0 {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmit for Uarte0 {
    fn start_transmit(&self, byte: u8) {
        let regs = self.regs();

        // SAFETY: only the context that claimed the in-flight slot gets
        // here, and the previous transfer has ended.
        unsafe { addr_of_mut!(TX_BYTE).write_volatile(byte) };
        self.busy.store(true, Ordering::Relaxed);
        regs.events_endtx.reset();
        compiler_fence(Ordering::SeqCst);

        regs.txd
            .ptr
            .write(|w| unsafe { w.ptr().bits(addr_of!(TX_BYTE) as u32) });
        regs.txd.maxcnt.write(|w| unsafe { w.maxcnt().bits(1) });
        regs.tasks_starttx.write(|w| unsafe { w.bits(1) });
    }

    fn transmit_in_progress(&self) -> bool {
        self.busy.load(Ordering::Relaxed) && self.regs().events_endtx.read().bits() == 0
    }

    fn take_transmit_complete(&self) -> bool {
        let regs = self.regs();
        if regs.events_endtx.read().bits() == 0 {
            return false;
        }
        regs.events_endtx.reset();
        self.busy.swap(false, Ordering::Relaxed)
    }
}

impl Receive for Uarte0 {
    fn start_receive(&self) {
        let regs = self.regs();
        regs.events_endrx.reset();
        compiler_fence(Ordering::SeqCst);

        regs.rxd
            .ptr
            .write(|w| unsafe { w.ptr().bits(addr_of_mut!(RX_BYTE) as u32) });
        regs.rxd.maxcnt.write(|w| unsafe { w.maxcnt().bits(1) });
        regs.tasks_startrx.write(|w| unsafe { w.bits(1) });
    }

    fn stop_receive(&self) {
        self.rx_armed.store(false, Ordering::Relaxed);
        self.regs().tasks_stoprx.write(|w| unsafe { w.bits(1) });
    }

    fn poll_receive(&self) -> Option<u8> {
        if let Some(byte) = self.take_received() {
            return Some(byte);
        }
        if !self.rx_armed.swap(true, Ordering::Relaxed) {
            self.start_receive();
        }
        None
    }
}

pub fn baudrate(rate: BaudRate) -> Baudrate {
    match rate {
        BaudRate::Baud1200 => Baudrate::BAUD1200,
        BaudRate::Baud2400 => Baudrate::BAUD2400,
        BaudRate::Baud4800 => Baudrate::BAUD4800,
        BaudRate::Baud9600 => Baudrate::BAUD9600,
        BaudRate::Baud14400 => Baudrate::BAUD14400,
        BaudRate::Baud19200 => Baudrate::BAUD19200,
        BaudRate::Baud28800 => Baudrate::BAUD28800,
        BaudRate::Baud31250 => Baudrate::BAUD31250,
        BaudRate::Baud38400 => Baudrate::BAUD38400,
        BaudRate::Baud56000 => Baudrate::BAUD56000,
        BaudRate::Baud57600 => Baudrate::BAUD57600,
        BaudRate::Baud76800 => Baudrate::BAUD76800,
        BaudRate::Baud115200 => Baudrate::BAUD115200,
        BaudRate::Baud230400 => Baudrate::BAUD230400,
        BaudRate::Baud250000 => Baudrate::BAUD250000,
        BaudRate::Baud460800 => Baudrate::BAUD460800,
        BaudRate::Baud921600 => Baudrate::BAUD921600,
        BaudRate::Baud1M => Baudrate::BAUD1M,
    }
}

/// Configures UARTE0 and hands it to `serial`.
///
/// The UARTE0 interrupt must still be masked; unmask it afterwards.
pub fn init<const N: usize>(
    serial: &Serial<Uarte0, N>,
    uarte: UARTE0,
    pins: Pins,
    config: &SerialConfig,
) {
    let rate = config.baud_rate();
    let hal = Uarte::new(uarte, pins, Parity::EXCLUDED, baudrate(rate));

    serial.init();
    serial.uart().attach(hal);
    if config.rx_interrupt {
        serial.enable_receive();
    }
    defmt::info!("uarte0 up at {=u32} baud", rate.bps());
}

/// Body of the UARTE0 interrupt handler.
pub fn on_interrupt<const N: usize>(serial: &Serial<Uarte0, N>) {
    let uart = serial.uart();

    if uart.take_transmit_complete() {
        serial.on_transmit_complete();
    }
    if let Some(byte) = uart.take_received() {
        serial.on_receive(byte);
    }
    if let Some(source) = uart.take_error() {
        serial.on_error(source);
    }
}
