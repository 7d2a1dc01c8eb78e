#![no_std]

use defmt_rtt as _; // global logger
use elog_serial::fault::{self, FaultFrame, Firmware};
use elog_serial::{LogPort, OutputLock, Serial, TX_BUFFER_SIZE};
use nrf52840_hal as _; // memory layout

pub mod mono;
pub mod uarte;

use crate::uarte::Uarte0;

pub const HARDWARE_VERSION: &str = "V1.0.0";
pub const SOFTWARE_VERSION: &str = "V0.1.0";

/// The log serial line, UARTE0.
pub static SERIAL: Serial<Uarte0, TX_BUFFER_SIZE> = Serial::new(Uarte0::new());

pub const fn firmware(name: &'static str) -> Firmware {
    Firmware {
        name,
        hardware: HARDWARE_VERSION,
        software: SOFTWARE_VERSION,
    }
}

/// Reports a hard fault on `port` and parks the core. Once a debugger
/// releases it the core stops at a breakpoint.
///
/// The port's lock is switched off and output polls the UARTE, since the
/// serial interrupt can't preempt a fault handler.
pub fn fault_stop<L: OutputLock>(
    port: &LogPort<'_, Uarte0, L, TX_BUFFER_SIZE>,
    firmware: &Firmware,
    frame: &cortex_m_rt::ExceptionFrame,
) -> ! {
    cortex_m::interrupt::disable();
    port.set_lock_enabled(false);
    port.set_polled(true);

    let frame = FaultFrame {
        r0: frame.r0(),
        r1: frame.r1(),
        r2: frame.r2(),
        r3: frame.r3(),
        r12: frame.r12(),
        lr: frame.lr(),
        pc: frame.pc(),
        xpsr: frame.xpsr(),
    };
    defmt::error!("hard fault at pc {=u32:#010x}", frame.pc);
    let _ = fault::report_fault(&mut port.lock(), firmware, &frame);

    fault::halt();
    exit()
}

#[cfg(feature = "fault-hooks")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    cortex_m::interrupt::disable();

    // a fresh port: whoever panicked may be inside the regular one
    let port = LogPort::new(&SERIAL, elog_serial::NoLock);
    port.set_polled(true);

    let (file, line) = info
        .location()
        .map(|l| (l.file(), l.line()))
        .unwrap_or(("<unknown>", 0));
    defmt::error!("panicked at {=str}:{=u32}", file, line);
    let _ = fault::report_assert(&mut port.lock(), info.message(), file, line);

    fault::halt();
    exit()
}

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn defmt_panic() -> ! {
    cortex_m::asm::udf()
}

/// Terminates the application and makes `probe-run` exit with exit-code = 0
pub fn exit() -> ! {
    loop {
        cortex_m::asm::bkpt();
    }
}
