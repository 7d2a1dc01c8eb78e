//! No-OS build: a busy loop inverting the LEDs in turn, logging every step
//! over UARTE0. The log lock masks interrupts.
#![no_main]
#![no_std]

use cortex_m_rt::{entry, exception, ExceptionFrame};
use elog_serial::fault::Firmware;
use elog_serial::{IrqLock, Level, LogPort, SerialConfig, Ticks, TX_BUFFER_SIZE};
use nrf52840_hal::{
    gpio::{p0::Parts, Level},
    pac::{self, interrupt},
    prelude::{OutputPin, StatefulOutputPin, _embedded_hal_blocking_delay_DelayMs},
    uarte::Pins as UartePins,
    Delay,
};
use nrf52_elog::uarte::{self, Uarte0};
use nrf52_elog::SERIAL;

const FIRMWARE: Firmware = nrf52_elog::firmware("blinky");

static LOG: LogPort<'static, Uarte0, IrqLock, TX_BUFFER_SIZE> = LogPort::new(&SERIAL, IrqLock);

#[entry]
fn main() -> ! {
    defmt::info!("init");
    let device = pac::Peripherals::take().unwrap();
    let core = pac::CorePeripherals::take().unwrap();
    let p0 = Parts::new(device.P0);

    let txd = p0.p0_20.into_push_pull_output(Level::High).degrade();
    let rxd = p0.p0_19.into_floating_input().degrade();
    let pins = UartePins {
        rxd,
        txd,
        cts: None,
        rts: None,
    };
    uarte::init(&SERIAL, device.UARTE0, pins, &SerialConfig::default());
    // SAFETY: SERIAL is initialised, its handler may run from here on
    unsafe { pac::NVIC::unmask(pac::Interrupt::UARTE0_UART0) };

    let mut leds = [
        p0.p0_13.into_push_pull_output(Level::High).degrade(),
        p0.p0_14.into_push_pull_output(Level::High).degrade(),
        p0.p0_15.into_push_pull_output(Level::High).degrade(),
        p0.p0_16.into_push_pull_output(Level::High).degrade(),
    ];
    let mut delay = Delay::new(core.SYST);

    // no clock to read, count the delay loop instead
    let mut ms: u32 = 0;
    let _ = LOG.lock().record(
        Level::Info,
        "APP",
        &Ticks { ticks: ms, thread: "main" },
        format_args!(
            "{} hardware {} software {}",
            FIRMWARE.name, FIRMWARE.hardware, FIRMWARE.software
        ),
    );

    loop {
        for (i, led) in leds.iter_mut().enumerate() {
            // the LEDs are active low
            // is_set_high() is wrapped in a Result, but this is just reading to a register.
            let was_off = led.is_set_high().unwrap();
            if was_off {
                let _ = led.set_low();
            } else {
                let _ = led.set_high();
            }

            let state = if was_off { "on" } else { "off" };
            let _ = LOG.lock().record(
                Level::Debug,
                "APP",
                &Ticks { ticks: ms, thread: "main" },
                format_args!("led{} {}", i, state),
            );
            delay.delay_ms(500u32);
            ms = ms.wrapping_add(500);
        }
    }
}

#[interrupt]
fn UARTE0_UART0() {
    uarte::on_interrupt(&SERIAL);
}

#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    nrf52_elog::fault_stop(&LOG, &FIRMWARE, frame)
}
