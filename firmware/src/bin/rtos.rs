//! Scheduled build: the system monitor task walks the LEDs, the init task
//! starts logging, and idle echoes whatever arrives on the console.
//! The log port is an RTIC resource, its lock is the resource lock.
#![no_main]
#![no_std]

use cortex_m_rt::{exception, ExceptionFrame};
use elog_serial::fault::Firmware;
use elog_serial::{LogPort, NoLock};
use nrf52_elog::SERIAL;

const FIRMWARE: Firmware = nrf52_elog::firmware("rtos");

#[rtic::app(device = nrf52840_hal::pac, dispatchers = [SWI0_EGU0, SWI1_EGU1])]
mod app {
    use elog_serial::{Level, LogPort, NoLock, SerialConfig, Ticks, TX_BUFFER_SIZE};
    use heapless::Vec;
    use nrf52840_hal::{
        gpio::{p0::Parts, Level, Output, Pin, PushPull},
        pac::TIMER2,
        prelude::{OutputPin, StatefulOutputPin},
        uarte::Pins as UartePins,
    };
    use nrf52_elog::mono::{ExtU32, MonoTimer};
    use nrf52_elog::uarte::{self, Uarte0};
    use nrf52_elog::SERIAL;

    use super::FIRMWARE;

    #[monotonic(binds = TIMER2, default = true)]
    type RticMono = MonoTimer<TIMER2>;

    type Log = LogPort<'static, Uarte0, NoLock, TX_BUFFER_SIZE>;

    /// Milliseconds since boot and the task that logs.
    fn info(task: &'static str) -> Ticks<'static> {
        Ticks {
            ticks: monotonics::now().duration_since_epoch().to_millis(),
            thread: task,
        }
    }

    #[shared]
    struct Shared {
        log: Log,
    }

    #[local]
    struct Local {
        leds: Vec<Pin<Output<PushPull>>, 4>,
        next_led: usize,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        defmt::info!("init");
        let device = cx.device;
        let timer = device.TIMER2;
        let mono = RticMono::new(timer);
        let p0 = Parts::new(device.P0);

        let txd = p0.p0_20.into_push_pull_output(Level::High).degrade();
        let rxd = p0.p0_19.into_floating_input().degrade();
        let pins = UartePins {
            rxd,
            txd,
            cts: None,
            rts: None,
        };
        // RTIC unmasks UARTE0 once init returns
        uarte::init(&SERIAL, device.UARTE0, pins, &SerialConfig::default());

        let mut leds = Vec::new();
        for led in [
            p0.p0_13.into_push_pull_output(Level::High).degrade(),
            p0.p0_14.into_push_pull_output(Level::High).degrade(),
            p0.p0_15.into_push_pull_output(Level::High).degrade(),
            p0.p0_16.into_push_pull_output(Level::High).degrade(),
        ] {
            let _ = leds.push(led);
        }

        // silent until sys_init starts it
        let log = LogPort::new(&SERIAL, NoLock);
        log.set_output_enabled(false);

        sys_init::spawn().ok();
        sys_monitor::spawn().ok();

        (
            Shared { log },
            Local { leds, next_led: 0 },
            init::Monotonics(mono),
        )
    }

    #[idle(shared = [log])]
    fn idle(mut cx: idle::Context) -> ! {
        loop {
            if let Some(byte) = SERIAL.get_byte() {
                cx.shared.log.lock(|log| log.output(&[byte]));
            }
        }
    }

    /// Brings logging up once the scheduler runs.
    #[task(shared = [log], priority = 2)]
    fn sys_init(mut cx: sys_init::Context) {
        cx.shared.log.lock(|log| {
            log.set_output_enabled(true);
            let info = info("sys_init");
            let _ = log
                .lock()
                .record(Level::Info, "APP", &info, format_args!("Starting..."));
            let _ = log.lock().record(
                Level::Info,
                "APP",
                &info,
                format_args!(
                    "{} hardware {} software {}",
                    FIRMWARE.name, FIRMWARE.hardware, FIRMWARE.software
                ),
            );
        });
        defmt::info!("logging started");
    }

    /// Inverts one LED every 500 ms, round robin.
    #[task(local = [leds, next_led], shared = [log])]
    fn sys_monitor(mut cx: sys_monitor::Context) {
        let i = *cx.local.next_led;
        if let Some(led) = cx.local.leds.get_mut(i) {
            if led.is_set_high().unwrap() {
                let _ = led.set_low();
            } else {
                let _ = led.set_high();
            }
        }
        *cx.local.next_led = (i + 1) % cx.local.leds.len().max(1);

        cx.shared.log.lock(|log| {
            let _ = log.lock().record(
                Level::Debug,
                "APP",
                &info("sys_monitor"),
                format_args!("led{} inverted", i),
            );
        });

        sys_monitor::spawn_after(500.millis()).ok();
    }

    #[task(binds = UARTE0_UART0, priority = 3)]
    fn on_uarte(_: on_uarte::Context) {
        uarte::on_interrupt(&SERIAL);
    }
}

#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    // the shared port may be locked by the task that faulted
    let port = LogPort::new(&SERIAL, NoLock);
    nrf52_elog::fault_stop(&port, &FIRMWARE, frame)
}
