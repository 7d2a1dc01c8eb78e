//! On-target checks of the UARTE0 glue. The UARTE0 interrupt stays masked,
//! so every test drives completions by polling.
#![no_std]
#![no_main]

use nrf52_elog as _; // global logger + memory layout
use panic_probe as _;

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};
    use elog_serial::hal::Transmit;
    use elog_serial::{SerialConfig, TX_BUFFER_SIZE};
    use nrf52840_hal::{
        gpio::{p0::Parts, Level},
        pac,
        uarte::Pins as UartePins,
    };
    use nrf52_elog::{uarte, SERIAL};

    fn drain() {
        let mut spins = 0u32;
        while !SERIAL.is_idle() {
            SERIAL.poll_transmit_complete();
            spins += 1;
            assert!(spins < 10_000_000, "UARTE0 never finished");
        }
    }

    #[init]
    fn init() {
        let device = pac::Peripherals::take().unwrap();
        let p0 = Parts::new(device.P0);
        let pins = UartePins {
            rxd: p0.p0_19.into_floating_input().degrade(),
            txd: p0.p0_20.into_push_pull_output(Level::High).degrade(),
            cts: None,
            rts: None,
        };
        uarte::init(&SERIAL, device.UARTE0, pins, &SerialConfig::default());
    }

    #[test]
    fn starts_idle() {
        assert!(SERIAL.is_idle());
        assert_eq!(SERIAL.pending(), 0);
    }

    #[test]
    fn single_byte_round_trip_through_the_hardware() {
        let uart = SERIAL.uart();
        uart.start_transmit(b'#');
        assert!(uart.transmit_in_progress());

        while !uart.take_transmit_complete() {}
        assert!(!uart.transmit_in_progress());
    }

    #[test]
    fn line_goes_out_whole() {
        let dropped = SERIAL.dropped();
        assert_eq!(SERIAL.write(b"testsuite: hello\r\n"), 18);
        drain();
        assert_eq!(SERIAL.dropped(), dropped);
    }

    #[test]
    fn ring_overflow_is_counted() {
        let dropped = SERIAL.dropped();
        let accepted = SERIAL.write(&[b'.'; TX_BUFFER_SIZE + 16]);

        assert_eq!(accepted, TX_BUFFER_SIZE);
        assert_eq!(SERIAL.dropped() - dropped, 16);
        drain();
    }
}
