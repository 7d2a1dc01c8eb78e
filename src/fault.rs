//! Fail-stop reporting for failed assertions and hardware faults.
//!
//! The reports are plain text for whatever `fmt::Write` the caller has, in
//! practice a [`LogPort`](crate::LogPort) guard with its lock turned off.

use core::fmt::{self, Display, Write};
use core::sync::atomic::{AtomicBool, Ordering};

/// Identifies the image in fault reports.
#[derive(Clone, Copy, Debug)]
pub struct Firmware {
    pub name: &'static str,
    pub hardware: &'static str,
    pub software: &'static str,
}

/// Registers the core stacks on exception entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaultFrame {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    pub pc: u32,
    pub xpsr: u32,
}

pub fn report_assert<W: Write>(
    w: &mut W,
    expr: impl Display,
    func: &str,
    line: u32,
) -> fmt::Result {
    write!(w, "({}) has assert failed at {}:{}.\r\n", expr, func, line)
}

pub fn report_fault<W: Write>(w: &mut W, firmware: &Firmware, frame: &FaultFrame) -> fmt::Result {
    write!(
        w,
        "Firmware name: {}, hardware version: {}, software version: {}\r\n",
        firmware.name, firmware.hardware, firmware.software
    )?;
    write!(w, "Hard fault, stacked registers:\r\n")?;
    write!(
        w,
        "  r0: {:08x}  r1: {:08x}  r2: {:08x}  r3: {:08x}\r\n",
        frame.r0, frame.r1, frame.r2, frame.r3
    )?;
    write!(
        w,
        "  r12: {:08x}  lr: {:08x}  pc: {:08x}  psr: {:08x}\r\n",
        frame.r12, frame.lr, frame.pc, frame.xpsr
    )
}

/// Set while [`halt`] holds the core. Clear it from a debugger to resume.
pub static HALT: AtomicBool = AtomicBool::new(false);

/// Spins for as long as `flag` stays set.
pub fn hold(flag: &AtomicBool) {
    while flag.load(Ordering::SeqCst) {
        core::hint::spin_loop();
    }
}

/// Parks the core for inspection with a debugger and returns once the
/// debugger writes `false` to [`HALT`].
pub fn halt() {
    HALT.store(true, Ordering::SeqCst);
    hold(&HALT);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_line() {
        let mut out = String::new();
        report_assert(&mut out, "ptr != NULL", "rt_object_init", 312).unwrap();
        assert_eq!(out, "(ptr != NULL) has assert failed at rt_object_init:312.\r\n");
    }

    #[test]
    fn fault_dump() {
        let firmware = Firmware {
            name: "rtos",
            hardware: "V1.0.0",
            software: "V0.1.0",
        };
        let frame = FaultFrame {
            lr: 0xffff_fff9,
            pc: 0x0000_1a2c,
            xpsr: 0x2100_0000,
            ..FaultFrame::default()
        };

        let mut out = String::new();
        report_fault(&mut out, &firmware, &frame).unwrap();

        let lines: Vec<&str> = out.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "Firmware name: rtos, hardware version: V1.0.0, software version: V0.1.0"
        );
        assert_eq!(
            lines[3],
            "  r12: 00000000  lr: fffffff9  pc: 00001a2c  psr: 21000000"
        );
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn cleared_flag_does_not_hold() {
        hold(&AtomicBool::new(false));
    }

    #[test]
    fn halt_is_released_by_clearing_the_flag() {
        let releaser = std::thread::spawn(|| {
            while !HALT.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }
            HALT.store(false, Ordering::SeqCst);
        });

        halt();
        releaser.join().unwrap();
        assert!(!HALT.load(Ordering::SeqCst));
    }
}
