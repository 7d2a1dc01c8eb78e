use core::cell::{Cell, RefCell};

use crate::hal::{Receive, Transmit};

/// Records what the driver asks of the peripheral.
#[derive(Default)]
pub struct MockUart {
    sent: RefCell<Vec<u8>>,
    busy: Cell<bool>,
    done_event: Cell<bool>,
    rx_arms: Cell<u32>,
    rx_running: Cell<bool>,
    auto_finish: Cell<bool>,
    rx_line: Cell<Option<u8>>,
    rx_polls: Cell<u32>,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<u8> {
        self.sent.borrow().clone()
    }

    /// Finishes the byte on the wire and raises the completion event.
    /// Returns `false` when nothing was being sent.
    pub fn finish(&self) -> bool {
        if self.busy.replace(false) {
            self.done_event.set(true);
            true
        } else {
            false
        }
    }

    /// Every completion poll finds the byte on the wire already done.
    pub fn set_auto_finish(&self, auto: bool) {
        self.auto_finish.set(auto);
    }

    pub fn rx_arms(&self) -> u32 {
        self.rx_arms.get()
    }

    pub fn rx_running(&self) -> bool {
        self.rx_running.get()
    }

    /// A byte shows up on the line for the next polled read.
    pub fn feed(&self, byte: u8) {
        self.rx_line.set(Some(byte));
    }

    pub fn rx_polls(&self) -> u32 {
        self.rx_polls.get()
    }
}

impl Transmit for MockUart {
    fn start_transmit(&self, byte: u8) {
        assert!(!self.busy.get(), "transmit started while another is in flight");
        self.busy.set(true);
        self.done_event.set(false);
        self.sent.borrow_mut().push(byte);
    }

    fn transmit_in_progress(&self) -> bool {
        self.busy.get()
    }

    fn take_transmit_complete(&self) -> bool {
        if self.auto_finish.get() {
            self.finish();
        }
        self.done_event.replace(false)
    }
}

impl Receive for MockUart {
    fn start_receive(&self) {
        self.rx_arms.set(self.rx_arms.get() + 1);
        self.rx_running.set(true);
    }

    fn stop_receive(&self) {
        self.rx_running.set(false);
    }

    fn poll_receive(&self) -> Option<u8> {
        self.rx_polls.set(self.rx_polls.get() + 1);
        self.rx_line.take()
    }
}
