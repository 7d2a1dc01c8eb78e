//! The peripheral side of the driver.
//!
//! Methods take `&self` because the same peripheral is driven from thread
//! context and from its own interrupt; implementors poke registers.

/// One-byte-at-a-time transmitter with a completion event.
pub trait Transmit {
    /// Puts `byte` on the wire. Only called when nothing is in flight.
    fn start_transmit(&self, byte: u8);

    /// Whether the hardware is still shifting out the last started byte.
    fn transmit_in_progress(&self) -> bool;

    /// Checks for the transmit-complete event and clears it.
    fn take_transmit_complete(&self) -> bool;
}

/// One-byte receiver. In interrupt mode the received byte arrives through
/// [`Serial::on_receive`](crate::Serial::on_receive).
pub trait Receive {
    /// Arms reception of a single byte.
    fn start_receive(&self);

    fn stop_receive(&self);

    /// Receives without the interrupt: hands back a byte once one has
    /// arrived, otherwise makes sure a receive is armed and returns `None`.
    fn poll_receive(&self) -> Option<u8>;
}
