//! Transmit ring buffer.
//!
//! The byte on the wire keeps its slot until the hardware reports it done, so
//! a ring of `N` bytes holds at most `N` unacknowledged bytes, the in-flight
//! one included.

/// The ring had no free slot; the byte was not stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Full;

pub struct TxRing<const N: usize> {
    buf: [u8; N],
    // oldest unacknowledged byte; the in-flight one while `in_flight` is set
    head: usize,
    len: usize,
    in_flight: bool,
    dropped: u32,
}

impl<const N: usize> TxRing<N> {
    /// A ring without slots is rejected at compile time:
    ///
    /// ```compile_fail
    /// let _ = elog_serial::ring::TxRing::<0>::new();
    /// ```
    pub const fn new() -> Self {
        const { assert!(N > 0, "a transmit ring needs at least one slot") };
        Self {
            buf: [0; N],
            head: 0,
            len: 0,
            in_flight: false,
            dropped: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Bytes rejected since the last reset.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub(crate) fn note_dropped(&mut self, count: u32) {
        self.dropped = self.dropped.saturating_add(count);
    }

    /// Stores `byte` at the back of the ring.
    ///
    /// Returns the byte the caller must start transmitting when the line was
    /// idle. That byte is marked in flight here, so exactly one context
    /// starts it.
    pub fn push(&mut self, byte: u8) -> Result<Option<u8>, Full> {
        if self.is_full() {
            self.note_dropped(1);
            return Err(Full);
        }

        self.buf[(self.head + self.len) % N] = byte;
        self.len += 1;

        if self.in_flight {
            Ok(None)
        } else {
            self.in_flight = true;
            Ok(Some(self.buf[self.head]))
        }
    }

    /// Releases the slot of the byte that just finished and returns the next
    /// one to put on the wire, if any.
    ///
    /// Does nothing when no byte is in flight.
    pub fn complete(&mut self) -> Option<u8> {
        if !self.in_flight {
            return None;
        }

        self.head = (self.head + 1) % N;
        self.len -= 1;

        if self.len == 0 {
            self.in_flight = false;
            None
        } else {
            Some(self.buf[self.head])
        }
    }
}

impl<const N: usize> Default for TxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_byte_starts_immediately() {
        let mut ring = TxRing::<4>::new();

        assert_eq!(ring.push(b'A'), Ok(Some(b'A')));
        assert_eq!(ring.push(b'B'), Ok(None));
        assert_eq!(ring.push(b'C'), Ok(None));
        assert!(ring.in_flight());
        assert_eq!(ring.len(), 3);

        assert_eq!(ring.complete(), Some(b'B'));
        assert_eq!(ring.complete(), Some(b'C'));
        assert_eq!(ring.complete(), None);
        assert!(!ring.in_flight());
        assert!(ring.is_empty());
    }

    #[test]
    fn in_flight_byte_holds_its_slot() {
        let mut ring = TxRing::<2>::new();

        assert_eq!(ring.push(b'A'), Ok(Some(b'A')));
        assert_eq!(ring.push(b'B'), Ok(None));
        assert_eq!(ring.push(b'C'), Err(Full));
        assert_eq!(ring.dropped(), 1);

        // the slot of 'A' frees up once the hardware is done with it
        assert_eq!(ring.complete(), Some(b'B'));
        assert_eq!(ring.push(b'C'), Ok(None));
        assert_eq!(ring.complete(), Some(b'C'));
        assert_eq!(ring.complete(), None);
    }

    #[test]
    fn complete_while_idle_is_a_no_op() {
        let mut ring = TxRing::<4>::new();

        for _ in 0..3 {
            assert_eq!(ring.complete(), None);
        }
        assert!(!ring.in_flight());
        assert!(ring.is_empty());

        // and the ring still works afterwards
        assert_eq!(ring.push(b'x'), Ok(Some(b'x')));
    }

    #[test]
    fn wraps_around_the_end_of_storage() {
        let mut ring = TxRing::<3>::new();
        let mut sent = Vec::new();

        for chunk in b"abcdefghij".chunks(2) {
            for &b in chunk {
                if let Some(start) = ring.push(b).unwrap() {
                    sent.push(start);
                }
            }
            while let Some(next) = ring.complete() {
                sent.push(next);
            }
        }

        assert_eq!(sent, b"abcdefghij");
        assert_eq!(ring.dropped(), 0);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut ring = TxRing::<2>::new();
        ring.push(1).unwrap();
        ring.push(2).unwrap();
        let _ = ring.push(3);

        ring.reset();

        assert!(ring.is_empty());
        assert!(!ring.in_flight());
        assert_eq!(ring.dropped(), 0);
        assert_eq!(ring.capacity(), 2);
    }
}
