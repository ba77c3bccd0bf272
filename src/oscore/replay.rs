use super::util::MAX_SEQUENCE_NUMBER;

/// The largest window the bitmap can track.
pub const MAX_WINDOW_SIZE: u32 = 64;

/// Sliding replay window over received sender sequence numbers.
///
/// Bit `n` of the bitmap stands for `highest - n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayWindow {
    size: u32,
    highest: Option<u64>,
    bitmap: u64,
}

impl ReplayWindow {
    /// Creates an empty window, with `size` clamped to `1..=64`.
    pub fn new(size: u32) -> ReplayWindow {
        ReplayWindow {
            size: size.clamp(1, MAX_WINDOW_SIZE),
            highest: None,
            bitmap: 0,
        }
    }

    /// Returns the window size.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the highest sequence number accepted so far.
    pub fn highest(&self) -> Option<u64> {
        self.highest
    }

    /// Returns `true` and records `seq` if it hasn't been received before
    /// and isn't too old, `false` otherwise.
    pub fn check_and_update(&mut self, seq: u64) -> bool {
        if seq > MAX_SEQUENCE_NUMBER {
            return false;
        }
        let highest = match self.highest {
            None => {
                self.highest = Some(seq);
                self.bitmap = 1;
                return true;
            }
            Some(highest) => highest,
        };

        if seq > highest {
            // Slide the window forward
            let shift = seq - highest;
            self.bitmap = if shift >= u64::from(MAX_WINDOW_SIZE) {
                0
            } else {
                self.bitmap << shift
            };
            self.bitmap |= 1;
            self.highest = Some(seq);
            return true;
        }

        let offset = highest - seq;
        if offset >= u64::from(self.size) {
            // Left of the window
            return false;
        }
        let mask = 1 << offset;
        if self.bitmap & mask != 0 {
            return false;
        }
        self.bitmap |= mask;
        true
    }
}
