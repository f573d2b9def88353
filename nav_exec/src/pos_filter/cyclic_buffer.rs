//! Fixed size ring of accepted position fixes

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::BUFFER_LEN;
use crate::geo::GeoPosition;
use util::maths::mean;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Holds the last `BUFFER_LEN` accepted fixes.
///
/// The write counter only grows (until cleared), the slot written is `write_count % BUFFER_LEN`,
/// so once full the oldest fix is always the next to be overwritten.
#[derive(Debug, Clone, Default)]
pub struct CyclicBuffer {
    slots: [Option<GeoPosition>; BUFFER_LEN],
    write_count: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CyclicBuffer {
    /// Write a fix into the next slot.
    pub fn push(&mut self, position: GeoPosition) {
        self.slots[self.write_count % BUFFER_LEN] = Some(position);
        self.write_count += 1;
    }

    /// The most recently written fix.
    pub fn latest(&self) -> Option<&GeoPosition> {
        match self.write_count {
            0 => None,
            n => self.slots[(n - 1) % BUFFER_LEN].as_ref(),
        }
    }

    /// Number of fixes written since the buffer was last cleared.
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    pub fn is_full(&self) -> bool {
        self.write_count >= BUFFER_LEN
    }

    /// Empty every slot and reset the write counter.
    pub fn clear(&mut self) {
        self.slots = [None; BUFFER_LEN];
        self.write_count = 0;
    }

    /// Mean latitude and longitude of all slots, or `None` if the buffer is not yet full.
    ///
    /// The result is a fresh position with zero altitude and speed.
    pub fn average(&self) -> Option<GeoPosition> {
        if !self.is_full() {
            return None;
        }

        let lats: Vec<f64> = self.slots.iter().flatten().map(|p| p.lat_deg).collect();
        let lons: Vec<f64> = self.slots.iter().flatten().map(|p| p.lon_deg).collect();

        Some(GeoPosition::new(mean(&lats)?, mean(&lons)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ring_order() {
        let mut buf = CyclicBuffer::default();
        assert_eq!(buf.latest(), None);
        assert_eq!(buf.average(), None);

        for i in 0..4 {
            buf.push(GeoPosition::new(i as f64, 0.0));
            assert_eq!(buf.latest(), Some(&GeoPosition::new(i as f64, 0.0)));
        }

        assert!(buf.is_full());
        assert_eq!(buf.write_count(), 4);

        // Slot 0 was overwritten by the fourth fix, so the average is over 1, 2, 3
        assert_eq!(buf.average(), Some(GeoPosition::new(2.0, 0.0)));

        buf.clear();
        assert_eq!(buf.write_count(), 0);
        assert_eq!(buf.latest(), None);
        assert!(!buf.is_full());
    }
}
