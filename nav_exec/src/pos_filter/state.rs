//! Implementations for the PosFilter state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace};

use super::{CyclicBuffer, FilterOutcome, Params};
use crate::geo::GeoPosition;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Position filter state.
#[derive(Debug, Clone)]
pub struct PosFilter {
    params: Params,

    buffer: CyclicBuffer,

    /// Outliers which may still be rejected before one is accepted regardless.
    attempts_remaining: u8,

    /// Set when the previous fix was rejected as distant or duplicate.
    ignored_last_cycle: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for PosFilter {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl PosFilter {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            buffer: CyclicBuffer::default(),
            attempts_remaining: params.max_attempts,
            ignored_last_cycle: false,
        }
    }

    /// Pass a raw fix through the filter.
    ///
    /// `last_current` is the controller's current position estimate, `None` if no fix has been
    /// accepted yet.
    pub fn ingest(&mut self, raw: GeoPosition, last_current: Option<&GeoPosition>) -> FilterOutcome {
        trace!("Received fix {}", raw);

        if last_current.is_none() && raw.is_zero() {
            info!("Ignoring zero position before first fix");
            return FilterOutcome::RejectedZeroBeforeFix;
        }

        if let Some(current) = last_current {
            let jump_m = raw.distance_to(current);

            if jump_m > self.params.max_jump_m && self.attempts_remaining > 0 {
                self.attempts_remaining -= 1;
                self.ignored_last_cycle = true;
                info!(
                    "Ignoring distant position {} ({:.2} m away), {} attempts remaining",
                    raw, jump_m, self.attempts_remaining
                );
                return FilterOutcome::RejectedDistant;
            }
        }

        self.attempts_remaining = self.params.max_attempts;

        if let Some(last) = self.buffer.latest() {
            if last.precise_eq(&raw) {
                self.ignored_last_cycle = true;
                info!("Ignoring duplicate position {}", raw);
                return FilterOutcome::RejectedDuplicate;
            }
        }

        // Don't blend readings from before an outage with fresh ones
        if self.ignored_last_cycle {
            debug!("Clearing position buffer after ignored readings");
            self.buffer.clear();
            self.ignored_last_cycle = false;
        }

        self.buffer.push(raw);

        FilterOutcome::Accepted(self.buffer.average().unwrap_or(raw))
    }

    /// Rejections which may still happen before an outlier is accepted.
    pub fn attempts_remaining(&self) -> u8 {
        self.attempts_remaining
    }

    pub fn ignored_last_cycle(&self) -> bool {
        self.ignored_last_cycle
    }

    pub fn buffer(&self) -> &CyclicBuffer {
        &self.buffer
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn accepted(outcome: FilterOutcome) -> GeoPosition {
        match outcome {
            FilterOutcome::Accepted(p) => p,
            o => panic!("Expected the fix to be accepted, got {:?}", o),
        }
    }

    #[test]
    fn test_zero_before_fix() {
        let mut filter = PosFilter::default();

        assert_eq!(
            filter.ingest(GeoPosition::new(0.0, 0.0), None),
            FilterOutcome::RejectedZeroBeforeFix
        );
        assert_eq!(filter.buffer().write_count(), 0);
        assert!(!filter.ignored_last_cycle());

        // Once there is a current fix a zero reading is just a (very) distant one
        let current = GeoPosition::new(50.0, 20.0);
        assert_eq!(
            filter.ingest(GeoPosition::new(0.0, 0.0), Some(&current)),
            FilterOutcome::RejectedDistant
        );
    }

    #[test]
    fn test_average_after_full() {
        let mut filter = PosFilter::default();
        let p1 = GeoPosition::new(50.00000, 20.00000);
        let p2 = GeoPosition::new(50.00001, 20.00002);
        let p3 = GeoPosition::new(50.00002, 20.00001);
        let p4 = GeoPosition::new(50.00003, 20.00003);

        // Until full the raw fix passes through unchanged
        assert_eq!(accepted(filter.ingest(p1, None)), p1);
        assert_eq!(accepted(filter.ingest(p2, Some(&p1))), p2);

        let avg = accepted(filter.ingest(p3, Some(&p2)));
        assert_abs_diff_eq!(avg.lat_deg, 50.00001, epsilon = 1e-10);
        assert_abs_diff_eq!(avg.lon_deg, 20.00001, epsilon = 1e-10);
        assert_eq!(avg.alt_m, 0.0);
        assert_eq!(avg.speed_kmh, 0.0);

        let avg = accepted(filter.ingest(p4, Some(&avg)));
        assert_abs_diff_eq!(avg.lat_deg, 50.00002, epsilon = 1e-10);
        assert_abs_diff_eq!(avg.lon_deg, 20.00002, epsilon = 1e-10);
    }

    #[test]
    fn test_outlier_budget() {
        let mut filter = PosFilter::default();
        let current = GeoPosition::new(50.0, 20.0);
        filter.ingest(current, None);

        // About 11 m north
        let far = GeoPosition::new(50.0001, 20.0);

        for remaining in (0..3).rev() {
            assert_eq!(filter.ingest(far, Some(&current)), FilterOutcome::RejectedDistant);
            assert_eq!(filter.attempts_remaining(), remaining);
            assert!(filter.ignored_last_cycle());
        }

        // Fourth is accepted, the buffer restarts from the new fix and the budget resets
        assert_eq!(filter.ingest(far, Some(&current)), FilterOutcome::Accepted(far));
        assert_eq!(filter.attempts_remaining(), 3);
        assert_eq!(filter.buffer().write_count(), 1);
        assert!(!filter.ignored_last_cycle());
    }

    #[test]
    fn test_near_fix_resets_budget() {
        let mut filter = PosFilter::default();
        let current = GeoPosition::new(50.0, 20.0);
        filter.ingest(current, None);

        filter.ingest(GeoPosition::new(50.0001, 20.0), Some(&current));
        assert_eq!(filter.attempts_remaining(), 2);

        let near = GeoPosition::new(50.00001, 20.0);
        assert_eq!(filter.ingest(near, Some(&current)), FilterOutcome::Accepted(near));
        assert_eq!(filter.attempts_remaining(), 3);
    }

    #[test]
    fn test_duplicate() {
        let mut filter = PosFilter::default();
        let r = GeoPosition::new(50.0, 20.0);

        assert_eq!(filter.ingest(r, None), FilterOutcome::Accepted(r));
        assert_eq!(filter.ingest(r, Some(&r)), FilterOutcome::RejectedDuplicate);
        assert!(filter.ignored_last_cycle());

        // The next distinct fix is accepted into a cleared buffer
        let s = GeoPosition::new(50.00001, 20.0);
        assert_eq!(filter.ingest(s, Some(&r)), FilterOutcome::Accepted(s));
        assert_eq!(filter.buffer().write_count(), 1);
    }

    #[test]
    fn test_near_identical_is_duplicate() {
        let mut filter = PosFilter::default();
        let r = GeoPosition::new(50.0, 20.0);
        filter.ingest(r, None);

        // Differs on both axes by less than the per-axis tolerance
        let repeat = GeoPosition::new(50.000_000_001, 20.000_000_001);
        assert_eq!(filter.ingest(repeat, Some(&r)), FilterOutcome::RejectedDuplicate);

        // One axis outside the tolerance is a new reading
        let moved = GeoPosition::new(50.0, 20.000_000_1);
        assert_eq!(filter.ingest(moved, Some(&r)), FilterOutcome::Accepted(moved));
    }

    #[test]
    fn test_verdict() {
        use super::super::FilterVerdict;

        assert_eq!(
            FilterOutcome::Accepted(GeoPosition::default()).verdict(),
            FilterVerdict::Accepted
        );
        assert_eq!(FilterOutcome::RejectedDistant.verdict(), FilterVerdict::RejectedDistant);
    }
}
