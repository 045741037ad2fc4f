//! Fill segments and the fill watermark.
//!
//! An order's total is split into `N` segments. Shares are cumulative:
//! the first `k` segments are worth `floor(total * k / N)`, so a range is
//! the difference of two cumulative values and the last segment absorbs
//! whatever rounding left over. Summed over any partition into ranges the
//! shares equal `total` exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, SwapError};

/// Index of a fill segment, in `[0, N)`.
pub type SegmentIndex = u32;

/// Value of the first `count` of `segment_count` segments of `total`.
///
/// # Panics
/// Panics if `segment_count` is zero.
#[must_use]
pub fn cumulative_share(total: u64, segment_count: u32, count: u32) -> u64 {
    assert!(segment_count > 0, "segment_count must be > 0");
    let count = count.min(segment_count);
    let share = u128::from(total) * u128::from(count) / u128::from(segment_count);
    // share <= total because count <= segment_count.
    u64::try_from(share).unwrap_or(total)
}

/// Value of the segments in `range`.
#[must_use]
pub fn range_share(total: u64, segment_count: u32, range: SegmentRange) -> u64 {
    cumulative_share(total, segment_count, range.last + 1)
        - cumulative_share(total, segment_count, range.first)
}

/// An inclusive, non-empty run of segments claimed by one fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRange {
    pub first: SegmentIndex,
    pub last: SegmentIndex,
}

impl SegmentRange {
    /// Number of segments in the range.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.last - self.first + 1
    }

    /// Always false; a range holds at least one segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for SegmentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..={}]", self.first, self.last)
    }
}

/// Highest filled segment, or none yet.
///
/// Only ever moves forward. A fill "up through `k`" must name a `k`
/// strictly above the watermark and claims everything in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FillWatermark(Option<SegmentIndex>);

impl FillWatermark {
    #[must_use]
    pub fn new() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn get(&self) -> Option<SegmentIndex> {
        self.0
    }

    /// Whether any segment has been filled.
    #[must_use]
    pub fn has_fills(&self) -> bool {
        self.0.is_some()
    }

    /// Whether every one of `segment_count` segments has been filled.
    #[must_use]
    pub fn is_complete(&self, segment_count: u32) -> bool {
        self.0.is_some_and(|w| w + 1 >= segment_count)
    }

    /// Segments not yet filled.
    #[must_use]
    pub fn remaining(&self, segment_count: u32) -> u32 {
        match self.0 {
            None => segment_count,
            Some(w) => segment_count.saturating_sub(w + 1),
        }
    }

    /// The range a fill up through `upto` would claim. Does not mutate.
    ///
    /// # Errors
    /// - `InvalidSegment` if `upto >= segment_count`
    /// - `SegmentAlreadyFilled` if `upto <=` the watermark
    pub fn claim(&self, upto: SegmentIndex, segment_count: u32) -> Result<SegmentRange> {
        if upto >= segment_count {
            return Err(SwapError::InvalidSegment {
                requested: upto,
                segment_count,
            });
        }
        match self.0 {
            Some(w) if upto <= w => Err(SwapError::SegmentAlreadyFilled {
                requested: upto,
                watermark: Some(w),
            }),
            Some(w) => Ok(SegmentRange {
                first: w + 1,
                last: upto,
            }),
            None => Ok(SegmentRange {
                first: 0,
                last: upto,
            }),
        }
    }

    /// Advance to the end of a range produced by [`claim`](Self::claim).
    ///
    /// # Errors
    /// Returns `SegmentAlreadyFilled` if the range does not start right
    /// after the current watermark (it was claimed against stale state).
    pub fn advance(&mut self, range: SegmentRange) -> Result<()> {
        let expected_first = self.0.map_or(0, |w| w + 1);
        if range.first != expected_first || range.last < range.first {
            return Err(SwapError::SegmentAlreadyFilled {
                requested: range.last,
                watermark: self.0,
            });
        }
        self.0 = Some(range.last);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_sum_to_total() {
        for total in [0u64, 1, 7, 10, 999, 1_000_000_007, u64::MAX] {
            for n in [1u32, 2, 3, 7, 10, 13] {
                let sum: u64 = (0..n)
                    .map(|i| range_share(total, n, SegmentRange { first: i, last: i }))
                    .sum();
                assert_eq!(sum, total, "total={total} n={n}");
            }
        }
    }

    #[test]
    fn uneven_partition_sums_to_total() {
        let total = 1_000_003;
        let n = 10;
        let ranges = [
            SegmentRange { first: 0, last: 2 },
            SegmentRange { first: 3, last: 3 },
            SegmentRange { first: 4, last: 8 },
            SegmentRange { first: 9, last: 9 },
        ];
        let sum: u64 = ranges.iter().map(|r| range_share(total, n, *r)).sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn three_of_ten() {
        let r = SegmentRange { first: 0, last: 2 };
        assert_eq!(range_share(1_000_000_000, 10, r), 300_000_000);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn last_segment_absorbs_remainder() {
        // 10 / 3 = 3, 3, 4
        assert_eq!(range_share(10, 3, SegmentRange { first: 0, last: 0 }), 3);
        assert_eq!(range_share(10, 3, SegmentRange { first: 1, last: 1 }), 3);
        assert_eq!(range_share(10, 3, SegmentRange { first: 2, last: 2 }), 4);
    }

    #[test]
    fn claim_from_empty() {
        let wm = FillWatermark::new();
        let r = wm.claim(2, 10).unwrap();
        assert_eq!(r, SegmentRange { first: 0, last: 2 });
    }

    #[test]
    fn claim_rejects_refill_and_out_of_range() {
        let mut wm = FillWatermark::new();
        let r = wm.claim(2, 10).unwrap();
        wm.advance(r).unwrap();
        assert_eq!(wm.get(), Some(2));

        for k in 0..=2 {
            assert!(matches!(
                wm.claim(k, 10),
                Err(SwapError::SegmentAlreadyFilled {
                    watermark: Some(2),
                    ..
                })
            ));
        }
        assert!(matches!(
            wm.claim(10, 10),
            Err(SwapError::InvalidSegment { requested: 10, .. })
        ));
        // Skipping ahead is allowed.
        assert_eq!(wm.claim(7, 10).unwrap(), SegmentRange { first: 3, last: 7 });
    }

    #[test]
    fn stale_claim_cannot_advance() {
        let mut wm = FillWatermark::new();
        let a = wm.claim(3, 10).unwrap();
        let b = wm.claim(5, 10).unwrap();
        wm.advance(a).unwrap();
        assert!(wm.advance(b).is_err());
        assert_eq!(wm.get(), Some(3));
    }

    #[test]
    fn empty_watermark_reported_as_none() {
        let mut wm = FillWatermark::new();
        let err = wm.advance(SegmentRange { first: 2, last: 4 }).unwrap_err();
        assert_eq!(
            err,
            SwapError::SegmentAlreadyFilled {
                requested: 4,
                watermark: None,
            }
        );
        assert!(err.to_string().contains("watermark none"));
        assert!(!wm.has_fills());
    }

    #[test]
    fn completion_and_remaining() {
        let mut wm = FillWatermark::new();
        assert!(!wm.has_fills());
        assert_eq!(wm.remaining(4), 4);
        wm.advance(wm.claim(2, 4).unwrap()).unwrap();
        assert!(!wm.is_complete(4));
        assert_eq!(wm.remaining(4), 1);
        wm.advance(wm.claim(3, 4).unwrap()).unwrap();
        assert!(wm.is_complete(4));
        assert_eq!(wm.remaining(4), 0);
    }

    #[test]
    fn watermark_is_monotonic() {
        let mut wm = FillWatermark::new();
        let mut last = None;
        for upto in [0, 1, 4, 5, 9] {
            wm.advance(wm.claim(upto, 10).unwrap()).unwrap();
            assert!(wm.get() > last);
            last = wm.get();
        }
    }
}
