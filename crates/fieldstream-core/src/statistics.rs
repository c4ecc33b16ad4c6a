//! Summary statistics over a numeric lane.

use crate::value::{LaneNumber, Orderable};

/// Count, sum, min, max and average of a numeric lane.
///
/// `min`/`max`/`average` are `None` for an empty input.
///
/// ```
/// use fieldstream_core::SummaryStatistics;
///
/// let mut stats = SummaryStatistics::<i32>::new();
/// stats.extend([4, 1, 7]);
/// assert_eq!(stats.count(), 3);
/// assert_eq!(stats.sum(), 12);
/// assert_eq!((stats.min(), stats.max()), (Some(1), Some(7)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistics<T: LaneNumber> {
    count: u64,
    sum: T::Sum,
    min: Option<T>,
    max: Option<T>,
}

impl<T: LaneNumber> SummaryStatistics<T> {
    /// Empty statistics.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: T::Sum::default(),
            min: None,
            max: None,
        }
    }

    /// Records one value.
    pub fn accept(&mut self, value: T) {
        self.count += 1;
        self.sum = T::accumulate(self.sum, value);
        self.min = Some(match self.min {
            Some(min) if min.compare(&value).is_le() => min,
            _ => value,
        });
        self.max = Some(match self.max {
            Some(max) if max.compare(&value).is_ge() => max,
            _ => value,
        });
    }

    /// Merges statistics gathered on another partition.
    pub fn combine(mut self, other: Self) -> Self {
        self.count += other.count;
        self.sum = T::merge(self.sum, other.sum);
        if let Some(min) = other.min {
            self.min = Some(match self.min {
                Some(own) if own.compare(&min).is_le() => own,
                _ => min,
            });
        }
        if let Some(max) = other.max {
            self.max = Some(match self.max {
                Some(own) if own.compare(&max).is_ge() => own,
                _ => max,
            });
        }
        self
    }

    /// Number of recorded values.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum in the lane's accumulator type.
    pub fn sum(&self) -> T::Sum {
        self.sum
    }

    /// Smallest value, or `None` when empty.
    pub fn min(&self) -> Option<T> {
        self.min
    }

    /// Largest value, or `None` when empty.
    pub fn max(&self) -> Option<T> {
        self.max
    }

    /// Arithmetic mean, or `None` when no value was recorded.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(T::sum_as_f64(self.sum) / self.count as f64)
        }
    }
}

impl<T: LaneNumber> Default for SummaryStatistics<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LaneNumber> Extend<T> for SummaryStatistics<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.accept(value);
        }
    }
}

impl<T: LaneNumber> FromIterator<T> for SummaryStatistics<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}
