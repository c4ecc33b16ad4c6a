//! Terminal operations of the int, long and double lanes.

use crate::stream::AutoClosingStream;
use fieldstream_core::{LaneNumber, Orderable, Result, SummaryStatistics};

impl<T: LaneNumber> AutoClosingStream<T> {
    /// Sum of the elements. Ints sum in the long domain.
    pub fn sum(self) -> Result<T::Sum> {
        self.fold_named("sum", T::Sum::default(), T::accumulate, T::merge)
    }

    /// Arithmetic mean, `None` for an empty stream.
    pub fn average(self) -> Result<Option<f64>> {
        Ok(self.summarize("average")?.average())
    }

    /// Smallest element. Doubles compare by total order.
    pub fn min(self) -> Result<Option<T>> {
        self.reduce_named("min", |a, b| if Orderable::compare(&b, &a).is_lt() { b } else { a })
    }

    /// Largest element. Doubles compare by total order.
    pub fn max(self) -> Result<Option<T>> {
        self.reduce_named("max", |a, b| if Orderable::compare(&b, &a).is_gt() { b } else { a })
    }

    /// Count, sum, min, max and average in one pass.
    pub fn statistics(self) -> Result<SummaryStatistics<T>> {
        self.summarize("statistics")
    }

    fn summarize(self, name: &'static str) -> Result<SummaryStatistics<T>> {
        self.fold_named(
            name,
            SummaryStatistics::new(),
            |mut stats, value| {
                stats.accept(value);
                stats
            },
            SummaryStatistics::combine,
        )
    }

    /// Widens into the double lane.
    pub fn as_double_stream(self) -> AutoClosingStream<f64> {
        self.map_to_double(T::as_f64)
    }
}

impl AutoClosingStream<i32> {
    /// Widens into the long lane.
    pub fn as_long_stream(self) -> AutoClosingStream<i64> {
        self.map_to_long(i64::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutoCloseConfig;
    use fieldstream_core::BoxError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn ints(values: Vec<i32>) -> (AutoClosingStream<i32>, Arc<AtomicUsize>) {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let stream = AutoClosingStream::over(
            values,
            move || -> std::result::Result<(), BoxError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            AutoCloseConfig::default(),
        );
        (stream, released)
    }

    #[test]
    fn test_int_sum_widens() {
        let (stream, released) = ints(vec![i32::MAX, i32::MAX]);
        assert_eq!(stream.sum().unwrap(), 2 * i64::from(i32::MAX));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_numeric_terminals() {
        let (stream, _) = ints(vec![]);
        assert_eq!(stream.average().unwrap(), None);
        let (stream, _) = ints(vec![]);
        assert_eq!(stream.min().unwrap(), None);
        let (stream, _) = ints(vec![]);
        assert_eq!(stream.sum().unwrap(), 0);
    }

    #[test]
    fn test_statistics_sequential_and_parallel() {
        let (stream, _) = ints((1..=100).collect());
        let seq = stream.statistics().unwrap();
        let (stream, released) = ints((1..=100).collect());
        let par = stream.parallel().unordered().statistics().unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq.count(), 100);
        assert_eq!(seq.sum(), 5050);
        assert_eq!(seq.min(), Some(1));
        assert_eq!(seq.max(), Some(100));
        assert_eq!(seq.average(), Some(50.5));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_min_max() {
        let (stream, _) = ints(vec![4, -2, 9]);
        assert_eq!(stream.min().unwrap(), Some(-2));
        let (stream, _) = ints(vec![4, -2, 9]);
        assert_eq!(stream.parallel().max().unwrap(), Some(9));
    }

    #[test]
    fn test_lane_widening() {
        let (stream, _) = ints(vec![1, 2]);
        assert_eq!(stream.as_long_stream().sum().unwrap(), 3i64);
        let (stream, _) = ints(vec![1, 2]);
        let doubles = stream.as_double_stream().to_vec().unwrap();
        assert_eq!(doubles, vec![1.0, 2.0]);
    }

    #[test]
    fn test_double_average() {
        let stream = AutoClosingStream::over(
            vec![1.5, 2.5, f64::NAN],
            || -> std::result::Result<(), BoxError> { Ok(()) },
            AutoCloseConfig::default(),
        );
        let out = stream.filter(|v| !v.is_nan()).average().unwrap();
        assert_eq!(out, Some(2.0));
    }
}
