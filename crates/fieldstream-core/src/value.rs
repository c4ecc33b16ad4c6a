//! Capability traits for field value kinds.
//!
//! Instead of one field interface per primitive kind, a single generic
//! field is parameterized by its value kind and picks up behaviour from
//! the traits below:
//!
//! - [`Orderable`]: a total order, used by every comparison predicate,
//!   by `in`/`not_in` operand sets and by comparators
//! - [`Numeric`]: kinds that widen losslessly into one of the numeric lanes
//! - [`LaneNumber`]: the lane types themselves (`i32`, `i64`, `f64`), which
//!   carry sum/average/statistics behaviour

use crate::lane::Lane;
use std::cmp::Ordering;
use std::fmt::Debug;

/// A value kind with a total order.
pub trait Orderable: Clone + Debug + Send + Sync + 'static {
    /// Total comparison. Floating kinds use IEEE `total_cmp`.
    fn compare(&self, other: &Self) -> Ordering;

    /// Equality under [`Orderable::compare`].
    fn same_as(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

macro_rules! orderable_by_ord {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Orderable for $ty {
                fn compare(&self, other: &Self) -> Ordering {
                    Ord::cmp(self, other)
                }
            }
        )*
    };
}

orderable_by_ord!(
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    bool,
    char,
    String,
    &'static str,
);

impl Orderable for f32 {
    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl Orderable for f64 {
    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

/// A value kind that widens losslessly into a numeric lane.
pub trait Numeric: Orderable + Copy {
    /// The numeric lane this kind travels in once mapped.
    type Lane: LaneNumber;

    /// Widens the value into its lane type.
    fn widen(self) -> Self::Lane;
}

macro_rules! numeric_into {
    ($lane:ty => $($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                type Lane = $lane;

                fn widen(self) -> $lane {
                    <$lane>::from(self)
                }
            }
        )*
    };
}

numeric_into!(i32 => i8, i16, i32, u8, u16);
numeric_into!(i64 => u32, i64);
numeric_into!(f64 => f32, f64);

/// The three numeric lane types.
pub trait LaneNumber: Numeric<Lane = Self> + PartialOrd {
    /// The lane values of this type travel in.
    const LANE: Lane;

    /// Accumulator used by `sum` and summary statistics.
    type Sum: Copy + Default + PartialEq + Debug + Send + Sync + 'static;

    /// Adds `value` to a running sum.
    fn accumulate(sum: Self::Sum, value: Self) -> Self::Sum;

    /// Merges two partial sums.
    fn merge(a: Self::Sum, b: Self::Sum) -> Self::Sum;

    /// The sum as a double, for averages.
    fn sum_as_f64(sum: Self::Sum) -> f64;

    /// The value as a double.
    fn as_f64(self) -> f64;
}

impl LaneNumber for i32 {
    const LANE: Lane = Lane::Int;
    type Sum = i64;

    fn accumulate(sum: i64, value: i32) -> i64 {
        sum.wrapping_add(i64::from(value))
    }

    fn merge(a: i64, b: i64) -> i64 {
        a.wrapping_add(b)
    }

    fn sum_as_f64(sum: i64) -> f64 {
        sum as f64
    }

    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl LaneNumber for i64 {
    const LANE: Lane = Lane::Long;
    type Sum = i64;

    fn accumulate(sum: i64, value: i64) -> i64 {
        sum.wrapping_add(value)
    }

    fn merge(a: i64, b: i64) -> i64 {
        a.wrapping_add(b)
    }

    fn sum_as_f64(sum: i64) -> f64 {
        sum as f64
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl LaneNumber for f64 {
    const LANE: Lane = Lane::Double;
    type Sum = f64;

    fn accumulate(sum: f64, value: f64) -> f64 {
        sum + value
    }

    fn merge(a: f64, b: f64) -> f64 {
        a + b
    }

    fn sum_as_f64(sum: f64) -> f64 {
        sum
    }

    fn as_f64(self) -> f64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_total_order() {
        assert_eq!(f64::NAN.compare(&f64::NAN), Ordering::Equal);
        assert_eq!((-0.0f64).compare(&0.0), Ordering::Less);
        assert!(1.0f64.same_as(&1.0));
    }

    #[test]
    fn test_widen_into_lane() {
        assert_eq!(7u8.widen(), 7i32);
        assert_eq!(u32::MAX.widen(), i64::from(u32::MAX));
        assert_eq!(1.5f32.widen(), 1.5f64);
        assert_eq!(<<i16 as Numeric>::Lane as LaneNumber>::LANE, Lane::Int);
    }

    #[test]
    fn test_int_sum_does_not_overflow_lane() {
        let sum = [i32::MAX, i32::MAX]
            .into_iter()
            .fold(0i64, <i32 as LaneNumber>::accumulate);
        assert_eq!(sum, 2 * i64::from(i32::MAX));
    }
}
