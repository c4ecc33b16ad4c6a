//! Results of executed pipelines.

use fieldstream_core::{Element, Error, LaneNumber, Result, SummaryStatistics};
use std::any::Any;
use std::fmt;

/// The value produced by a pipeline's terminal operation.
///
/// Elements stay type-erased; the `into_*` methods recover static types
/// and fail with `LaneMismatch` if the elements are of another type.
pub enum TerminalValue {
    /// Elements gathered by `collect`
    List(Vec<Element>),
    /// Elements gathered by `to_array`
    Array(Box<[Element]>),
    /// Result of `find_first`, `find_any` or `reduce`
    Single(Option<Element>),
    /// Result of `count`
    Count(u64),
    /// Result of `any_match`, `all_match` or `none_match`
    Bool(bool),
    /// Result of `for_each` and `for_each_ordered`
    Unit,
    /// Statistics of the int lane
    IntStatistics(SummaryStatistics<i32>),
    /// Statistics of the long lane
    LongStatistics(SummaryStatistics<i64>),
    /// Statistics of the double lane
    DoubleStatistics(SummaryStatistics<f64>),
}

impl TerminalValue {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            TerminalValue::List(_) => "list",
            TerminalValue::Array(_) => "array",
            TerminalValue::Single(_) => "single",
            TerminalValue::Count(_) => "count",
            TerminalValue::Bool(_) => "bool",
            TerminalValue::Unit => "unit",
            TerminalValue::IntStatistics(_)
            | TerminalValue::LongStatistics(_)
            | TerminalValue::DoubleStatistics(_) => "statistics",
        }
    }

    fn unexpected(&self, wanted: &str) -> Error {
        Error::PipelineState(format!(
            "expected a {} result but the terminal operation produced a {} result",
            wanted,
            self.kind()
        ))
    }

    /// The gathered elements of a `collect` or `to_array`.
    pub fn into_list<T: 'static>(self) -> Result<Vec<T>> {
        let elements = match self {
            TerminalValue::List(elements) => elements,
            TerminalValue::Array(elements) => elements.into_vec(),
            other => return Err(other.unexpected("list")),
        };
        elements.into_iter().map(Element::into_value).collect()
    }

    /// The gathered elements as a boxed slice.
    pub fn into_array<T: 'static>(self) -> Result<Box<[T]>> {
        self.into_list().map(Vec::into_boxed_slice)
    }

    /// The optional element of a `find_*` or `reduce`.
    pub fn into_optional<T: 'static>(self) -> Result<Option<T>> {
        match self {
            TerminalValue::Single(element) => element.map(Element::into_value).transpose(),
            other => Err(other.unexpected("single")),
        }
    }

    /// The element of a `reduce` with identity. An empty `find_*` result
    /// is reported as `PipelineState`.
    pub fn into_value<T: 'static>(self) -> Result<T> {
        self.into_optional()?.ok_or_else(|| {
            Error::PipelineState("terminal operation produced no element".to_string())
        })
    }

    /// The number of elements counted.
    pub fn as_count(&self) -> Result<u64> {
        match self {
            TerminalValue::Count(n) => Ok(*n),
            other => Err(other.unexpected("count")),
        }
    }

    /// The outcome of a match operation.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            TerminalValue::Bool(b) => Ok(*b),
            other => Err(other.unexpected("bool")),
        }
    }

    /// The statistics of a numeric lane.
    pub fn into_statistics<T: LaneNumber>(self) -> Result<SummaryStatistics<T>> {
        let boxed: Box<dyn Any> = match self {
            TerminalValue::IntStatistics(stats) => Box::new(stats),
            TerminalValue::LongStatistics(stats) => Box::new(stats),
            TerminalValue::DoubleStatistics(stats) => Box::new(stats),
            other => return Err(other.unexpected("statistics")),
        };
        boxed
            .downcast::<SummaryStatistics<T>>()
            .map(|stats| *stats)
            .map_err(|_| {
                Error::PipelineState("statistics were computed over another lane".to_string())
            })
    }
}

impl fmt::Debug for TerminalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalValue::List(elements) => f.debug_tuple("List").field(elements).finish(),
            TerminalValue::Array(elements) => f.debug_tuple("Array").field(elements).finish(),
            TerminalValue::Single(element) => f.debug_tuple("Single").field(element).finish(),
            TerminalValue::Count(n) => f.debug_tuple("Count").field(n).finish(),
            TerminalValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            TerminalValue::Unit => f.write_str("Unit"),
            TerminalValue::IntStatistics(s) => f.debug_tuple("IntStatistics").field(s).finish(),
            TerminalValue::LongStatistics(s) => f.debug_tuple("LongStatistics").field(s).finish(),
            TerminalValue::DoubleStatistics(s) => {
                f.debug_tuple("DoubleStatistics").field(s).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_extraction() {
        let list = TerminalValue::List(vec![Element::wrap(1i64), Element::wrap(2i64)]);
        assert_eq!(list.into_list::<i64>().unwrap(), vec![1, 2]);

        let single = TerminalValue::Single(Some(Element::wrap("x".to_string())));
        assert_eq!(single.into_value::<String>().unwrap(), "x");

        assert_eq!(TerminalValue::Count(3).as_count().unwrap(), 3);
        assert!(TerminalValue::Bool(true).as_bool().unwrap());
    }

    #[test]
    fn test_wrong_type_or_kind() {
        let list = TerminalValue::List(vec![Element::wrap(1i32)]);
        assert!(matches!(
            list.into_list::<String>(),
            Err(Error::LaneMismatch { .. })
        ));
        assert!(matches!(
            TerminalValue::Unit.as_count(),
            Err(Error::PipelineState(_))
        ));
        assert!(matches!(
            TerminalValue::Single(None).into_value::<i32>(),
            Err(Error::PipelineState(_))
        ));
    }

    #[test]
    fn test_statistics_extraction() {
        let stats: SummaryStatistics<i32> = vec![1, 2, 3].into_iter().collect();
        let value = TerminalValue::IntStatistics(stats);
        assert_eq!(value.into_statistics::<i32>().unwrap().sum(), 6);

        let value = TerminalValue::IntStatistics(stats);
        assert!(value.into_statistics::<f64>().is_err());
    }
}
