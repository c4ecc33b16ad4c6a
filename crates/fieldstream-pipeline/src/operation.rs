//! Intermediate and terminal operation descriptors.
//!
//! Operations are plain data: a tag, the lane they read and, where the
//! operation needs user code, an erased callable. Factories are pure and
//! never fail; lane compatibility is checked when an operation is
//! appended to a [`Pipeline`](crate::Pipeline).

use crate::callable::{
    ElementAction, ElementCombiner, ElementConsumer, ElementDedup, ElementFlatMapper,
    ElementMapper, ElementOrder, ElementPredicate,
};
use fieldstream_core::{
    ComparatorDescriptor, EntityComparator, EntityPredicate, Lane, LaneNumber, Orderable,
    PredicateDescriptor,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// A lazy, non-consuming pipeline stage.
#[derive(Clone, PartialEq)]
pub enum IntermediateOperation {
    /// Keep elements matching the predicate
    Filter(ElementPredicate),
    /// Transform each element, possibly into another lane
    Map(ElementMapper),
    /// Sort by natural order or by a comparator
    Sorted(ElementOrder),
    /// Drop repeated elements
    Distinct(ElementDedup),
    /// Keep at most `n` elements
    Limit {
        /// Lane of the elements
        lane: Lane,
        /// Maximum number of elements
        n: u64,
    },
    /// Drop the first `n` elements
    Skip {
        /// Lane of the elements
        lane: Lane,
        /// Number of elements to drop
        n: u64,
    },
    /// Observe each element as it passes
    Peek(ElementAction),
    /// Replace each element by zero or more elements
    FlatMap(ElementFlatMapper),
    /// Keep elements while the predicate holds
    TakeWhile(ElementPredicate),
    /// Drop elements while the predicate holds
    DropWhile(ElementPredicate),
}

impl IntermediateOperation {
    /// Filter by a field predicate or closure over `T`.
    pub fn filter<T: 'static, P: EntityPredicate<T> + 'static>(predicate: P) -> Self {
        IntermediateOperation::Filter(ElementPredicate::new(predicate))
    }

    /// Map `T` to `R`. The lane of `R` becomes the active lane.
    pub fn map<T, R, F>(f: F) -> Self
    where
        T: 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        IntermediateOperation::Map(ElementMapper::new(f))
    }

    /// Sort by the natural order of `T`.
    pub fn sorted<T: Orderable>() -> Self {
        IntermediateOperation::Sorted(ElementOrder::natural::<T>())
    }

    /// Sort by a field comparator or closure over `T`.
    pub fn sorted_by<T: 'static, C: EntityComparator<T> + 'static>(comparator: C) -> Self {
        IntermediateOperation::Sorted(ElementOrder::new(comparator))
    }

    /// Distinct by value equality of `T`.
    pub fn distinct<T: Eq + Hash + Clone + Send + 'static>() -> Self {
        IntermediateOperation::Distinct(ElementDedup::new::<T>())
    }

    /// Distinct by a derived key.
    pub fn distinct_by<T, K, F>(key: F) -> Self
    where
        T: 'static,
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        IntermediateOperation::Distinct(ElementDedup::by_key(key))
    }

    /// Truncate to `n` elements of `lane`.
    pub fn limit(lane: Lane, n: u64) -> Self {
        IntermediateOperation::Limit { lane, n }
    }

    /// Skip `n` elements of `lane`.
    pub fn skip(lane: Lane, n: u64) -> Self {
        IntermediateOperation::Skip { lane, n }
    }

    /// Observe each `T`.
    pub fn peek<T: 'static, F: Fn(&T) + Send + Sync + 'static>(action: F) -> Self {
        IntermediateOperation::Peek(ElementAction::new(action))
    }

    /// Expand each `T` into any number of `R`.
    pub fn flat_map<T, R, I, F>(f: F) -> Self
    where
        T: 'static,
        R: Send + 'static,
        I: IntoIterator<Item = R>,
        I::IntoIter: Send + 'static,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        IntermediateOperation::FlatMap(ElementFlatMapper::new(f))
    }

    /// Keep the prefix of `T` matching the predicate.
    pub fn take_while<T: 'static, P: EntityPredicate<T> + 'static>(predicate: P) -> Self {
        IntermediateOperation::TakeWhile(ElementPredicate::new(predicate))
    }

    /// Drop the prefix of `T` matching the predicate.
    pub fn drop_while<T: 'static, P: EntityPredicate<T> + 'static>(predicate: P) -> Self {
        IntermediateOperation::DropWhile(ElementPredicate::new(predicate))
    }

    /// Lane the operation reads.
    pub fn input_lane(&self) -> Lane {
        match self {
            IntermediateOperation::Filter(p)
            | IntermediateOperation::TakeWhile(p)
            | IntermediateOperation::DropWhile(p) => p.lane(),
            IntermediateOperation::Map(m) => m.from_lane(),
            IntermediateOperation::FlatMap(m) => m.from_lane(),
            IntermediateOperation::Sorted(o) => o.lane(),
            IntermediateOperation::Distinct(d) => d.lane(),
            IntermediateOperation::Limit { lane, .. } | IntermediateOperation::Skip { lane, .. } => {
                *lane
            }
            IntermediateOperation::Peek(a) => a.lane(),
        }
    }

    /// Lane the operation produces.
    pub fn output_lane(&self) -> Lane {
        match self {
            IntermediateOperation::Map(m) => m.to_lane(),
            IntermediateOperation::FlatMap(m) => m.to_lane(),
            other => other.input_lane(),
        }
    }

    /// Short operation name.
    pub fn name(&self) -> &'static str {
        match self {
            IntermediateOperation::Filter(_) => "filter",
            IntermediateOperation::Map(_) => "map",
            IntermediateOperation::Sorted(_) => "sorted",
            IntermediateOperation::Distinct(_) => "distinct",
            IntermediateOperation::Limit { .. } => "limit",
            IntermediateOperation::Skip { .. } => "skip",
            IntermediateOperation::Peek(_) => "peek",
            IntermediateOperation::FlatMap(_) => "flat_map",
            IntermediateOperation::TakeWhile(_) => "take_while",
            IntermediateOperation::DropWhile(_) => "drop_while",
        }
    }

    /// Whether the operation may stop pulling before the source is exhausted.
    pub fn is_short_circuiting(&self) -> bool {
        matches!(
            self,
            IntermediateOperation::Limit { .. } | IntermediateOperation::TakeWhile(_)
        )
    }

    /// Field predicate behind a filter-like operation, if any.
    pub fn predicate(&self) -> Option<&PredicateDescriptor> {
        match self {
            IntermediateOperation::Filter(p)
            | IntermediateOperation::TakeWhile(p)
            | IntermediateOperation::DropWhile(p) => p.descriptor(),
            _ => None,
        }
    }

    /// Field comparator behind a sort, if any.
    pub fn comparator(&self) -> Option<&ComparatorDescriptor> {
        match self {
            IntermediateOperation::Sorted(o) => o.descriptor(),
            _ => None,
        }
    }

    /// Serialisable snapshot.
    pub fn describe(&self) -> StageDescription {
        let count = match self {
            IntermediateOperation::Limit { n, .. } | IntermediateOperation::Skip { n, .. } => {
                Some(*n)
            }
            _ => None,
        };
        StageDescription {
            name: self.name().to_string(),
            input_lane: self.input_lane().to_string(),
            output_lane: self.output_lane().to_string(),
            predicate: self.predicate().cloned(),
            comparator: self.comparator().cloned(),
            count,
        }
    }
}

impl fmt::Display for IntermediateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntermediateOperation::Filter(p)
            | IntermediateOperation::TakeWhile(p)
            | IntermediateOperation::DropWhile(p) => write!(f, "{}({})", self.name(), p),
            IntermediateOperation::Map(m) => write!(f, "map({} -> {})", m.from_lane(), m.to_lane()),
            IntermediateOperation::FlatMap(m) => {
                write!(f, "flat_map({} -> {})", m.from_lane(), m.to_lane())
            }
            IntermediateOperation::Sorted(o) => match o.descriptor() {
                Some(d) => write!(f, "sorted({})", d),
                None if o.is_natural() => write!(f, "sorted"),
                None => write!(f, "sorted(<fn {}>)", o.lane()),
            },
            IntermediateOperation::Limit { n, .. } | IntermediateOperation::Skip { n, .. } => {
                write!(f, "{}({})", self.name(), n)
            }
            IntermediateOperation::Distinct(_) | IntermediateOperation::Peek(_) => {
                write!(f, "{}", self.name())
            }
        }
    }
}

impl fmt::Debug for IntermediateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self, self.input_lane())
    }
}

/// The single consuming operation that ends a pipeline.
#[derive(Clone, PartialEq)]
pub enum TerminalOperation {
    /// Gather every element into a list
    Collect {
        /// Lane of the elements
        lane: Lane,
    },
    /// Gather every element into an array
    ToArray {
        /// Lane of the elements
        lane: Lane,
    },
    /// Fold with an associative combiner
    Reduce(ElementCombiner),
    /// Count the elements
    Count {
        /// Lane of the elements
        lane: Lane,
    },
    /// Hand every element to a consumer, in any order when parallel
    ForEach(ElementConsumer),
    /// Hand every element to a consumer in encounter order
    ForEachOrdered(ElementConsumer),
    /// The first element in encounter order
    FindFirst {
        /// Lane of the elements
        lane: Lane,
    },
    /// Any element
    FindAny {
        /// Lane of the elements
        lane: Lane,
    },
    /// Whether some element matches
    AnyMatch(ElementPredicate),
    /// Whether every element matches
    AllMatch(ElementPredicate),
    /// Whether no element matches
    NoneMatch(ElementPredicate),
    /// Count, sum, min, max and average of a numeric lane
    Statistics {
        /// Numeric lane of the elements
        lane: Lane,
    },
}

impl TerminalOperation {
    /// Collect elements of `lane`.
    pub fn collect(lane: Lane) -> Self {
        TerminalOperation::Collect { lane }
    }

    /// Collect elements of `lane` into an array.
    pub fn to_array(lane: Lane) -> Self {
        TerminalOperation::ToArray { lane }
    }

    /// Reduce `T` with `f`, seeded by `identity` when given.
    pub fn reduce<T, F>(identity: Option<T>, f: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        TerminalOperation::Reduce(ElementCombiner::new(identity, f))
    }

    /// Count elements of `lane`.
    pub fn count(lane: Lane) -> Self {
        TerminalOperation::Count { lane }
    }

    /// Consume each `T`.
    pub fn for_each<T: 'static, F: Fn(T) + Send + Sync + 'static>(consumer: F) -> Self {
        TerminalOperation::ForEach(ElementConsumer::new(consumer))
    }

    /// Consume each `T` in encounter order.
    pub fn for_each_ordered<T: 'static, F: Fn(T) + Send + Sync + 'static>(consumer: F) -> Self {
        TerminalOperation::ForEachOrdered(ElementConsumer::new(consumer))
    }

    /// First element of `lane`.
    pub fn find_first(lane: Lane) -> Self {
        TerminalOperation::FindFirst { lane }
    }

    /// Any element of `lane`.
    pub fn find_any(lane: Lane) -> Self {
        TerminalOperation::FindAny { lane }
    }

    /// Whether some `T` matches.
    pub fn any_match<T: 'static, P: EntityPredicate<T> + 'static>(predicate: P) -> Self {
        TerminalOperation::AnyMatch(ElementPredicate::new(predicate))
    }

    /// Whether every `T` matches.
    pub fn all_match<T: 'static, P: EntityPredicate<T> + 'static>(predicate: P) -> Self {
        TerminalOperation::AllMatch(ElementPredicate::new(predicate))
    }

    /// Whether no `T` matches.
    pub fn none_match<T: 'static, P: EntityPredicate<T> + 'static>(predicate: P) -> Self {
        TerminalOperation::NoneMatch(ElementPredicate::new(predicate))
    }

    /// Summary statistics of a numeric lane.
    pub fn statistics<T: LaneNumber>() -> Self {
        TerminalOperation::Statistics { lane: T::LANE }
    }

    /// Lane the operation reads.
    pub fn input_lane(&self) -> Lane {
        match self {
            TerminalOperation::Collect { lane }
            | TerminalOperation::ToArray { lane }
            | TerminalOperation::Count { lane }
            | TerminalOperation::FindFirst { lane }
            | TerminalOperation::FindAny { lane }
            | TerminalOperation::Statistics { lane } => *lane,
            TerminalOperation::Reduce(c) => c.lane(),
            TerminalOperation::ForEach(c) | TerminalOperation::ForEachOrdered(c) => c.lane(),
            TerminalOperation::AnyMatch(p)
            | TerminalOperation::AllMatch(p)
            | TerminalOperation::NoneMatch(p) => p.lane(),
        }
    }

    /// Short operation name.
    pub fn name(&self) -> &'static str {
        match self {
            TerminalOperation::Collect { .. } => "collect",
            TerminalOperation::ToArray { .. } => "to_array",
            TerminalOperation::Reduce(_) => "reduce",
            TerminalOperation::Count { .. } => "count",
            TerminalOperation::ForEach(_) => "for_each",
            TerminalOperation::ForEachOrdered(_) => "for_each_ordered",
            TerminalOperation::FindFirst { .. } => "find_first",
            TerminalOperation::FindAny { .. } => "find_any",
            TerminalOperation::AnyMatch(_) => "any_match",
            TerminalOperation::AllMatch(_) => "all_match",
            TerminalOperation::NoneMatch(_) => "none_match",
            TerminalOperation::Statistics { .. } => "statistics",
        }
    }

    /// Whether the operation may finish before the source is exhausted.
    pub fn is_short_circuiting(&self) -> bool {
        matches!(
            self,
            TerminalOperation::FindFirst { .. }
                | TerminalOperation::FindAny { .. }
                | TerminalOperation::AnyMatch(_)
                | TerminalOperation::AllMatch(_)
                | TerminalOperation::NoneMatch(_)
        )
    }

    /// Serialisable snapshot.
    pub fn describe(&self) -> StageDescription {
        let predicate = match self {
            TerminalOperation::AnyMatch(p)
            | TerminalOperation::AllMatch(p)
            | TerminalOperation::NoneMatch(p) => p.descriptor().cloned(),
            _ => None,
        };
        StageDescription {
            name: self.name().to_string(),
            input_lane: self.input_lane().to_string(),
            output_lane: self.input_lane().to_string(),
            predicate,
            comparator: None,
            count: None,
        }
    }
}

impl fmt::Display for TerminalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalOperation::AnyMatch(p)
            | TerminalOperation::AllMatch(p)
            | TerminalOperation::NoneMatch(p) => write!(f, "{}({})", self.name(), p),
            _ => write!(f, "{}", self.name()),
        }
    }
}

impl fmt::Debug for TerminalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self, self.input_lane())
    }
}

/// Serialisable snapshot of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescription {
    /// Operation name, e.g. `filter`
    pub name: String,
    /// Lane read by the stage
    pub input_lane: String,
    /// Lane produced by the stage
    pub output_lane: String,
    /// Field predicate of a filter-like stage
    pub predicate: Option<PredicateDescriptor>,
    /// Field comparator of a sort
    pub comparator: Option<ComparatorDescriptor>,
    /// Count of a limit or skip
    pub count: Option<u64>,
}
