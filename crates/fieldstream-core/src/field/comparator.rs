//! Orderings over a single field.

use super::Field;
use crate::value::Orderable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Where null attributes sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NullOrder {
    /// Nulls before every value
    First,
    /// Nulls after every value
    #[default]
    Last,
}

/// Sort direction of a comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest value first
    #[default]
    Ascending,
    /// Largest value first
    Descending,
}

impl Direction {
    /// The opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// An immutable ordering rule over one field of `E`.
///
/// Null placement is absolute: reversing the direction does not move
/// nulls to the other end.
pub struct FieldComparator<E, V> {
    field: Field<E, V>,
    direction: Direction,
    null_order: NullOrder,
}

impl<E: 'static, V: Orderable> FieldComparator<E, V> {
    pub(crate) fn new(field: Field<E, V>, direction: Direction, null_order: NullOrder) -> Self {
        Self {
            field,
            direction,
            null_order,
        }
    }

    /// The field this comparator reads.
    pub fn field(&self) -> &Field<E, V> {
        &self.field
    }

    /// Sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the direction is descending.
    pub fn is_reversed(&self) -> bool {
        self.direction == Direction::Descending
    }

    /// Null placement.
    pub fn null_order(&self) -> NullOrder {
        self.null_order
    }

    /// The same comparator in the opposite direction.
    pub fn reversed(mut self) -> Self {
        self.direction = self.direction.flip();
        self
    }

    /// The same comparator with nulls sorted first.
    pub fn nulls_first(mut self) -> Self {
        self.null_order = NullOrder::First;
        self
    }

    /// The same comparator with nulls sorted last.
    pub fn nulls_last(mut self) -> Self {
        self.null_order = NullOrder::Last;
        self
    }

    /// Compares two entities by the field.
    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        match (self.field.get(a), self.field.get(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => match self.null_order {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (Some(_), None) => match self.null_order {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            (Some(x), Some(y)) => match self.direction {
                Direction::Ascending => Orderable::compare(&x, &y),
                Direction::Descending => Orderable::compare(&y, &x),
            },
        }
    }

    /// Inspectable, type-erased description.
    pub fn describe(&self) -> ComparatorDescriptor {
        ComparatorDescriptor {
            table: self.field.table().to_string(),
            column: self.field.column_name().to_string(),
            direction: self.direction,
            null_order: self.null_order,
        }
    }
}

impl<E, V> Clone for FieldComparator<E, V> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            direction: self.direction,
            null_order: self.null_order,
        }
    }
}

impl<E, V> fmt::Debug for FieldComparator<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldComparator")
            .field("field", &self.field)
            .field("direction", &self.direction)
            .field("null_order", &self.null_order)
            .finish()
    }
}

/// Type-erased snapshot of a field comparator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComparatorDescriptor {
    /// Table of the field
    pub table: String,
    /// Column of the field
    pub column: String,
    /// Sort direction
    pub direction: Direction,
    /// Null placement
    pub null_order: NullOrder,
}

impl fmt::Display for ComparatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        let nulls = match self.null_order {
            NullOrder::First => "NULLS FIRST",
            NullOrder::Last => "NULLS LAST",
        };
        write!(f, "{} {} {}", self.column, direction, nulls)
    }
}

/// An ordering over whole entities.
///
/// Implemented by every [`FieldComparator`] and by plain closures.
pub trait EntityComparator<E>: Send + Sync {
    /// Compares two entities.
    fn compare(&self, a: &E, b: &E) -> Ordering;

    /// Inspectable description, if the ordering is a field expression.
    fn describe(&self) -> Option<ComparatorDescriptor> {
        None
    }
}

impl<E, F> EntityComparator<E> for F
where
    F: Fn(&E, &E) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &E, b: &E) -> Ordering {
        self(a, b)
    }
}

impl<E: 'static, V: Orderable> EntityComparator<E> for FieldComparator<E, V> {
    fn compare(&self, a: &E, b: &E) -> Ordering {
        FieldComparator::compare(self, a, b)
    }

    fn describe(&self) -> Option<ComparatorDescriptor> {
        Some(FieldComparator::describe(self))
    }
}
