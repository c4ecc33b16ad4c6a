//! Typed descriptors of persistent attributes.
//!
//! A [`Field`] binds an entity attribute to its table/column identity and
//! to a pure accessor. Fields are produced once (by hand or by a build-time
//! generator), shared freely and never mutated. They are the factory for
//! every [`FieldPredicate`] and [`FieldComparator`] over that attribute.

pub mod comparator;
pub mod predicate;

pub use comparator::{ComparatorDescriptor, Direction, EntityComparator, FieldComparator, NullOrder};
pub use predicate::{
    Condition, EntityPredicate, FieldPredicate, Inclusion, OperandSet, PredicateDescriptor,
    PredicateKind,
};

use crate::error::{Error, Result};
use crate::value::{Numeric, Orderable};
use std::fmt;
use std::sync::Arc;

type Getter<E, V> = Box<dyn Fn(&E) -> Option<V> + Send + Sync>;

/// Immutable, typed descriptor of one persistent attribute of `E`.
///
/// Cloning is cheap; clones share the same descriptor.
pub struct Field<E, V> {
    inner: Arc<FieldInner<E, V>>,
}

struct FieldInner<E, V> {
    table: String,
    column: String,
    getter: Getter<E, V>,
    unique: bool,
    nullable: bool,
    null_order: NullOrder,
}

impl<E: 'static, V: Orderable> Field<E, V> {
    /// Starts building a field of `table.column`.
    pub fn builder(table: impl Into<String>, column: impl Into<String>) -> FieldBuilder<E, V> {
        FieldBuilder {
            table: table.into(),
            column: column.into(),
            getter: None,
            unique: false,
            null_order: NullOrder::default(),
        }
    }

    /// Creates a non-nullable, non-unique field.
    pub fn new<G>(table: impl Into<String>, column: impl Into<String>, getter: G) -> Result<Self>
    where
        G: Fn(&E) -> V + Send + Sync + 'static,
    {
        Self::builder(table, column).getter(getter).build()
    }

    /// The owning entity's table.
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// The column this field maps to.
    pub fn column_name(&self) -> &str {
        &self.inner.column
    }

    /// Reads the attribute. `None` means the attribute is null.
    pub fn get(&self, entity: &E) -> Option<V> {
        (self.inner.getter)(entity)
    }

    /// Whether the column holds unique values.
    pub fn is_unique(&self) -> bool {
        self.inner.unique
    }

    /// Whether the getter may report null.
    pub fn is_nullable(&self) -> bool {
        self.inner.nullable
    }

    /// Where nulls sort in this field's default comparator.
    pub fn null_order(&self) -> NullOrder {
        self.inner.null_order
    }

    /// Fields themselves are never reversed; only comparators are.
    pub fn is_reversed(&self) -> bool {
        false
    }

    /// Ascending comparator with the field's null order.
    pub fn comparator(&self) -> FieldComparator<E, V> {
        FieldComparator::new(self.clone(), Direction::Ascending, self.null_order())
    }

    /// Descending comparator with the field's null order.
    pub fn reversed(&self) -> FieldComparator<E, V> {
        self.comparator().reversed()
    }

    /// Ascending comparator that sorts null attributes first.
    pub fn comparator_null_fields_first(&self) -> FieldComparator<E, V> {
        self.comparator().nulls_first()
    }

    /// Attribute equals `value`.
    pub fn equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(Condition::Equal(value))
    }

    /// Attribute is null or differs from `value`.
    pub fn not_equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(Condition::NotEqual(value))
    }

    /// Attribute is greater than `value`.
    pub fn greater_than(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(Condition::GreaterThan(value))
    }

    /// Attribute is greater than or equal to `value`.
    pub fn greater_or_equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(Condition::GreaterOrEqual(value))
    }

    /// Attribute is less than `value`.
    pub fn less_than(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(Condition::LessThan(value))
    }

    /// Attribute is less than or equal to `value`.
    pub fn less_or_equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(Condition::LessOrEqual(value))
    }

    /// Attribute lies between `start` and `end`, bounds per `inclusion`.
    pub fn between(&self, start: V, end: V, inclusion: Inclusion) -> FieldPredicate<E, V> {
        self.predicate(Condition::Between {
            start,
            end,
            inclusion,
        })
    }

    /// Exact complement of [`Field::between`] with the same arguments.
    pub fn not_between(&self, start: V, end: V, inclusion: Inclusion) -> FieldPredicate<E, V> {
        self.predicate(Condition::NotBetween {
            start,
            end,
            inclusion,
        })
    }

    /// Attribute equals one of `values`. Duplicate operands collapse.
    pub fn is_in<I: IntoIterator<Item = V>>(&self, values: I) -> FieldPredicate<E, V> {
        self.predicate(Condition::In(values.into_iter().collect()))
    }

    /// Exact complement of [`Field::is_in`] with the same operands.
    pub fn not_in<I: IntoIterator<Item = V>>(&self, values: I) -> FieldPredicate<E, V> {
        self.predicate(Condition::NotIn(values.into_iter().collect()))
    }

    fn predicate(&self, condition: Condition<V>) -> FieldPredicate<E, V> {
        FieldPredicate::new(self.clone(), condition)
    }
}

impl<E: 'static, V: Numeric> Field<E, V> {
    /// Reads the attribute widened into its numeric lane.
    pub fn get_as_lane(&self, entity: &E) -> Option<V::Lane> {
        self.get(entity).map(Numeric::widen)
    }
}

impl<E: 'static, V: Orderable + Into<i32>> Field<E, V> {
    /// Reads the attribute as an `i32`.
    pub fn get_as_int(&self, entity: &E) -> Option<i32> {
        self.get(entity).map(Into::into)
    }
}

impl<E: 'static, V: Orderable + Into<i64>> Field<E, V> {
    /// Reads the attribute as an `i64`.
    pub fn get_as_long(&self, entity: &E) -> Option<i64> {
        self.get(entity).map(Into::into)
    }
}

impl<E: 'static, V: Orderable + Into<f64>> Field<E, V> {
    /// Reads the attribute as an `f64`.
    pub fn get_as_double(&self, entity: &E) -> Option<f64> {
        self.get(entity).map(Into::into)
    }
}

impl<E, V> Clone for Field<E, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E, V> fmt::Debug for Field<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("table", &self.inner.table)
            .field("column", &self.inner.column)
            .field("unique", &self.inner.unique)
            .field("nullable", &self.inner.nullable)
            .field("null_order", &self.inner.null_order)
            .finish()
    }
}

/// Builder for [`Field`]. Table, column and getter are required.
pub struct FieldBuilder<E, V> {
    table: String,
    column: String,
    getter: Option<(Getter<E, V>, bool)>,
    unique: bool,
    null_order: NullOrder,
}

impl<E: 'static, V: Orderable> FieldBuilder<E, V> {
    /// Accessor for an attribute that is never null.
    pub fn getter<G>(mut self, getter: G) -> Self
    where
        G: Fn(&E) -> V + Send + Sync + 'static,
    {
        self.getter = Some((Box::new(move |e: &E| Some(getter(e))), false));
        self
    }

    /// Accessor for an attribute that may be null.
    pub fn nullable_getter<G>(mut self, getter: G) -> Self
    where
        G: Fn(&E) -> Option<V> + Send + Sync + 'static,
    {
        self.getter = Some((Box::new(getter), true));
        self
    }

    /// Marks the column unique.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Null placement for the field's comparators.
    pub fn null_order(mut self, null_order: NullOrder) -> Self {
        self.null_order = null_order;
        self
    }

    /// Validates required arguments and freezes the field.
    pub fn build(self) -> Result<Field<E, V>> {
        if self.table.trim().is_empty() {
            return Err(Error::Construction("field table is required".to_string()));
        }
        if self.column.trim().is_empty() {
            return Err(Error::Construction(format!(
                "column name is required for a field of table '{}'",
                self.table
            )));
        }
        let (getter, nullable) = self.getter.ok_or_else(|| {
            Error::Construction(format!(
                "getter is required for field '{}.{}'",
                self.table, self.column
            ))
        })?;

        Ok(Field {
            inner: Arc::new(FieldInner {
                table: self.table,
                column: self.column,
                getter,
                unique: self.unique,
                nullable,
                null_order: self.null_order,
            }),
        })
    }
}
