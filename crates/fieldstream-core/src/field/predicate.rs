//! Filter conditions over a single field.

use super::Field;
use crate::value::Orderable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which bounds of a `between` range are part of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Inclusion {
    /// `start < v < end`
    Open,
    /// `start <= v <= end`
    Closed,
    /// `start < v <= end`
    StartOpen,
    /// `start <= v < end`
    #[default]
    EndOpen,
}

impl Inclusion {
    /// Whether `value` lies in the range `[start, end]` under these bounds.
    pub fn contains<V: Orderable>(self, value: &V, start: &V, end: &V) -> bool {
        let lower = value.compare(start);
        let upper = value.compare(end);
        let after_start = match self {
            Inclusion::Closed | Inclusion::EndOpen => lower.is_ge(),
            Inclusion::Open | Inclusion::StartOpen => lower.is_gt(),
        };
        let before_end = match self {
            Inclusion::Closed | Inclusion::StartOpen => upper.is_le(),
            Inclusion::Open | Inclusion::EndOpen => upper.is_lt(),
        };
        after_start && before_end
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Inclusion::Open => "()",
            Inclusion::Closed => "[]",
            Inclusion::StartOpen => "(]",
            Inclusion::EndOpen => "[)",
        };
        f.write_str(text)
    }
}

/// The kind of a field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateKind {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessOrEqual,
    /// Inside a range
    Between,
    /// Outside a range
    NotBetween,
    /// Member of a set
    In,
    /// Not a member of a set
    NotIn,
}

impl PredicateKind {
    /// Whether this kind is the logical complement of a positive kind.
    pub fn is_negated(&self) -> bool {
        matches!(
            self,
            PredicateKind::NotEqual | PredicateKind::NotBetween | PredicateKind::NotIn
        )
    }

    fn operator(&self) -> &'static str {
        match self {
            PredicateKind::Equal => "=",
            PredicateKind::NotEqual => "!=",
            PredicateKind::GreaterThan => ">",
            PredicateKind::GreaterOrEqual => ">=",
            PredicateKind::LessThan => "<",
            PredicateKind::LessOrEqual => "<=",
            PredicateKind::Between => "BETWEEN",
            PredicateKind::NotBetween => "NOT BETWEEN",
            PredicateKind::In => "IN",
            PredicateKind::NotIn => "NOT IN",
        }
    }
}

/// Sorted, deduplicated operands of an `in`/`not_in` predicate.
#[derive(Debug, Clone)]
pub struct OperandSet<V> {
    values: Vec<V>,
}

impl<V: Orderable> OperandSet<V> {
    /// Whether `value` is one of the operands.
    pub fn contains(&self, value: &V) -> bool {
        self.values
            .binary_search_by(|probe| probe.compare(value))
            .is_ok()
    }

    /// Number of distinct operands.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set has no operands.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Operands in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }
}

impl<V: Orderable> FromIterator<V> for OperandSet<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut values: Vec<V> = iter.into_iter().collect();
        values.sort_by(|a, b| a.compare(b));
        values.dedup_by(|a, b| a.same_as(b));
        Self { values }
    }
}

impl<V: Orderable> PartialEq for OperandSet<V> {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.same_as(b))
    }
}

/// The operator and operands of a field predicate.
///
/// Negated kinds are variants of their own so rewrites can match on them
/// exhaustively.
#[derive(Debug, Clone)]
pub enum Condition<V> {
    /// Field equals the operand
    Equal(V),
    /// Field is null or differs from the operand
    NotEqual(V),
    /// Field is greater than the operand
    GreaterThan(V),
    /// Field is greater than or equal to the operand
    GreaterOrEqual(V),
    /// Field is less than the operand
    LessThan(V),
    /// Field is less than or equal to the operand
    LessOrEqual(V),
    /// Field lies in the range
    Between {
        /// Lower bound
        start: V,
        /// Upper bound
        end: V,
        /// Which bounds belong to the range
        inclusion: Inclusion,
    },
    /// Field is null or lies outside the range
    NotBetween {
        /// Lower bound
        start: V,
        /// Upper bound
        end: V,
        /// Which bounds belong to the range
        inclusion: Inclusion,
    },
    /// Field is one of the operands
    In(OperandSet<V>),
    /// Field is null or none of the operands
    NotIn(OperandSet<V>),
}

impl<V: Orderable> Condition<V> {
    /// The predicate kind of this condition.
    pub fn kind(&self) -> PredicateKind {
        match self {
            Condition::Equal(_) => PredicateKind::Equal,
            Condition::NotEqual(_) => PredicateKind::NotEqual,
            Condition::GreaterThan(_) => PredicateKind::GreaterThan,
            Condition::GreaterOrEqual(_) => PredicateKind::GreaterOrEqual,
            Condition::LessThan(_) => PredicateKind::LessThan,
            Condition::LessOrEqual(_) => PredicateKind::LessOrEqual,
            Condition::Between { .. } => PredicateKind::Between,
            Condition::NotBetween { .. } => PredicateKind::NotBetween,
            Condition::In(_) => PredicateKind::In,
            Condition::NotIn(_) => PredicateKind::NotIn,
        }
    }

    /// Evaluates the condition against a field value, `None` being null.
    ///
    /// Positive kinds never accept null; negated kinds are the exact
    /// complement of their positive kind and so always accept null.
    pub fn matches(&self, value: Option<&V>) -> bool {
        match self {
            Condition::Equal(x) => value.is_some_and(|v| v.same_as(x)),
            Condition::NotEqual(x) => !value.is_some_and(|v| v.same_as(x)),
            Condition::GreaterThan(x) => value.is_some_and(|v| v.compare(x).is_gt()),
            Condition::GreaterOrEqual(x) => value.is_some_and(|v| v.compare(x).is_ge()),
            Condition::LessThan(x) => value.is_some_and(|v| v.compare(x).is_lt()),
            Condition::LessOrEqual(x) => value.is_some_and(|v| v.compare(x).is_le()),
            Condition::Between {
                start,
                end,
                inclusion,
            } => value.is_some_and(|v| inclusion.contains(v, start, end)),
            Condition::NotBetween {
                start,
                end,
                inclusion,
            } => !value.is_some_and(|v| inclusion.contains(v, start, end)),
            Condition::In(set) => value.is_some_and(|v| set.contains(v)),
            Condition::NotIn(set) => !value.is_some_and(|v| set.contains(v)),
        }
    }

    fn negate(self) -> Self {
        match self {
            Condition::Equal(x) => Condition::NotEqual(x),
            Condition::NotEqual(x) => Condition::Equal(x),
            Condition::GreaterThan(x) => Condition::LessOrEqual(x),
            Condition::LessOrEqual(x) => Condition::GreaterThan(x),
            Condition::GreaterOrEqual(x) => Condition::LessThan(x),
            Condition::LessThan(x) => Condition::GreaterOrEqual(x),
            Condition::Between {
                start,
                end,
                inclusion,
            } => Condition::NotBetween {
                start,
                end,
                inclusion,
            },
            Condition::NotBetween {
                start,
                end,
                inclusion,
            } => Condition::Between {
                start,
                end,
                inclusion,
            },
            Condition::In(set) => Condition::NotIn(set),
            Condition::NotIn(set) => Condition::In(set),
        }
    }

    fn operands(&self) -> Vec<String> {
        match self {
            Condition::Equal(x)
            | Condition::NotEqual(x)
            | Condition::GreaterThan(x)
            | Condition::GreaterOrEqual(x)
            | Condition::LessThan(x)
            | Condition::LessOrEqual(x) => vec![format!("{:?}", x)],
            Condition::Between { start, end, .. } | Condition::NotBetween { start, end, .. } => {
                vec![format!("{:?}", start), format!("{:?}", end)]
            }
            Condition::In(set) | Condition::NotIn(set) => {
                set.iter().map(|v| format!("{:?}", v)).collect()
            }
        }
    }

    fn inclusion(&self) -> Option<Inclusion> {
        match self {
            Condition::Between { inclusion, .. } | Condition::NotBetween { inclusion, .. } => {
                Some(*inclusion)
            }
            _ => None,
        }
    }
}

/// An immutable filter condition over one field of `E`.
pub struct FieldPredicate<E, V> {
    field: Field<E, V>,
    condition: Condition<V>,
}

impl<E: 'static, V: Orderable> FieldPredicate<E, V> {
    pub(crate) fn new(field: Field<E, V>, condition: Condition<V>) -> Self {
        Self { field, condition }
    }

    /// The field this predicate reads.
    pub fn field(&self) -> &Field<E, V> {
        &self.field
    }

    /// Operator and operands.
    pub fn condition(&self) -> &Condition<V> {
        &self.condition
    }

    /// The predicate kind.
    pub fn kind(&self) -> PredicateKind {
        self.condition.kind()
    }

    /// Evaluates the predicate against `entity`.
    pub fn test(&self, entity: &E) -> bool {
        self.condition.matches(self.field.get(entity).as_ref())
    }

    /// The structurally complementary predicate.
    ///
    /// `Equal`, `Between` and `In` flip to their `Not*` variant and back,
    /// which is an exact complement. The comparison kinds flip to the
    /// opposite comparison, which is a complement over non-null values
    /// only: both sides reject a null field.
    pub fn negate(self) -> Self {
        Self {
            field: self.field,
            condition: self.condition.negate(),
        }
    }

    /// Inspectable, type-erased description.
    pub fn describe(&self) -> PredicateDescriptor {
        PredicateDescriptor {
            kind: self.kind(),
            table: self.field.table().to_string(),
            column: self.field.column_name().to_string(),
            operands: self.condition.operands(),
            inclusion: self.condition.inclusion(),
        }
    }
}

impl<E, V: Clone> Clone for FieldPredicate<E, V> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            condition: self.condition.clone(),
        }
    }
}

impl<E, V: fmt::Debug> fmt::Debug for FieldPredicate<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPredicate")
            .field("field", &self.field)
            .field("condition", &self.condition)
            .finish()
    }
}

impl<E: 'static, V: Orderable> fmt::Display for FieldPredicate<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.describe(), f)
    }
}

/// Type-erased snapshot of a field predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateDescriptor {
    /// Operator kind
    pub kind: PredicateKind,
    /// Table of the field
    pub table: String,
    /// Column of the field
    pub column: String,
    /// Operands rendered with `Debug`, in ascending order for sets
    pub operands: Vec<String>,
    /// Range bounds of the `between` family
    pub inclusion: Option<Inclusion>,
}

impl fmt::Display for PredicateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.kind.operator();
        match self.kind {
            PredicateKind::Between | PredicateKind::NotBetween => write!(
                f,
                "{} {} {} AND {} {}",
                self.column,
                op,
                self.operands.first().map(String::as_str).unwrap_or(""),
                self.operands.get(1).map(String::as_str).unwrap_or(""),
                self.inclusion.unwrap_or_default()
            ),
            PredicateKind::In | PredicateKind::NotIn => {
                write!(f, "{} {} ({})", self.column, op, self.operands.join(", "))
            }
            _ => write!(f, "{} {} {}", self.column, op, self.operands.join(", ")),
        }
    }
}

/// A boolean condition over whole entities.
///
/// Implemented by every [`FieldPredicate`] and by plain closures, so
/// field expressions and ad-hoc lambdas can be attached to the same
/// pipeline. Only field predicates can describe themselves.
pub trait EntityPredicate<E>: Send + Sync {
    /// Evaluates the condition.
    fn test(&self, entity: &E) -> bool;

    /// Inspectable description, if the condition is a field expression.
    fn describe(&self) -> Option<PredicateDescriptor> {
        None
    }
}

impl<E, F> EntityPredicate<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn test(&self, entity: &E) -> bool {
        self(entity)
    }
}

impl<E: 'static, V: Orderable> EntityPredicate<E> for FieldPredicate<E, V> {
    fn test(&self, entity: &E) -> bool {
        FieldPredicate::test(self, entity)
    }

    fn describe(&self) -> Option<PredicateDescriptor> {
        Some(FieldPredicate::describe(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Film {
        length: i32,
        rating: Option<String>,
        score: f64,
    }

    fn film(length: i32, rating: Option<&str>) -> Film {
        Film {
            length,
            rating: rating.map(str::to_string),
            score: 0.0,
        }
    }

    fn length() -> Field<Film, i32> {
        Field::new("film", "length", |f: &Film| f.length).unwrap()
    }

    fn rating() -> Field<Film, String> {
        Field::builder("film", "rating")
            .nullable_getter(|f: &Film| f.rating.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_comparison_kinds() {
        let f = film(120, None);
        assert!(length().equal(120).test(&f));
        assert!(!length().not_equal(120).test(&f));
        assert!(length().greater_than(119).test(&f));
        assert!(!length().greater_than(120).test(&f));
        assert!(length().greater_or_equal(120).test(&f));
        assert!(length().less_than(121).test(&f));
        assert!(length().less_or_equal(120).test(&f));
        assert!(!length().less_than(120).test(&f));
    }

    #[test]
    fn test_between_inclusion() {
        let at_start = film(10, None);
        let at_end = film(20, None);
        let cases = [
            (Inclusion::Closed, true, true),
            (Inclusion::Open, false, false),
            (Inclusion::StartOpen, false, true),
            (Inclusion::EndOpen, true, false),
        ];
        for (inclusion, start, end) in cases {
            let between = length().between(10, 20, inclusion);
            assert_eq!(between.test(&at_start), start, "{:?}", inclusion);
            assert_eq!(between.test(&at_end), end, "{:?}", inclusion);
            let outside = length().not_between(10, 20, inclusion);
            assert_eq!(outside.test(&at_start), !start);
            assert_eq!(outside.test(&at_end), !end);
        }
        assert_eq!(Inclusion::default(), Inclusion::EndOpen);
    }

    #[test]
    fn test_in_collapses_duplicates() {
        let with_dups = length().is_in([90, 130, 90, 130, 150]);
        let plain = length().is_in([150, 130, 90]);
        match (with_dups.condition(), plain.condition()) {
            (Condition::In(a), Condition::In(b)) => {
                assert_eq!(a.len(), 3);
                assert_eq!(a, b);
            }
            other => panic!("unexpected conditions {:?}", other),
        }
        assert!(with_dups.test(&film(130, None)));
        assert!(!with_dups.test(&film(131, None)));
        assert!(length().not_in([90, 90]).test(&film(91, None)));
        assert!(!length().is_in(Vec::new()).test(&film(1, None)));
    }

    #[test]
    fn test_null_semantics() {
        let unrated = film(100, None);
        assert!(!rating().equal("PG".into()).test(&unrated));
        assert!(rating().not_equal("PG".into()).test(&unrated));
        assert!(!rating().is_in(["PG".to_string()]).test(&unrated));
        assert!(rating().not_in(["PG".to_string()]).test(&unrated));
        assert!(!rating()
            .between("A".into(), "Z".into(), Inclusion::Closed)
            .test(&unrated));
        assert!(rating()
            .not_between("A".into(), "Z".into(), Inclusion::Closed)
            .test(&unrated));
        assert!(!rating().greater_than("A".into()).test(&unrated));
        assert!(!rating().less_or_equal("A".into()).test(&unrated));
    }

    #[test]
    fn test_nan_uses_total_order() {
        let score = Field::new("film", "score", |f: &Film| f.score).unwrap();
        let mut nan = film(1, None);
        nan.score = f64::NAN;
        assert!(score.equal(f64::NAN).test(&nan));
        assert!(score.greater_than(f64::INFINITY).test(&nan));
    }

    #[test]
    fn test_negate_is_structural() {
        let p = length().between(1, 5, Inclusion::Closed).negate();
        assert_eq!(p.kind(), PredicateKind::NotBetween);
        assert_eq!(p.clone().negate().kind(), PredicateKind::Between);
        assert_eq!(length().greater_than(3).negate().kind(), PredicateKind::LessOrEqual);
        assert_eq!(length().less_than(3).negate().kind(), PredicateKind::GreaterOrEqual);
        assert_eq!(length().is_in([1]).negate().kind(), PredicateKind::NotIn);
        assert!(PredicateKind::NotIn.is_negated());
        assert!(!PredicateKind::LessOrEqual.is_negated());
    }

    #[test]
    fn test_negate_on_null_field() {
        let missing = film(90, None);
        let pg = film(90, Some("PG"));
        let r = film(90, Some("R"));

        // Equality, range and set kinds negate to an exact complement.
        for p in [
            rating().equal("PG".to_string()),
            rating().between("A".to_string(), "Q".to_string(), Inclusion::Closed),
            rating().is_in(["PG".to_string()]),
        ] {
            for f in [&missing, &pg, &r] {
                assert_ne!(p.test(f), p.clone().negate().test(f));
            }
        }

        // Comparison kinds flip to the opposite comparison: a complement
        // over present values, while both sides reject null.
        let p = rating().greater_than("PG".to_string());
        let flipped = p.clone().negate();
        for f in [&pg, &r] {
            assert_ne!(p.test(f), flipped.test(f));
        }
        assert!(!p.test(&missing));
        assert!(!flipped.test(&missing));
    }

    #[test]
    fn test_describe_and_display() {
        let p = length().greater_than(120);
        let d = p.describe();
        assert_eq!(d.kind, PredicateKind::GreaterThan);
        assert_eq!(d.table, "film");
        assert_eq!(d.column, "length");
        assert_eq!(d.operands, vec!["120".to_string()]);
        assert_eq!(p.to_string(), "length > 120");

        let r = rating().is_in(["R".to_string(), "PG".to_string()]);
        assert_eq!(r.to_string(), "rating IN (\"PG\", \"R\")");

        let b = length().not_between(1, 9, Inclusion::Closed);
        assert_eq!(b.to_string(), "length NOT BETWEEN 1 AND 9 []");
    }

    #[test]
    fn test_closures_are_entity_predicates() {
        fn check<P: EntityPredicate<Film>>(p: &P, f: &Film) -> (bool, bool) {
            (p.test(f), p.describe().is_some())
        }
        let long = |f: &Film| f.length > 100;
        assert_eq!(check(&long, &film(120, None)), (true, false));
        assert_eq!(check(&length().less_than(100), &film(120, None)), (false, true));
    }
}
