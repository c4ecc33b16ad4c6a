//! Type-erased user functions carried by operation descriptors.
//!
//! Every callable is built from a statically typed function and records
//! the lane it reads, so the pipeline can reject it when the active lane
//! differs. Callables are cheap to clone and compare by identity.

use fieldstream_core::{
    ComparatorDescriptor, Element, EntityComparator, EntityPredicate, Lane, Orderable,
    PredicateDescriptor, Result,
};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// A lazily pulled sequence of erased elements.
pub type ElementIter = Box<dyn Iterator<Item = Element> + Send>;

/// A boolean test over elements of one lane.
#[derive(Clone)]
pub struct ElementPredicate {
    lane: Lane,
    test: Arc<dyn Fn(&Element) -> bool + Send + Sync>,
    descriptor: Option<PredicateDescriptor>,
}

impl ElementPredicate {
    /// Erases a predicate over `T`. Field predicates keep their descriptor.
    pub fn new<T, P>(predicate: P) -> Self
    where
        T: 'static,
        P: EntityPredicate<T> + 'static,
    {
        let descriptor = predicate.describe();
        Self {
            lane: Lane::of::<T>(),
            test: Arc::new(move |e: &Element| {
                e.downcast_ref::<T>().is_some_and(|v| predicate.test(v))
            }),
            descriptor,
        }
    }

    /// Lane of the elements tested.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Evaluates the predicate. Elements of another lane never match.
    pub fn test(&self, element: &Element) -> bool {
        (self.test)(element)
    }

    /// Description of the underlying field predicate, if any.
    pub fn descriptor(&self) -> Option<&PredicateDescriptor> {
        self.descriptor.as_ref()
    }
}

impl PartialEq for ElementPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.lane == other.lane && Arc::ptr_eq(&self.test, &other.test)
    }
}

impl fmt::Display for ElementPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.descriptor {
            Some(d) => write!(f, "{}", d),
            None => write!(f, "<fn {}>", self.lane),
        }
    }
}

/// A one-to-one transformation, possibly moving elements to another lane.
#[derive(Clone)]
pub struct ElementMapper {
    from: Lane,
    to: Lane,
    apply: Arc<dyn Fn(Element) -> Result<Element> + Send + Sync>,
}

impl ElementMapper {
    /// Erases `f: T -> R`.
    pub fn new<T, R, F>(f: F) -> Self
    where
        T: 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        Self {
            from: Lane::of::<T>(),
            to: Lane::of::<R>(),
            apply: Arc::new(move |e: Element| e.into_value::<T>().map(|v| Element::wrap(f(v)))),
        }
    }

    /// Lane of the input elements.
    pub fn from_lane(&self) -> Lane {
        self.from
    }

    /// Lane of the output elements.
    pub fn to_lane(&self) -> Lane {
        self.to
    }

    /// Applies the transformation.
    pub fn apply(&self, element: Element) -> Result<Element> {
        (self.apply)(element)
    }
}

impl PartialEq for ElementMapper {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && Arc::ptr_eq(&self.apply, &other.apply)
    }
}

/// A one-to-many transformation.
#[derive(Clone)]
pub struct ElementFlatMapper {
    from: Lane,
    to: Lane,
    apply: Arc<dyn Fn(Element) -> Result<ElementIter> + Send + Sync>,
}

impl ElementFlatMapper {
    /// Erases `f: T -> impl IntoIterator<Item = R>`.
    pub fn new<T, R, I, F>(f: F) -> Self
    where
        T: 'static,
        R: Send + 'static,
        I: IntoIterator<Item = R>,
        I::IntoIter: Send + 'static,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        Self {
            from: Lane::of::<T>(),
            to: Lane::of::<R>(),
            apply: Arc::new(move |e: Element| {
                let value = e.into_value::<T>()?;
                let iter: ElementIter = Box::new(f(value).into_iter().map(Element::wrap));
                Ok(iter)
            }),
        }
    }

    /// Lane of the input elements.
    pub fn from_lane(&self) -> Lane {
        self.from
    }

    /// Lane of the produced elements.
    pub fn to_lane(&self) -> Lane {
        self.to
    }

    /// Expands one element.
    pub fn apply(&self, element: Element) -> Result<ElementIter> {
        (self.apply)(element)
    }
}

impl PartialEq for ElementFlatMapper {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && Arc::ptr_eq(&self.apply, &other.apply)
    }
}

/// An ordering of elements of one lane.
#[derive(Clone)]
pub struct ElementOrder {
    lane: Lane,
    compare: Arc<dyn Fn(&Element, &Element) -> Ordering + Send + Sync>,
    natural: bool,
    descriptor: Option<ComparatorDescriptor>,
}

impl ElementOrder {
    /// The natural (total) order of `T`.
    pub fn natural<T: Orderable>() -> Self {
        Self {
            lane: Lane::of::<T>(),
            compare: Arc::new(|a: &Element, b: &Element| {
                match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                    (Some(a), Some(b)) => Orderable::compare(a, b),
                    _ => Ordering::Equal,
                }
            }),
            natural: true,
            descriptor: None,
        }
    }

    /// Erases a comparator over `T`. Field comparators keep their descriptor.
    pub fn new<T, C>(comparator: C) -> Self
    where
        T: 'static,
        C: EntityComparator<T> + 'static,
    {
        let descriptor = comparator.describe();
        Self {
            lane: Lane::of::<T>(),
            compare: Arc::new(move |a: &Element, b: &Element| {
                match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                    (Some(a), Some(b)) => EntityComparator::compare(&comparator, a, b),
                    _ => Ordering::Equal,
                }
            }),
            natural: false,
            descriptor,
        }
    }

    /// Lane of the compared elements.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Compares two elements.
    pub fn compare(&self, a: &Element, b: &Element) -> Ordering {
        (self.compare)(a, b)
    }

    /// Whether this is the natural order rather than a comparator.
    pub fn is_natural(&self) -> bool {
        self.natural
    }

    /// Description of the underlying field comparator, if any.
    pub fn descriptor(&self) -> Option<&ComparatorDescriptor> {
        self.descriptor.as_ref()
    }
}

impl PartialEq for ElementOrder {
    fn eq(&self, other: &Self) -> bool {
        self.lane == other.lane
            && self.natural == other.natural
            && Arc::ptr_eq(&self.compare, &other.compare)
    }
}

/// Removes repeated elements from a sequence, keeping the first occurrence.
#[derive(Clone)]
pub struct ElementDedup {
    lane: Lane,
    apply: Arc<dyn Fn(ElementIter) -> ElementIter + Send + Sync>,
}

impl ElementDedup {
    /// Deduplicates by value equality of `T`.
    pub fn new<T>() -> Self
    where
        T: Eq + Hash + Clone + Send + 'static,
    {
        Self::by_key(|v: &T| v.clone())
    }

    /// Deduplicates by a derived key, e.g. `f64::to_bits` for doubles.
    pub fn by_key<T, K, F>(key: F) -> Self
    where
        T: 'static,
        K: Eq + Hash + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        Self {
            lane: Lane::of::<T>(),
            apply: Arc::new(move |iter: ElementIter| {
                let key = Arc::clone(&key);
                let mut seen = HashSet::new();
                let deduped: ElementIter = Box::new(iter.filter(move |e| {
                    e.downcast_ref::<T>().map_or(true, |v| seen.insert((*key)(v)))
                }));
                deduped
            }),
        }
    }

    /// Lane of the deduplicated elements.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Wraps `iter` in a lazy deduplicating stage.
    pub fn apply(&self, iter: ElementIter) -> ElementIter {
        (self.apply)(iter)
    }
}

impl PartialEq for ElementDedup {
    fn eq(&self, other: &Self) -> bool {
        self.lane == other.lane && Arc::ptr_eq(&self.apply, &other.apply)
    }
}

/// A side effect observing elements without consuming them (`peek`).
#[derive(Clone)]
pub struct ElementAction {
    lane: Lane,
    run: Arc<dyn Fn(&Element) + Send + Sync>,
}

impl ElementAction {
    /// Erases `f: &T -> ()`.
    pub fn new<T, F>(f: F) -> Self
    where
        T: 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            lane: Lane::of::<T>(),
            run: Arc::new(move |e: &Element| {
                if let Some(v) = e.downcast_ref::<T>() {
                    f(v)
                }
            }),
        }
    }

    /// Lane of the observed elements.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Runs the action.
    pub fn run(&self, element: &Element) {
        (self.run)(element)
    }
}

impl PartialEq for ElementAction {
    fn eq(&self, other: &Self) -> bool {
        self.lane == other.lane && Arc::ptr_eq(&self.run, &other.run)
    }
}

/// A terminal consumer taking ownership of each element (`for_each`).
#[derive(Clone)]
pub struct ElementConsumer {
    lane: Lane,
    accept: Arc<dyn Fn(Element) -> Result<()> + Send + Sync>,
}

impl ElementConsumer {
    /// Erases `f: T -> ()`.
    pub fn new<T, F>(f: F) -> Self
    where
        T: 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            lane: Lane::of::<T>(),
            accept: Arc::new(move |e: Element| e.into_value::<T>().map(&f)),
        }
    }

    /// Lane of the consumed elements.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Hands one element to the consumer.
    pub fn accept(&self, element: Element) -> Result<()> {
        (self.accept)(element)
    }
}

impl PartialEq for ElementConsumer {
    fn eq(&self, other: &Self) -> bool {
        self.lane == other.lane && Arc::ptr_eq(&self.accept, &other.accept)
    }
}

/// An associative binary operator plus optional identity, for `reduce`.
#[derive(Clone)]
pub struct ElementCombiner {
    lane: Lane,
    identity: Option<Arc<dyn Fn() -> Element + Send + Sync>>,
    combine: Arc<dyn Fn(Element, Element) -> Result<Element> + Send + Sync>,
}

impl ElementCombiner {
    /// Erases `f: (T, T) -> T`; `identity` seeds the reduction if given.
    pub fn new<T, F>(identity: Option<T>, f: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let identity = identity.map(|seed| {
            let supplier: Arc<dyn Fn() -> Element + Send + Sync> =
                Arc::new(move || Element::wrap(seed.clone()));
            supplier
        });
        Self {
            lane: Lane::of::<T>(),
            identity,
            combine: Arc::new(move |a: Element, b: Element| {
                Ok(Element::wrap(f(a.into_value::<T>()?, b.into_value::<T>()?)))
            }),
        }
    }

    /// Lane of the combined elements.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// A fresh copy of the identity, if one was given.
    pub fn identity(&self) -> Option<Element> {
        self.identity.as_ref().map(|supplier| supplier())
    }

    /// Whether the reduction has an identity.
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Combines two partial results.
    pub fn combine(&self, a: Element, b: Element) -> Result<Element> {
        (self.combine)(a, b)
    }
}

impl PartialEq for ElementCombiner {
    fn eq(&self, other: &Self) -> bool {
        self.lane == other.lane
            && self.identity.is_some() == other.identity.is_some()
            && Arc::ptr_eq(&self.combine, &other.combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldstream_core::Field;

    #[derive(Debug, Clone, PartialEq)]
    struct Film {
        id: i64,
        length: i32,
    }

    #[test]
    fn test_predicate_keeps_descriptor() {
        let length = Field::new("film", "length", |f: &Film| f.length).unwrap();
        let p = ElementPredicate::new::<Film, _>(length.greater_than(100));
        assert_eq!(p.lane(), Lane::of::<Film>());
        assert!(p.test(&Element::wrap(Film { id: 1, length: 120 })));
        assert!(!p.test(&Element::wrap(Film { id: 1, length: 80 })));
        assert!(!p.test(&Element::wrap(7i32)));
        assert_eq!(p.to_string(), "length > 100");

        let q = ElementPredicate::new::<i32, _>(|v: &i32| *v > 3);
        assert_eq!(q.lane(), Lane::Int);
        assert!(q.descriptor().is_none());
        assert_eq!(q.to_string(), "<fn int>");
    }

    #[test]
    fn test_mapper_changes_lane() {
        let m = ElementMapper::new(|f: Film| f.length);
        assert_eq!(m.from_lane(), Lane::of::<Film>());
        assert_eq!(m.to_lane(), Lane::Int);
        let out = m.apply(Element::wrap(Film { id: 1, length: 95 })).unwrap();
        assert_eq!(out.as_int(), Some(95));
        assert!(m.apply(Element::wrap(1.0f64)).is_err());
    }

    #[test]
    fn test_flat_mapper() {
        let m = ElementFlatMapper::new(|n: i32| 0..n);
        let out: Vec<i32> = m
            .apply(Element::wrap(3i32))
            .unwrap()
            .filter_map(|e| e.as_int())
            .collect();
        assert_eq!(out, vec![0, 1, 2]);
    }

    #[test]
    fn test_dedup_keeps_first() {
        let d = ElementDedup::by_key(|v: &f64| v.to_bits());
        let input: ElementIter = Box::new([1.0, 2.0, 1.0, 3.0, 2.0].into_iter().map(Element::wrap));
        let out: Vec<f64> = d.apply(input).filter_map(|e| e.as_double()).collect();
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_combiner_identity() {
        let c = ElementCombiner::new(Some(0i64), |a: i64, b: i64| a + b);
        let seed = c.identity().unwrap();
        let sum = c.combine(seed, Element::wrap(5i64)).unwrap();
        assert_eq!(sum.as_long(), Some(5));
        assert!(ElementCombiner::new(None, |a: i32, _b: i32| a).identity().is_none());
    }

    #[test]
    fn test_identity_equality() {
        let a = ElementOrder::natural::<i64>();
        let b = a.clone();
        assert!(a == b);
        assert!(a != ElementOrder::natural::<i64>());
    }
}
