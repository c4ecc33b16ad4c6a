//! Element lanes and type-erased pipeline elements.
//!
//! A pipeline is built over a chain of element types that is only known
//! at run time. Each stage of the chain is in exactly one [`Lane`]: one of
//! the three numeric lanes (`i32`, `i64`, `f64`) or the reference lane of
//! a concrete Rust type. Elements travelling through a pipeline are
//! carried as [`Element`] values, which unwrap back to the static type at
//! the end of execution.

use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a reference-lane element type.
#[derive(Debug, Clone, Copy)]
pub struct RefType {
    id: TypeId,
    name: &'static str,
}

impl RefType {
    /// Type identity of `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Full Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base_len = self.name.find('<').unwrap_or(self.name.len());
        match self.name[..base_len].rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for RefType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RefType {}

impl Hash for RefType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The element kind a pipeline currently operates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Arbitrary (non primitive-lane) values of one Rust type
    Reference(RefType),
    /// `i32` values
    Int,
    /// `i64` values
    Long,
    /// `f64` values
    Double,
}

impl Lane {
    /// The lane that values of type `T` travel in.
    pub fn of<T: 'static>() -> Self {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<i32>() {
            Lane::Int
        } else if id == TypeId::of::<i64>() {
            Lane::Long
        } else if id == TypeId::of::<f64>() {
            Lane::Double
        } else {
            Lane::Reference(RefType::of::<T>())
        }
    }

    /// Whether this is one of the primitive numeric lanes.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Lane::Reference(_))
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Reference(ty) => write!(f, "reference<{}>", ty.short_name()),
            Lane::Int => write!(f, "int"),
            Lane::Long => write!(f, "long"),
            Lane::Double => write!(f, "double"),
        }
    }
}

/// A boxed reference-lane value together with its lane.
pub struct RefElement {
    lane: Lane,
    value: Box<dyn Any + Send>,
}

/// A single type-erased value flowing through a pipeline.
pub enum Element {
    /// A value of the reference lane
    Ref(RefElement),
    /// A value of the int lane
    Int(i32),
    /// A value of the long lane
    Long(i64),
    /// A value of the double lane
    Double(f64),
}

impl Element {
    /// Erases `value`, placing it in the lane of `T`.
    pub fn wrap<T: Send + 'static>(value: T) -> Self {
        let boxed: Box<dyn Any + Send> = Box::new(value);
        let boxed = match boxed.downcast::<i32>() {
            Ok(v) => return Element::Int(*v),
            Err(other) => other,
        };
        let boxed = match boxed.downcast::<i64>() {
            Ok(v) => return Element::Long(*v),
            Err(other) => other,
        };
        match boxed.downcast::<f64>() {
            Ok(v) => Element::Double(*v),
            Err(other) => Element::Ref(RefElement {
                lane: Lane::of::<T>(),
                value: other,
            }),
        }
    }

    /// Recovers the static value, failing if the element is in another lane.
    pub fn into_value<T: 'static>(self) -> Result<T> {
        let actual = self.lane();
        let boxed: Box<dyn Any + Send> = match self {
            Element::Ref(r) => r.value,
            Element::Int(v) => Box::new(v),
            Element::Long(v) => Box::new(v),
            Element::Double(v) => Box::new(v),
        };
        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| Error::LaneMismatch {
                expected: Lane::of::<T>(),
                actual,
            })
    }

    /// Borrows the static value if the element is in the lane of `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Element::Ref(r) => r.value.downcast_ref::<T>(),
            Element::Int(v) => (v as &dyn Any).downcast_ref::<T>(),
            Element::Long(v) => (v as &dyn Any).downcast_ref::<T>(),
            Element::Double(v) => (v as &dyn Any).downcast_ref::<T>(),
        }
    }

    /// The lane this element travels in.
    pub fn lane(&self) -> Lane {
        match self {
            Element::Ref(r) => r.lane,
            Element::Int(_) => Lane::Int,
            Element::Long(_) => Lane::Long,
            Element::Double(_) => Lane::Double,
        }
    }

    /// The int-lane value, if this is one.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Element::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The long-lane value, if this is one.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Element::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The double-lane value, if this is one.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Element::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Ref(r) => write!(f, "Ref({})", r.lane),
            Element::Int(v) => write!(f, "Int({})", v),
            Element::Long(v) => write!(f, "Long({})", v),
            Element::Double(v) => write!(f, "Double({})", v),
        }
    }
}
