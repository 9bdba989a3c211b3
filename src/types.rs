use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::value::{Value, short_type_name};

/// The primitive kinds a value can have, as reported by [`Value::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Function,
    Number,
    String,
    Symbol,
    /// Null, arrays, objects and instances.
    Object,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Function,
        PrimitiveKind::Number,
        PrimitiveKind::String,
        PrimitiveKind::Symbol,
        PrimitiveKind::Object,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Function => "function",
            PrimitiveKind::Number => "number",
            PrimitiveKind::String => "string",
            PrimitiveKind::Symbol => "symbol",
            PrimitiveKind::Object => "object",
        }
    }

    fn article(self) -> &'static str {
        match self {
            PrimitiveKind::Object => "an",
            _ => "a",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Check = dyn Fn(&Value) -> bool + Send + Sync;

/// A named identity check, the equivalent of "is an instance of X".
///
/// [`NominalType::of`] matches [`Value::Instance`]s wrapping a given Rust
/// type; [`NominalType::new`] accepts any predicate.
#[derive(Clone)]
pub struct NominalType {
    name: Arc<str>,
    check: Arc<Check>,
}

impl NominalType {
    pub fn new<F>(name: impl Into<Arc<str>>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        NominalType {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Matches instances wrapping a `T`.
    pub fn of<T: Any>() -> Self {
        Self::new(short_type_name::<T>(), |value| {
            value.as_instance().is_some_and(|i| i.is::<T>())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for NominalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NominalType").field(&self.name).finish()
    }
}

/// The type a property's value must have.
#[derive(Debug, Clone)]
pub enum TypeConstraint {
    /// The value's [`PrimitiveKind`] must equal this kind.
    Primitive(PrimitiveKind),
    /// The value must be an [`Array`](crate::Array).
    Array,
    /// The value must pass a nominal identity check.
    Nominal(NominalType),
}

impl TypeConstraint {
    /// Resolve a textual type name.
    ///
    /// Accepts the primitive kind names (`"number"`) and the capitalized
    /// wrapper names (`"Number"`), which canonicalize to the same kind.
    /// `"Array"` maps to [`TypeConstraint::Array`].
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "Array" {
            return Some(TypeConstraint::Array);
        }
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| name == kind.as_str() || name == capitalize(kind.as_str()))
            .map(TypeConstraint::Primitive)
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeConstraint::Primitive(kind) => value.kind() == *kind,
            TypeConstraint::Array => matches!(value, Value::Array(_)),
            TypeConstraint::Nominal(nominal) => nominal.matches(value),
        }
    }

    /// Describe the expected type: `a number`, `an instance of Dog`.
    pub fn expected(&self) -> String {
        match self {
            TypeConstraint::Primitive(kind) => format!("{} {kind}", kind.article()),
            TypeConstraint::Array => "an instance of Array".to_string(),
            TypeConstraint::Nominal(nominal) => format!("an instance of {}", nominal.name()),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

impl From<PrimitiveKind> for TypeConstraint {
    fn from(kind: PrimitiveKind) -> Self {
        TypeConstraint::Primitive(kind)
    }
}

impl From<NominalType> for TypeConstraint {
    fn from(nominal: NominalType) -> Self {
        TypeConstraint::Nominal(nominal)
    }
}

/// How a property declares its type: already resolved, or by name.
/// Names are checked when the schema is built.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Named(String),
    Constraint(TypeConstraint),
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::Named(name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        TypeSpec::Named(name)
    }
}

impl From<TypeConstraint> for TypeSpec {
    fn from(constraint: TypeConstraint) -> Self {
        TypeSpec::Constraint(constraint)
    }
}

impl From<PrimitiveKind> for TypeSpec {
    fn from(kind: PrimitiveKind) -> Self {
        TypeSpec::Constraint(TypeConstraint::Primitive(kind))
    }
}

impl From<NominalType> for TypeSpec {
    fn from(nominal: NominalType) -> Self {
        TypeSpec::Constraint(TypeConstraint::Nominal(nominal))
    }
}
