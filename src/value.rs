//! Dynamic configuration values.
//!
//! Configuration trees are loosely typed, so they are modelled with a single
//! [`Value`] enum. Containers ([`Array`] and [`Object`]) are shared handles
//! with reference identity: cloning a handle aliases the same storage, which
//! is what lets a tree contain the same object twice, or contain itself.
//! [`deep_copy`](crate::deep_copy) is the way to get an independent tree.
//!
//! Handles never hold their lock across user code. Readers take a shallow
//! snapshot ([`Array::items`], [`Object::entries`]) and release the lock
//! before recursing, so cyclic structures cannot deadlock.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::types::PrimitiveKind;

/// An ordered key → value mapping. Insertion order is preserved.
pub type Map = IndexMap<String, Value>;

/// A loosely-typed configuration value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
    Function(Function),
    Array(Array),
    Object(Object),
    /// An arbitrary Rust value. Checked nominally, never copied structurally.
    Instance(Instance),
}

impl Value {
    /// Build an object value from key/value pairs.
    pub fn object<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Object::from_map(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build an array value from items.
    pub fn array<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::Array(Array::from_vec(items.into_iter().collect()))
    }

    /// The primitive kind of this value. `null`, arrays, objects and
    /// instances all report [`PrimitiveKind::Object`].
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Value::Bool(_) => PrimitiveKind::Boolean,
            Value::Number(_) => PrimitiveKind::Number,
            Value::String(_) => PrimitiveKind::String,
            Value::Symbol(_) => PrimitiveKind::Symbol,
            Value::Function(_) => PrimitiveKind::Function,
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Instance(_) => {
                PrimitiveKind::Object
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Identity comparison: containers, instances, functions and symbols are
    /// the same only if they share storage; primitives compare by value.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                false
            }
            (a, b) => a == b,
        }
    }
}

/// Structural equality. Containers compare element-wise; instances,
/// functions and symbols compare by identity. A pair of containers already
/// being compared further up counts as equal, so cyclic structures of the
/// same shape compare equal instead of recursing forever.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        structurally_equal(self, other, &mut Vec::new())
    }
}

fn structurally_equal(a: &Value, b: &Value, comparing: &mut Vec<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
        (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
        (Value::Array(a), Value::Array(b)) => {
            let pair = (a.addr(), b.addr());
            if a.ptr_eq(b) || comparing.contains(&pair) {
                return true;
            }
            let (left, right) = (a.items(), b.items());
            comparing.push(pair);
            let equal = left.len() == right.len()
                && left
                    .iter()
                    .zip(&right)
                    .all(|(x, y)| structurally_equal(x, y, comparing));
            comparing.pop();
            equal
        }
        (Value::Object(a), Value::Object(b)) => {
            let pair = (a.addr(), b.addr());
            if a.ptr_eq(b) || comparing.contains(&pair) {
                return true;
            }
            let (left, right) = (a.entries(), b.entries());
            comparing.push(pair);
            let equal = left.len() == right.len()
                && left.iter().all(|(key, x)| {
                    right
                        .get(key)
                        .is_some_and(|y| structurally_equal(x, y, comparing))
                });
            comparing.pop();
            equal
        }
        _ => false,
    }
}

/// Render a number the way configuration authors write it: `13`, `12.5`,
/// `NaN`, `Infinity`.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else {
        n.to_string()
    }
}

// -- Shared containers -------------------------------------------------------

/// A shared, growable list of values.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Array(Arc::new(RwLock::new(items)))
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.read().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.write().push(value);
    }

    /// Replace the item at `index`, returning the previous one. Out of range
    /// indexes leave the array untouched and return `None`.
    pub fn set(&self, index: usize, value: Value) -> Option<Value> {
        let mut items = self.write();
        items
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Shallow snapshot of the items. Nested containers stay shared.
    pub fn items(&self) -> Vec<Value> {
        self.read().clone()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Value>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A shared, insertion-ordered key/value structure.
#[derive(Clone, Default)]
pub struct Object(Arc<RwLock<Map>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map) -> Self {
        Object(Arc::new(RwLock::new(map)))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.write().insert(key.into(), value)
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Shallow snapshot of the entries. Nested containers stay shared.
    pub fn entries(&self) -> Map {
        self.read().clone()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    fn read(&self) -> RwLockReadGuard<'_, Map> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Map> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// -- Opaque values -------------------------------------------------------------

/// A Rust value embedded in a configuration tree, e.g. a `Duration` or a
/// handle to some service. Instances are matched by [`NominalType`](crate::NominalType)
/// and are passed through by reference when a tree is copied.
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wrap `value`, naming it after its Rust type (`Dog` for `my_app::Dog`).
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::named(short_type_name::<T>(), value)
    }

    /// Wrap `value` under an explicit type name used in error messages.
    pub fn named<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: T) -> Self {
        Instance {
            type_name: type_name.into(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// A unique token. Two symbols are equal only if they are the same symbol,
/// whatever their descriptions.
#[derive(Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Symbol(description.into())
    }

    pub fn description(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

type Callable = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A callable stored as configuration, e.g. a hook or a formatter.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<Callable>,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Function {
            name: name.into(),
            call: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.call)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

// -- Debug ---------------------------------------------------------------------

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ancestors = RefCell::new(Vec::new());
        let inspect = Inspect {
            value: self,
            ancestors: &ancestors,
        };
        fmt::Debug::fmt(&inspect, f)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Array(self.clone()), f)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Object(self.clone()), f)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ .. }}", self.type_name)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

/// Debug view that prints `[Circular]` instead of recursing into an
/// ancestor container.
struct Inspect<'a> {
    value: &'a Value,
    ancestors: &'a RefCell<Vec<usize>>,
}

impl Inspect<'_> {
    fn enter(&self, addr: usize) -> bool {
        let mut ancestors = self.ancestors.borrow_mut();
        if ancestors.contains(&addr) {
            return false;
        }
        ancestors.push(addr);
        true
    }

    fn leave(&self) {
        self.ancestors.borrow_mut().pop();
    }
}

impl fmt::Debug for Inspect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Symbol(s) => fmt::Debug::fmt(s, f),
            Value::Function(func) => fmt::Debug::fmt(func, f),
            Value::Instance(i) => fmt::Debug::fmt(i, f),
            Value::Array(array) => {
                if !self.enter(array.addr()) {
                    return f.write_str("[Circular]");
                }
                let items = array.items();
                let result = f
                    .debug_list()
                    .entries(items.iter().map(|value| Inspect {
                        value,
                        ancestors: self.ancestors,
                    }))
                    .finish();
                self.leave();
                result
            }
            Value::Object(object) => {
                if !self.enter(object.addr()) {
                    return f.write_str("[Circular]");
                }
                let entries = object.entries();
                let result = f
                    .debug_map()
                    .entries(entries.iter().map(|(key, value)| {
                        (
                            key,
                            Inspect {
                                value,
                                ancestors: self.ancestors,
                            },
                        )
                    }))
                    .finish();
                self.leave();
                result
            }
        }
    }
}

// -- Serde -----------------------------------------------------------------------

/// Serializes like JSON: integral numbers as integers, containers
/// recursively. Cycles, functions, symbols and instances have no data
/// representation and fail.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ancestors = RefCell::new(Vec::new());
        Guarded {
            value: self,
            ancestors: &ancestors,
        }
        .serialize(serializer)
    }
}

struct Guarded<'a> {
    value: &'a Value,
    ancestors: &'a RefCell<Vec<usize>>,
}

impl Guarded<'_> {
    fn enter<E: ser::Error>(&self, addr: usize) -> Result<(), E> {
        let mut ancestors = self.ancestors.borrow_mut();
        if ancestors.contains(&addr) {
            return Err(E::custom("cyclic structure cannot be serialized"));
        }
        ancestors.push(addr);
        Ok(())
    }

    fn leave(&self) {
        self.ancestors.borrow_mut().pop();
    }
}

impl Serialize for Guarded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Symbol(s) => Err(<S::Error as ser::Error>::custom(format_args!(
                "symbol {} cannot be serialized",
                s.description()
            ))),
            Value::Function(func) => Err(<S::Error as ser::Error>::custom(format_args!(
                "function {} cannot be serialized",
                func.name()
            ))),
            Value::Instance(i) => Err(<S::Error as ser::Error>::custom(format_args!(
                "instance of {} cannot be serialized",
                i.type_name()
            ))),
            Value::Array(array) => {
                self.enter::<S::Error>(array.addr())?;
                let items = array.items();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for value in &items {
                    seq.serialize_element(&Guarded {
                        value,
                        ancestors: self.ancestors,
                    })?;
                }
                self.leave();
                seq.end()
            }
            Value::Object(object) => {
                self.enter::<S::Error>(object.addr())?;
                let entries = object.entries();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in &entries {
                    map.serialize_entry(
                        key,
                        &Guarded {
                            value,
                            ancestors: self.ancestors,
                        },
                    )?;
                }
                self.leave();
                map.end()
            }
        }
    }
}

/// Largest integer an `f64` represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

// -- Conversions -------------------------------------------------------------------

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i as f64),
            toml::Value::Float(f) => Value::Number(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(d) => Value::String(d.to_string()),
            toml::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            toml::Value::Table(table) => {
                Value::object(table.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<toml::Table> for Value {
    fn from(table: toml::Table) -> Self {
        Value::from(toml::Value::Table(table))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

from_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(Object::from_map(map))
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
