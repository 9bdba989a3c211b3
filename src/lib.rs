//! Declare a configuration schema once, then validate and normalize
//! loosely-typed configuration trees against it.
//!
//! ```ignore
//! let schema = Schema::builder()
//!     .property("name", Property::new().of_type("string").required())
//!     .property("age", Property::new().of_type("number").default(0))
//!     .build()?;
//!
//! let config = schema.normalize(&json!({"name": "Bob"}).into())?;
//! ```
//!
//! A schema is built from an ordered [`Definition`]: property names mapped to
//! [`Property`] option records. Building checks the definition itself, so a
//! property that is both `required` and has a `default`, or names a type that
//! does not exist, fails before any configuration is ever looked at. Once
//! built, a [`Schema`] is immutable, cheap to clone, and safe to share across
//! threads.
//!
//! # Properties
//!
//! Every option is optional:
//!
//! - **`required()`**: the key must be present. Incompatible with a default.
//! - **`default(value)`**: used when the key is absent. Defaults are copied,
//!   so mutating a normalized result never touches the schema.
//! - **`of_type(..)`**: a primitive kind (`"number"`, `"string"`, ...), the
//!   capitalized wrapper names (`"Number"`), `"Array"`, or a
//!   [`NominalType`] identity check such as `NominalType::of::<Dog>()`.
//! - **`validate(..)`**: a check on the value alone. Returning `false` fails
//!   with the property's help text; returning a string fails with that
//!   string.
//! - **`validate_with(..)`**: a cross-field check that also receives every
//!   resolved sibling value. These run after all single-property checks.
//! - **`transform(..)`**: maps the value during normalization.
//! - **`help(..)`**: guidance appended to error messages; fixed text or
//!   computed from the offending value.
//! - **`schema(..)`**: a nested schema. Combined with `of_type("Array")`
//!   the value is a list and every element is checked against it.
//!
//! # Validation
//!
//! [`Schema::errors`] never stops at the first problem. Properties are
//! checked in declaration order; then cross-field validators run, each
//! exactly once, against the complete set of values (defaults included).
//! Errors inside nested schemas are grouped under the parent property and
//! name the full path:
//!
//! ```text
//! Configuration has one or more errors for property: relatives[2]
//!   Invalid configuration value for property: relatives[2].age. This must be a non-negative number. Received: -1
//! ```
//!
//! [`Schema::validate`] turns a non-empty list into
//! [`SchemaError::ConfigurationInvalid`]; [`Schema::is_valid`] is the
//! boolean form.
//!
//! # Normalization
//!
//! [`Schema::normalize`] validates, then builds a fresh [`Map`] containing
//! only declared properties: given values and defaults are copied, nested
//! schemas are normalized recursively, and transforms run last, in
//! declaration order, each seeing the result built so far. Undeclared keys
//! are dropped.
//!
//! # Values
//!
//! [`Value`] is the dynamic tree being checked. Arrays and objects are
//! shared handles, so a tree can contain the same object twice or even
//! contain itself. [`deep_copy`] preserves that shape: shared containers stay
//! shared in the copy and cycles are reproduced, while [`Instance`]s,
//! functions and symbols are passed through by reference. `Value` converts
//! from `serde_json::Value` and `toml::Value` and implements serde's
//! `Serialize`/`Deserialize`.
//!
//! # Error handling
//!
//! All fallible operations return [`SchemaError`]. With the `rich-errors`
//! feature it also implements `miette::Diagnostic`.
//!
//! # Logging
//!
//! The crate emits `tracing` events (`debug` on schema construction and
//! rejected configurations, `trace` on normalization) and never installs a
//! subscriber.

pub mod error;
pub mod types;

mod builder;
mod copy;
mod message;
mod property;
mod schema;
mod value;

#[cfg(test)]
mod fixtures;

pub use builder::SchemaBuilder;
pub use copy::{DeepCopy, deep_copy};
pub use error::SchemaError;
pub use property::{
    Definition, Help, NestedSchema, Property, PropertyDescriptor, Transform, Validator, Verdict,
};
pub use schema::Schema;
pub use types::{NominalType, PrimitiveKind, TypeConstraint, TypeSpec};
pub use value::{Array, Function, Instance, Map, Object, Symbol, Value};
