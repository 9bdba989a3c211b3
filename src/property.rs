//! Per-property rules.
//!
//! [`Property`] is the declarative option record a schema author writes.
//! [`PropertyDescriptor`] is what a [`Schema`] builds from it: the checked,
//! immutable rule set for one key.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::builder::SchemaBuilder;
use crate::copy::DeepCopy;
use crate::error::SchemaError;
use crate::message;
use crate::schema::Schema;
use crate::types::{PrimitiveKind, TypeConstraint, TypeSpec};
use crate::value::{Map, Value};

/// Ordered property name → options. The source a [`Schema`] is built from.
pub type Definition = IndexMap<String, Property>;

/// Outcome of a validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Invalid; the message uses the property's help text.
    Invalid,
    /// Invalid; the message uses this reason verbatim.
    Reason(String),
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid { Verdict::Valid } else { Verdict::Invalid }
    }
}

impl From<String> for Verdict {
    fn from(reason: String) -> Self {
        Verdict::Reason(reason)
    }
}

impl From<&str> for Verdict {
    fn from(reason: &str) -> Self {
        Verdict::Reason(reason.to_string())
    }
}

impl From<Option<String>> for Verdict {
    fn from(reason: Option<String>) -> Self {
        reason.map_or(Verdict::Valid, Verdict::Reason)
    }
}

impl From<Result<(), String>> for Verdict {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Verdict::Valid,
            Err(reason) => Verdict::Reason(reason),
        }
    }
}

type SingleCheck = dyn Fn(&Value) -> Verdict + Send + Sync;
type CrossCheck = dyn Fn(&Value, &Map) -> Verdict + Send + Sync;

/// A property validator.
///
/// `Single` validators see only the property's own value and run while each
/// property is checked. `CrossField` validators also receive every resolved
/// sibling value and run after all properties have been checked.
#[derive(Clone)]
pub enum Validator {
    Single(Arc<SingleCheck>),
    CrossField(Arc<CrossCheck>),
}

impl Validator {
    pub fn single<F, R>(check: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Validator::Single(Arc::new(move |value: &Value| -> Verdict {
            check(value).into()
        }))
    }

    pub fn cross_field<F, R>(check: F) -> Self
    where
        F: Fn(&Value, &Map) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Validator::CrossField(Arc::new(move |value: &Value, values: &Map| -> Verdict {
            check(value, values).into()
        }))
    }

    pub fn is_cross_field(&self) -> bool {
        matches!(self, Validator::CrossField(_))
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Single(_) => f.write_str("Validator::Single"),
            Validator::CrossField(_) => f.write_str("Validator::CrossField"),
        }
    }
}

type TransformFn = dyn Fn(Value, &Map) -> Value + Send + Sync;

/// Maps a validated value to its normalized form. Receives the value and the
/// normalized result built so far.
#[derive(Clone)]
pub struct Transform(Arc<TransformFn>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Transform(Arc::new(move |value: Value, _: &Map| f(value)))
    }

    pub fn with_values<F>(f: F) -> Self
    where
        F: Fn(Value, &Map) -> Value + Send + Sync + 'static,
    {
        Transform(Arc::new(f))
    }

    pub fn apply(&self, value: Value, values: &Map) -> Value {
        (self.0)(value, values)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform")
    }
}

/// Guidance appended to error messages: fixed text, or text computed from
/// the offending value.
#[derive(Clone)]
pub enum Help {
    Text(String),
    Computed(Arc<dyn Fn(&Value) -> String + Send + Sync>),
}

impl Help {
    pub fn render(&self, value: &Value) -> String {
        match self {
            Help::Text(text) => text.clone(),
            Help::Computed(f) => f(value),
        }
    }
}

impl From<&str> for Help {
    fn from(text: &str) -> Self {
        Help::Text(text.to_string())
    }
}

impl From<String> for Help {
    fn from(text: String) -> Self {
        Help::Text(text)
    }
}

impl fmt::Debug for Help {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Help::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Help::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// A nested schema: either a definition to build, or a schema already built.
#[derive(Debug, Clone)]
pub enum NestedSchema {
    Definition(Definition),
    Schema(Schema),
}

impl From<Definition> for NestedSchema {
    fn from(definition: Definition) -> Self {
        NestedSchema::Definition(definition)
    }
}

impl From<Schema> for NestedSchema {
    fn from(schema: Schema) -> Self {
        NestedSchema::Schema(schema)
    }
}

impl From<&Schema> for NestedSchema {
    fn from(schema: &Schema) -> Self {
        NestedSchema::Schema(schema.clone())
    }
}

impl From<SchemaBuilder> for NestedSchema {
    fn from(builder: SchemaBuilder) -> Self {
        NestedSchema::Definition(builder.into_definition())
    }
}

/// Options for one property. Every option is optional.
///
/// ```ignore
/// Property::new()
///     .of_type("number")
///     .default(0)
///     .help("This must be a non-negative number.")
///     .validate(|v| v.as_f64().is_some_and(|n| n >= 0.0))
///     .transform(|v| v.as_f64().map_or(v, |n| n.round().into()))
/// ```
#[derive(Debug, Clone, Default)]
pub struct Property {
    default: Option<Value>,
    help: Option<Help>,
    required: bool,
    transform: Option<Transform>,
    type_spec: Option<TypeSpec>,
    validator: Option<Validator>,
    schema: Option<NestedSchema>,
}

impl Property {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Value used when the property is absent. Copied, never shared.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, help: impl Into<Help>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Help text computed from the offending value.
    pub fn help_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.help = Some(Help::Computed(Arc::new(f)));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }

    /// Transform that also sees the normalized result built so far.
    pub fn transform_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &Map) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::with_values(f));
        self
    }

    /// Type constraint: a kind name (`"number"`, `"Number"`, `"Array"`), a
    /// [`PrimitiveKind`], a [`TypeConstraint`] or a
    /// [`NominalType`](crate::NominalType).
    pub fn of_type(mut self, spec: impl Into<TypeSpec>) -> Self {
        self.type_spec = Some(spec.into());
        self
    }

    /// Validator run on the value alone.
    pub fn validate<F, R>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        self.validator = Some(Validator::single(check));
        self
    }

    /// Validator run after every property has been checked, with access to
    /// all resolved values.
    pub fn validate_with<F, R>(mut self, check: F) -> Self
    where
        F: Fn(&Value, &Map) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        self.validator = Some(Validator::cross_field(check));
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn schema(mut self, schema: impl Into<NestedSchema>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn nested_schema(&self) -> Option<&NestedSchema> {
        self.schema.as_ref()
    }

    /// Copy of this record whose defaults share nothing with the original.
    pub(crate) fn snapshot(&self, copier: &mut DeepCopy) -> Property {
        Property {
            default: self.default.as_ref().map(|d| copier.copy(d)),
            schema: self.schema.as_ref().map(|nested| match nested {
                NestedSchema::Definition(definition) => NestedSchema::Definition(
                    definition
                        .iter()
                        .map(|(name, property)| (name.clone(), property.snapshot(copier)))
                        .collect(),
                ),
                NestedSchema::Schema(schema) => NestedSchema::Schema(schema.clone()),
            }),
            ..self.clone()
        }
    }
}

/// The checked rule set for one property of a [`Schema`].
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    required: bool,
    default: Option<Value>,
    type_constraint: Option<TypeConstraint>,
    validator: Option<Validator>,
    transform: Option<Transform>,
    help: Option<Help>,
    schema: Option<Schema>,
}

impl PropertyDescriptor {
    /// Check `options` and build the descriptor for property `name`.
    pub fn new(name: impl Into<String>, options: &Property) -> Result<Self, SchemaError> {
        let name = name.into();

        if options.required && options.default.is_some() {
            return Err(SchemaError::InvalidDefinition { property: name });
        }

        let type_constraint = match &options.type_spec {
            None => None,
            Some(TypeSpec::Constraint(constraint)) => Some(constraint.clone()),
            Some(TypeSpec::Named(type_name)) => Some(
                TypeConstraint::from_name(type_name).ok_or_else(|| {
                    SchemaError::InvalidOptionType {
                        property: name.clone(),
                        option: "type",
                        reason: format!(
                            "Expected one of: {}. Received: {type_name}",
                            PrimitiveKind::ALL.map(PrimitiveKind::as_str).join(", ")
                        ),
                    }
                })?,
            ),
        };

        let schema = match &options.schema {
            None => None,
            Some(NestedSchema::Schema(schema)) => Some(schema.clone()),
            Some(NestedSchema::Definition(definition)) => Some(Schema::new(definition)?),
        };

        if schema.is_some()
            && let Some(TypeConstraint::Primitive(kind)) = &type_constraint
            && *kind != PrimitiveKind::Object
        {
            return Err(SchemaError::InvalidOptionType {
                property: name,
                option: "schema",
                reason: format!(
                    "A nested schema needs an object or array value, but the type is {kind}."
                ),
            });
        }

        let mut copier = DeepCopy::new();
        Ok(PropertyDescriptor {
            default: options.default.as_ref().map(|d| copier.copy(d)),
            required: options.required,
            validator: options.validator.clone(),
            transform: options.transform.clone(),
            help: options.help.clone(),
            name,
            type_constraint,
            schema,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn type_constraint(&self) -> Option<&TypeConstraint> {
        self.type_constraint.as_ref()
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Whether this property's validator runs in the cross-field pass.
    pub fn is_cross_field(&self) -> bool {
        self.validator.as_ref().is_some_and(Validator::is_cross_field)
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn help(&self) -> Option<&Help> {
        self.help.as_ref()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Array values are validated element by element against the nested
    /// schema.
    pub fn is_array_of_schema(&self) -> bool {
        self.schema.is_some() && matches!(self.type_constraint, Some(TypeConstraint::Array))
    }

    /// Check a single value: type first, then a single-value validator.
    /// Cross-field validators are not run here.
    pub fn error(&self, value: &Value) -> Option<String> {
        self.error_at(&self.name, value)
    }

    /// [`error`](Self::error), reporting the property as `label`.
    pub(crate) fn error_at(&self, label: &str, value: &Value) -> Option<String> {
        if let Some(constraint) = &self.type_constraint
            && !constraint.matches(value)
        {
            return Some(message::invalid_type(label, constraint, value));
        }
        match &self.validator {
            Some(Validator::Single(check)) => self.judge(label, value, check(value)),
            _ => None,
        }
    }

    /// Run the cross-field validator, if any.
    pub(crate) fn cross_check(&self, label: &str, value: &Value, values: &Map) -> Option<String> {
        match &self.validator {
            Some(Validator::CrossField(check)) => self.judge(label, value, check(value, values)),
            _ => None,
        }
    }

    pub(crate) fn help_text(&self, value: &Value) -> Option<String> {
        self.help.as_ref().map(|help| help.render(value))
    }

    fn judge(&self, label: &str, value: &Value, verdict: Verdict) -> Option<String> {
        match verdict {
            Verdict::Valid => None,
            Verdict::Invalid => Some(message::invalid_value(
                label,
                self.help_text(value).as_deref(),
                value,
            )),
            Verdict::Reason(reason) => Some(message::invalid_value(label, Some(&reason), value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NominalType;
    use crate::value::Instance;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn build(options: Property) -> PropertyDescriptor {
        PropertyDescriptor::new("prop", &options).unwrap()
    }

    #[test]
    fn does_not_require_any_options() {
        let descriptor = build(Property::new());
        assert!(!descriptor.required());
        assert!(!descriptor.has_default());
        assert!(descriptor.error(&Value::from("anything")).is_none());
    }

    #[test]
    fn cannot_have_default_and_required() {
        let err = PropertyDescriptor::new("prop", &Property::new().default(1).required())
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition { ref property } if property == "prop"));
    }

    #[test]
    fn default_or_required_alone_is_fine() {
        assert!(build(Property::new().default(1)).has_default());
        assert!(build(Property::new().required()).required());
    }

    #[test]
    fn type_can_be_a_kind_name() {
        let descriptor = build(Property::new().of_type("number"));
        assert!(matches!(
            descriptor.type_constraint(),
            Some(TypeConstraint::Primitive(PrimitiveKind::Number))
        ));
    }

    #[test]
    fn type_cannot_be_an_arbitrary_name() {
        let err = PropertyDescriptor::new("prop", &Property::new().of_type("integer")).unwrap_err();
        match err {
            SchemaError::InvalidOptionType { option, reason, .. } => {
                assert_eq!(option, "type");
                assert!(reason.contains("integer"));
                assert!(reason.contains("boolean, function, number, string, symbol, object"));
            }
            other => panic!("Expected InvalidOptionType, got: {other:?}"),
        }
    }

    #[test]
    fn wrapper_type_names_canonicalize() {
        for (name, kind) in [
            ("Boolean", PrimitiveKind::Boolean),
            ("Function", PrimitiveKind::Function),
            ("Number", PrimitiveKind::Number),
            ("String", PrimitiveKind::String),
            ("Symbol", PrimitiveKind::Symbol),
            ("Object", PrimitiveKind::Object),
        ] {
            let descriptor = build(Property::new().of_type(name));
            assert!(
                matches!(descriptor.type_constraint(), Some(TypeConstraint::Primitive(k)) if *k == kind),
                "{name} did not canonicalize"
            );
        }
    }

    #[test]
    fn nested_schema_rejects_scalar_type() {
        let mut definition = Definition::new();
        definition.insert("x".into(), Property::new());
        let err = PropertyDescriptor::new(
            "prop",
            &Property::new().of_type("number").schema(definition),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOptionType { option: "schema", .. }));
    }

    #[test]
    fn nested_definition_errors_propagate() {
        let mut definition = Definition::new();
        definition.insert("inner".into(), Property::new().required().default(0));
        let err = PropertyDescriptor::new("prop", &Property::new().schema(definition)).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition { ref property } if property == "inner"));
    }

    #[test]
    fn array_of_schema_needs_array_type_and_schema() {
        let mut definition = Definition::new();
        definition.insert("x".into(), Property::new());
        let descriptor = build(Property::new().of_type("Array").schema(definition.clone()));
        assert!(descriptor.is_array_of_schema());
        assert!(!build(Property::new().schema(definition)).is_array_of_schema());
        assert!(!build(Property::new().of_type("Array")).is_array_of_schema());
    }

    #[test]
    fn no_errors() {
        let descriptor = build(Property::new().of_type("string").validate(|v| {
            v.as_str().is_some_and(|s| !s.is_empty())
        }));
        assert!(descriptor.error(&Value::from("Bob")).is_none());
    }

    #[test]
    fn type_error() {
        let descriptor = build(Property::new().of_type("string"));
        let msg = descriptor.error(&Value::from(123)).unwrap();
        assert!(msg.contains("prop"));
        assert!(msg.contains("Expected a string"));
        assert!(msg.contains("Received: 123"));
    }

    #[test]
    fn nominal_type_error_names_instance_types() {
        struct Dog;
        struct Person;
        let descriptor = build(Property::new().of_type(NominalType::of::<Dog>()));
        assert!(descriptor.error(&Value::Instance(Instance::new(Dog))).is_none());
        let msg = descriptor
            .error(&Value::Instance(Instance::new(Person)))
            .unwrap();
        assert!(msg.contains("Expected an instance of Dog. Received: an instance of Person"));
    }

    #[test]
    fn validate_false_uses_help() {
        let descriptor = build(
            Property::new()
                .help("Must be positive.")
                .validate(|v| v.as_f64().is_some_and(|n| n > 0.0)),
        );
        let msg = descriptor.error(&Value::from(-1)).unwrap();
        assert_eq!(
            msg,
            "Invalid configuration value for property: prop. Must be positive. Received: -1"
        );
    }

    #[test]
    fn validate_string_is_used_verbatim() {
        let descriptor = build(
            Property::new()
                .help("ignored")
                .validate(|_| "Too spicy."),
        );
        let msg = descriptor.error(&Value::from("x")).unwrap();
        assert!(msg.contains("Too spicy."));
        assert!(!msg.contains("ignored"));
    }

    #[test]
    fn validator_skipped_after_type_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let descriptor = build(Property::new().of_type("number").validate(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));
        assert!(descriptor.error(&Value::from("x")).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cross_field_validator_is_deferred() {
        let descriptor = build(Property::new().validate_with(|_, _| false));
        assert!(descriptor.is_cross_field());
        assert!(descriptor.error(&Value::from(1)).is_none());
        assert!(
            descriptor
                .cross_check("prop", &Value::from(1), &Map::new())
                .is_some()
        );
    }

    #[test]
    fn computed_help_sees_the_value() {
        let descriptor = build(
            Property::new()
                .help_with(|v| format!("{} is not allowed.", message::describe(v)))
                .validate(|_| false),
        );
        let msg = descriptor.error(&Value::from(7)).unwrap();
        assert!(msg.contains("7 is not allowed."));
    }

    #[test]
    fn default_is_copied_from_the_definition() {
        let shared = Value::from(json!({"a": 1}));
        let descriptor = build(Property::new().default(shared.clone()));
        shared.as_object().unwrap().insert("b", Value::from(2));
        assert_eq!(descriptor.default(), Some(&Value::from(json!({"a": 1}))));
    }

    #[test]
    fn verdict_conversions() {
        assert_eq!(Verdict::from(true), Verdict::Valid);
        assert_eq!(Verdict::from(false), Verdict::Invalid);
        assert_eq!(Verdict::from("no"), Verdict::Reason("no".into()));
        assert_eq!(Verdict::from(None::<String>), Verdict::Valid);
        assert_eq!(Verdict::from(Err::<(), _>("bad".to_string())), Verdict::Reason("bad".into()));
    }
}
