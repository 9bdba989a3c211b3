//! The schema engine: two-phase validation and normalization.
//!
//! `errors` walks the properties in declaration order. Phase one resolves
//! every value (given or defaulted), type-checks it, runs single-value
//! validators and recurses into nested schemas. Phase two runs the
//! cross-field validators, once each, against the complete set of resolved
//! values. Nothing short-circuits: every error at every level is collected.
//!
//! `normalize` validates, then copies values and defaults into a fresh
//! structure, recurses into nested schemas, and finally applies transforms
//! in declaration order.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::builder::SchemaBuilder;
use crate::copy::DeepCopy;
use crate::error::SchemaError;
use crate::message;
use crate::property::{Definition, PropertyDescriptor};
use crate::value::{Array, Map, Object, Value};

/// A set of property rules. Immutable once built and cheap to clone.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    properties: IndexMap<String, PropertyDescriptor>,
    definition: Definition,
}

impl Schema {
    /// Build a schema, checking the definition. Nested definitions are built
    /// recursively; the first invalid option aborts construction.
    pub fn new(definition: &Definition) -> Result<Self, SchemaError> {
        let mut properties = IndexMap::with_capacity(definition.len());
        for (name, options) in definition {
            properties.insert(name.clone(), PropertyDescriptor::new(name.clone(), options)?);
        }

        let mut copier = DeepCopy::new();
        let definition = definition
            .iter()
            .map(|(name, options)| (name.clone(), options.snapshot(&mut copier)))
            .collect();

        debug!(properties = properties.len(), "schema built");
        Ok(Schema {
            inner: Arc::new(SchemaInner {
                properties,
                definition,
            }),
        })
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Snapshot of the definition this schema was built from.
    pub fn definition(&self) -> &Definition {
        &self.inner.definition
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyDescriptor> {
        &self.inner.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.inner.properties.get(name)
    }

    /// Every problem with `configuration`, in a deterministic order: phase
    /// one errors in declaration order, then cross-field errors.
    ///
    /// `Null` is treated as an empty configuration. Defaults are checked and
    /// recursed into like given values, and a cross-field validator is
    /// skipped when its property already failed, nested errors included.
    pub fn errors(&self, configuration: &Value) -> Vec<String> {
        self.collect_errors(configuration, "")
    }

    pub fn is_valid(&self, configuration: &Value) -> bool {
        self.errors(configuration).is_empty()
    }

    /// Fail with [`SchemaError::ConfigurationInvalid`] if there are errors.
    pub fn validate(&self, configuration: &Value) -> Result<(), SchemaError> {
        let errors = self.errors(configuration);
        if errors.is_empty() {
            return Ok(());
        }
        debug!(errors = errors.len(), "configuration rejected");
        Err(SchemaError::ConfigurationInvalid { errors })
    }

    /// Validate `configuration` and produce its normalized form: declared
    /// properties only, defaults filled in, nested schemas normalized,
    /// transforms applied. The result shares no containers with the input or
    /// with the schema's defaults.
    pub fn normalize(&self, configuration: &Value) -> Result<Map, SchemaError> {
        self.validate(configuration)?;
        trace!(properties = self.inner.properties.len(), "normalizing configuration");
        let mut copier = DeepCopy::new();
        Ok(self.normalize_with(configuration, &mut copier))
    }

    fn collect_errors(&self, configuration: &Value, path: &str) -> Vec<String> {
        let entries = match configuration {
            Value::Null => Map::new(),
            Value::Object(object) => object.entries(),
            other => return vec![message::not_an_object(path, other)],
        };

        let mut errors = Vec::new();
        let mut values = Map::new();
        let mut cross_field = Vec::new();

        for (key, property) in &self.inner.properties {
            let label = message::join_path(path, key);
            let value = match entries.get(key) {
                Some(value) => value.clone(),
                None if property.required() => {
                    let help = property.help_text(&Value::Null);
                    errors.push(message::missing_required(&label, help.as_deref()));
                    continue;
                }
                None => match property.default() {
                    Some(default) => default.clone(),
                    None => continue,
                },
            };

            let before = errors.len();
            if let Some(error) = property.error_at(&label, &value) {
                errors.push(error);
            } else {
                errors.extend(nested_errors(property, &value, &label));
            }

            if errors.len() == before && property.is_cross_field() {
                cross_field.push((key, property, label));
            }
            values.insert(key.clone(), value);
        }

        for (key, property, label) in cross_field {
            if let Some(value) = values.get(key)
                && let Some(error) = property.cross_check(&label, value, &values)
            {
                errors.push(error);
            }
        }

        errors
    }

    fn normalize_with(&self, configuration: &Value, copier: &mut DeepCopy) -> Map {
        let entries = configuration
            .as_object()
            .map(Object::entries)
            .unwrap_or_default();

        let mut result = Map::with_capacity(self.inner.properties.len());
        let mut transforms = Vec::new();

        for (key, property) in &self.inner.properties {
            let Some(source) = entries.get(key).or(property.default()) else {
                continue;
            };

            let value = match property.schema() {
                Some(schema) if property.is_array_of_schema() => {
                    let items = source.as_array().map(Array::items).unwrap_or_default();
                    Value::array(
                        items
                            .iter()
                            .map(|item| Value::from(schema.normalize_with(item, copier))),
                    )
                }
                Some(schema) => Value::from(schema.normalize_with(source, copier)),
                None => copier.copy(source),
            };
            result.insert(key.clone(), value);

            if let Some(transform) = property.transform() {
                transforms.push((key, transform));
            }
        }

        for (key, transform) in transforms {
            if let Some(value) = result.get(key).cloned() {
                let transformed = transform.apply(value, &result);
                result.insert(key.clone(), transformed);
            }
        }

        result
    }
}

/// Validate a value against the property's nested schema, if it has one.
/// Array-of-schema values produce one entry per failing element.
fn nested_errors(property: &PropertyDescriptor, value: &Value, label: &str) -> Vec<String> {
    let Some(schema) = property.schema() else {
        return Vec::new();
    };

    if property.is_array_of_schema() {
        let items = value.as_array().map(Array::items).unwrap_or_default();
        return items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let path = format!("{label}[{index}]");
                if !matches!(item, Value::Null | Value::Object(_)) {
                    return Some(message::not_an_object(&path, item));
                }
                let errors = schema.collect_errors(item, &path);
                (!errors.is_empty()).then(|| message::nested(&path, &errors))
            })
            .collect();
    }

    if !matches!(value, Value::Null | Value::Object(_)) {
        return vec![message::not_an_object(label, value)];
    }
    let errors = schema.collect_errors(value, label);
    if errors.is_empty() {
        Vec::new()
    } else {
        vec![message::nested(label, &errors)]
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("properties", &self.inner.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}
