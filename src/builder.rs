use crate::error::SchemaError;
use crate::property::{Definition, Property};
use crate::schema::Schema;

/// Builder for a [`Schema`].
///
/// Properties are checked in the order they are added; the first invalid
/// one aborts [`build()`](Self::build). Adding a property under a name that
/// already exists replaces the earlier options but keeps its position.
///
/// ```ignore
/// let schema = Schema::builder()
///     .property("name", Property::new().of_type("string").required())
///     .property("age", Property::new().of_type("number").default(0))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    definition: Definition,
}

impl SchemaBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, options: Property) -> Self {
        self.definition.insert(name.into(), options);
        self
    }

    /// The definition assembled so far.
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn into_definition(self) -> Definition {
        self.definition
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::new(&self.definition)
    }
}

impl From<Definition> for SchemaBuilder {
    fn from(definition: Definition) -> Self {
        SchemaBuilder { definition }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn properties_keep_insertion_order() {
        let builder = Schema::builder()
            .property("zeta", Property::new())
            .property("alpha", Property::new());
        let names: Vec<_> = builder.definition().keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn redefining_a_property_replaces_it_in_place() {
        let builder = Schema::builder()
            .property("a", Property::new().default(1))
            .property("b", Property::new())
            .property("a", Property::new().default(2));
        let definition = builder.into_definition();
        assert_eq!(definition.len(), 2);
        assert_eq!(definition.get_index(0).map(|(k, _)| k.as_str()), Some("a"));
        assert_eq!(definition["a"].default_value(), Some(&Value::from(2)));
    }

    #[test]
    fn build_reports_invalid_property() {
        let err = Schema::builder()
            .property("ok", Property::new())
            .property("port", Property::new().required().default(80))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "EDEF");
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn build_reports_invalid_type_name() {
        let err = Schema::builder()
            .property("port", Property::new().of_type("integer"))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "ESIPT");
    }

    #[test]
    fn build_from_definition() {
        let mut definition = Definition::new();
        definition.insert("name".into(), Property::new().required());
        let schema = SchemaBuilder::from(definition).build().unwrap();
        assert!(schema.property("name").unwrap().required());
    }

    #[test]
    fn empty_schema_accepts_anything_and_normalizes_to_nothing() {
        let schema = Schema::builder().build().unwrap();
        let config = Value::object([("extra", Value::from(1))]);
        assert!(schema.is_valid(&config));
        assert!(schema.normalize(&config).unwrap().is_empty());
    }
}
