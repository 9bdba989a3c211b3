//! Error message text.
//!
//! Messages always name the property (path-qualified inside nested schemas)
//! and the reason; type errors also name the expected type and describe the
//! received value.

use crate::types::TypeConstraint;
use crate::value::{Value, format_number};

pub(crate) fn invalid_value(property: &str, reason: Option<&str>, received: &Value) -> String {
    let mut message = format!("Invalid configuration value for property: {property}.");
    if let Some(reason) = reason.filter(|r| !r.is_empty()) {
        message.push(' ');
        message.push_str(reason);
    }
    message.push_str(" Received: ");
    message.push_str(&describe(received));
    message
}

pub(crate) fn invalid_type(property: &str, expected: &TypeConstraint, received: &Value) -> String {
    format!(
        "Invalid configuration value for property: {property}. Invalid type. Expected {}. Received: {}",
        expected.expected(),
        describe(received)
    )
}

pub(crate) fn missing_required(property: &str, help: Option<&str>) -> String {
    match help.filter(|h| !h.is_empty()) {
        Some(help) => format!("Missing required configuration property: {property}. {help}"),
        None => format!("Missing required configuration property: {property}."),
    }
}

pub(crate) fn not_an_object(path: &str, received: &Value) -> String {
    if path.is_empty() {
        format!(
            "Invalid configuration. Expected an object. Received: {}",
            describe(received)
        )
    } else {
        invalid_value(path, Some("Expected an object."), received)
    }
}

/// One entry grouping every error found under `path`, nested lines indented.
pub(crate) fn nested(path: &str, errors: &[String]) -> String {
    let mut message = format!("Configuration has one or more errors for property: {path}");
    for line in errors.iter().flat_map(|e| e.lines()) {
        message.push_str("\n  ");
        message.push_str(line);
    }
    message
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Describe a received value: literals for primitives, the type name for
/// structured values.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Symbol(s) => format!("Symbol({})", s.description()),
        Value::Function(f) => format!("function {}", f.name()),
        Value::Array(_) => "an instance of Array".to_string(),
        Value::Object(_) => "an instance of Object".to_string(),
        Value::Instance(i) => format!("an instance of {}", i.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NominalType, PrimitiveKind};
    use crate::value::Instance;

    struct Person;
    struct Dog;

    #[test]
    fn invalid_value_with_reason() {
        assert_eq!(
            invalid_value("age", Some("This must be a non-negative number."), &Value::from(-5)),
            "Invalid configuration value for property: age. This must be a non-negative number. Received: -5"
        );
    }

    #[test]
    fn invalid_value_without_reason() {
        assert_eq!(
            invalid_value("age", None, &Value::from(-5)),
            "Invalid configuration value for property: age. Received: -5"
        );
    }

    #[test]
    fn invalid_type_names_both_types() {
        let msg = invalid_type(
            "dog",
            &TypeConstraint::Nominal(NominalType::of::<Dog>()),
            &Value::Instance(Instance::new(Person)),
        );
        assert_eq!(
            msg,
            "Invalid configuration value for property: dog. Invalid type. Expected an instance of Dog. Received: an instance of Person"
        );
    }

    #[test]
    fn invalid_type_renders_primitive_literally() {
        let msg = invalid_type("max", &PrimitiveKind::Number.into(), &Value::from("5"));
        assert!(msg.ends_with("Expected a number. Received: 5"));
    }

    #[test]
    fn missing_required_appends_help() {
        assert_eq!(
            missing_required("name", Some("This must be a non-empty string.")),
            "Missing required configuration property: name. This must be a non-empty string."
        );
        assert_eq!(
            missing_required("name", Some("")),
            "Missing required configuration property: name."
        );
    }

    #[test]
    fn nested_indents_every_line() {
        let msg = nested(
            "relatives[2]",
            &["a".to_string(), "header\n  inner".to_string()],
        );
        assert_eq!(
            msg,
            "Configuration has one or more errors for property: relatives[2]\n  a\n  header\n    inner"
        );
    }

    #[test]
    fn join_path_skips_empty_prefix() {
        assert_eq!(join_path("", "name"), "name");
        assert_eq!(join_path("pets[0]", "name"), "pets[0].name");
    }

    #[test]
    fn not_an_object_at_root_and_nested() {
        assert_eq!(
            not_an_object("", &Value::from(3)),
            "Invalid configuration. Expected an object. Received: 3"
        );
        assert!(not_an_object("pet", &Value::from("x")).contains("property: pet"));
    }
}
