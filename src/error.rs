use thiserror::Error;

/// Everything that can go wrong while building a [`Schema`](crate::Schema) or
/// checking a configuration against one.
///
/// `InvalidDefinition` and `InvalidOptionType` are raised while the schema is
/// constructed, before any configuration exists. `ConfigurationInvalid` is the
/// only error produced at validation time and carries the complete, ordered
/// list of problems found.
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum SchemaError {
    #[error(
        "Invalid configuration for property: {property}. Cannot make required and provide a default value."
    )]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(schemata::invalid_definition),
            help("drop either `required` or `default` from the property")
        )
    )]
    InvalidDefinition { property: String },

    #[error("Invalid {option} option for property: {property}. {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(schemata::invalid_option_type)))]
    InvalidOptionType {
        property: String,
        option: &'static str,
        reason: String,
    },

    #[error("Configuration has one or more errors:\n{}", indent_all(.errors))]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(schemata::configuration_invalid),
            help("call `Schema::errors` to inspect the individual problems")
        )
    )]
    ConfigurationInvalid { errors: Vec<String> },
}

impl SchemaError {
    /// Stable short code identifying the error class.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::InvalidDefinition { .. } => "EDEF",
            SchemaError::InvalidOptionType { .. } => "ESIPT",
            SchemaError::ConfigurationInvalid { .. } => "ESCFG",
        }
    }

    /// The collected configuration errors, if this is a validation failure.
    pub fn errors(&self) -> &[String] {
        match self {
            SchemaError::ConfigurationInvalid { errors } => errors,
            _ => &[],
        }
    }
}

/// Indent every line of every error by two spaces and join them with newlines.
fn indent_all(errors: &[String]) -> String {
    errors
        .iter()
        .flat_map(|e| e.lines())
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_definition_names_property() {
        let err = SchemaError::InvalidDefinition {
            property: "port".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("port"));
        assert!(msg.contains("required"));
        assert_eq!(err.code(), "EDEF");
    }

    #[test]
    fn invalid_option_type_formats() {
        let err = SchemaError::InvalidOptionType {
            property: "mode".into(),
            option: "type",
            reason: "Expected one of: boolean, function, number, string, symbol, object.".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("type option"));
        assert!(msg.contains("mode"));
        assert_eq!(err.code(), "ESIPT");
    }

    #[test]
    fn configuration_invalid_indents_every_line() {
        let err = SchemaError::ConfigurationInvalid {
            errors: vec![
                "Missing required configuration property: name.".into(),
                "Configuration has one or more errors for property: pet\n  Missing required configuration property: pet.name.".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Configuration has one or more errors:\n  \
             Missing required configuration property: name.\n  \
             Configuration has one or more errors for property: pet\n    \
             Missing required configuration property: pet.name."
        );
        assert_eq!(err.errors().len(), 2);
        assert_eq!(err.code(), "ESCFG");
    }

    #[test]
    fn definition_errors_carry_no_configuration_errors() {
        let err = SchemaError::InvalidDefinition {
            property: "x".into(),
        };
        assert!(err.errors().is_empty());
    }
}
