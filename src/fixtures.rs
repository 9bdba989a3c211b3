#[cfg(test)]
pub mod test {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::property::Property;
    use crate::schema::Schema;
    use crate::value::Value;

    /// Wrap a check so every call is counted.
    pub fn counted<F>(
        check: F,
    ) -> (
        Arc<AtomicUsize>,
        impl Fn(&Value) -> bool + Clone + Send + Sync + 'static,
    )
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let check = Arc::new(check);
        let wrapped = move |value: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            check(value)
        };
        (calls, wrapped)
    }

    /// `max` and `min`, each cross-checked against the other. Only calls to
    /// `max`'s validator are counted.
    pub fn range_schema() -> (Arc<AtomicUsize>, Schema) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let schema = Schema::builder()
            .property(
                "max",
                Property::new()
                    .of_type("number")
                    .help("Must be at least min.")
                    .validate_with(move |value, all| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        ordered(all.get("min"), Some(value))
                    }),
            )
            .property(
                "min",
                Property::new()
                    .of_type("number")
                    .help("Must be at most max.")
                    .validate_with(|value, all| ordered(Some(value), all.get("max"))),
            )
            .build()
            .unwrap();
        (calls, schema)
    }

    fn ordered(low: Option<&Value>, high: Option<&Value>) -> bool {
        match (low.and_then(Value::as_f64), high.and_then(Value::as_f64)) {
            (Some(low), Some(high)) => low <= high,
            _ => true,
        }
    }

    /// A name plus a non-negative, rounded age.
    pub fn person() -> Property {
        Property::new().schema(
            Schema::builder()
                .property(
                    "name",
                    Property::new()
                        .of_type("string")
                        .required()
                        .help("This must be a non-empty string.")
                        .validate(|v| v.as_str().is_some_and(|s| !s.is_empty())),
                )
                .property(
                    "age",
                    Property::new()
                        .of_type("number")
                        .default(0)
                        .help("This must be a non-negative number.")
                        .validate(|v| v.as_f64().is_some_and(|n| n >= 0.0))
                        .transform(|v| v.as_f64().map_or(v, |n| n.round().into())),
                ),
        )
    }

    /// `id`, a `person`, an optional `pet` and a list of `relatives`.
    pub fn person_schema() -> Schema {
        let relatives = person().of_type("Array");
        Schema::builder()
            .property("id", Property::new().of_type("string"))
            .property("person", person().required())
            .property(
                "pet",
                Property::new().schema(
                    Schema::builder()
                        .property("name", Property::new().of_type("string").required()),
                ),
            )
            .property("relatives", relatives)
            .build()
            .unwrap()
    }

    #[test]
    fn person_schema_builds() {
        let schema = person_schema();
        assert!(schema.property("relatives").unwrap().is_array_of_schema());
        assert!(!schema.property("person").unwrap().is_array_of_schema());
    }

    #[test]
    fn counted_counts() {
        let (calls, check) = counted(|_: &Value| true);
        check(&Value::Null);
        check(&Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
