//! # schemata demo
//!
//! Walks through the main features on a small "people" configuration:
//! defaults and transforms, required properties, cross-field validation,
//! nested and array sub-schemas, and nominal instance types.
//!
//! ```sh
//! cargo run --example people
//! ```

use serde_json::json;

use schemata::{Instance, NominalType, Property, Schema, SchemaError, Value};

struct Person;
struct Dog;

fn person() -> Result<Schema, SchemaError> {
    Schema::builder()
        .property(
            "age",
            Property::new()
                .default(0)
                .help("This must be a non-negative number.")
                .validate(|v| v.as_f64().is_some_and(|n| !n.is_nan() && n >= 0.0))
                .transform(|v| v.as_f64().map_or(v, |n| n.round().into())),
        )
        .property(
            "name",
            Property::new()
                .required()
                .help("This must be a non-empty string.")
                .validate(|v| v.as_str().is_some_and(|s| !s.is_empty())),
        )
        .build()
}

fn show(label: &str, result: Result<schemata::Map, SchemaError>) {
    match result {
        Ok(map) => match serde_json::to_string(&Value::from(map)) {
            Ok(json) => println!("{label}: {json}"),
            Err(e) => println!("{label}: <{e}>"),
        },
        Err(e) => println!("{label}: {e}"),
    }
}

fn basic(person: &Schema) {
    println!("-- basic");
    show("age rounded", person.normalize(&json!({"name": "Bob", "age": 12.5}).into()));
    show("age defaulted", person.normalize(&json!({"name": "Bob"}).into()));
    show("name missing", person.normalize(&json!({}).into()));
    show("negative age", person.normalize(&json!({"name": "Bob", "age": -5}).into()));
}

fn cross_field() -> Result<(), SchemaError> {
    println!("-- cross-field");
    let round = |v: Value| v.as_f64().map_or(v, |n| n.round().into());
    let schema = Schema::builder()
        .property(
            "max",
            Property::new()
                .required()
                .of_type("Number")
                .help("Max value must be greater than min value.")
                .transform(round)
                .validate_with(|v, all| {
                    let min = all.get("min").and_then(Value::as_f64);
                    v.as_f64().zip(min).is_none_or(|(max, min)| max > min)
                }),
        )
        .property(
            "min",
            Property::new()
                .required()
                .of_type("number")
                .help("Min value must be less than max value and no less than zero.")
                .transform(round)
                .validate_with(|v, all| {
                    let max = all.get("max").and_then(Value::as_f64);
                    v.as_f64()
                        .is_some_and(|min| min >= 0.0 && max.is_none_or(|max| min < max))
                }),
        )
        .build()?;

    show("valid", schema.normalize(&json!({"max": 10, "min": 0}).into()));
    show("max below min", schema.normalize(&json!({"max": 0, "min": 10}).into()));
    show("max not a number", schema.normalize(&json!({"max": "5", "min": 0}).into()));
    Ok(())
}

fn sub_schema(person: &Schema) -> Result<(), SchemaError> {
    println!("-- sub-schema");
    let schema = Schema::builder()
        .property("id", Property::new().of_type("String"))
        .property("person", Property::new().required().schema(person))
        .property(
            "pet",
            Property::new().schema(
                Schema::builder()
                    .property("name", Property::new().of_type("String").required())
                    .property("type", Property::new().of_type("String")),
            ),
        )
        .property("relatives", Property::new().of_type("Array").schema(person))
        .build()?;

    let config = json!({
        "id": "abc123",
        "person": {"name": "Bob", "age": 51},
        "relatives": [
            {"name": "Bob Jr.", "age": 15, "birthOrder": 1},
            {"name": "Marcy", "age": 12},
            {"name": "Jane"}
        ]
    });
    show("normalized", schema.normalize(&config.into()));

    let broken = json!({
        "person": {"name": ""},
        "pet": {},
        "relatives": [{"name": "Ann"}, {"age": -1}]
    });
    for error in schema.errors(&broken.into()) {
        println!("{error}");
    }
    Ok(())
}

fn types() -> Result<(), SchemaError> {
    println!("-- types");
    let schema = Schema::builder()
        .property("dog", Property::new().of_type(NominalType::of::<Dog>()))
        .property("person", Property::new().of_type(NominalType::of::<Person>()))
        .property("number", Property::new().of_type("Number"))
        .build()?;

    let valid = Value::object([
        ("dog", Value::from(Instance::new(Dog))),
        ("person", Value::from(Instance::new(Person))),
        ("number", Value::from(5)),
    ]);
    println!("valid: {}", schema.is_valid(&valid));

    let invalid = Value::object([
        ("dog", Value::from(Instance::new(Person))),
        ("person", Value::from("Bob")),
        ("number", Value::from(5)),
    ]);
    if let Err(e) = schema.validate(&invalid) {
        println!("{e}");
    }
    Ok(())
}

fn main() -> Result<(), SchemaError> {
    let person = person()?;
    basic(&person);
    cross_field()?;
    sub_schema(&person)?;
    types()
}
