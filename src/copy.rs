//! Cycle-safe structural copy.
//!
//! Arrays and objects are duplicated; everything else is returned as-is
//! (instances, functions and symbols by reference). A container reachable
//! more than once is cloned exactly once: the clone is registered before its
//! children are visited, so a second visit, including one through a cycle,
//! returns the registered clone.

use std::collections::HashMap;

use crate::value::{Array, Object, Value};

/// Identity map from original container to its clone.
///
/// One `DeepCopy` spans one logical copy. Reusing it across several values
/// keeps containers shared between them shared in the copies too.
#[derive(Default)]
pub struct DeepCopy {
    // Keyed by storage address. The original is kept alive alongside its
    // clone so the address cannot be reused while the map exists.
    clones: HashMap<usize, (Value, Value)>,
}

impl DeepCopy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, value: &Value) -> Value {
        match value {
            Value::Array(array) => {
                if let Some((_, clone)) = self.clones.get(&array.addr()) {
                    return clone.clone();
                }
                let clone = Array::new();
                self.clones
                    .insert(array.addr(), (value.clone(), Value::Array(clone.clone())));
                for item in array.items() {
                    let copied = self.copy(&item);
                    clone.push(copied);
                }
                Value::Array(clone)
            }
            Value::Object(object) => {
                if let Some((_, clone)) = self.clones.get(&object.addr()) {
                    return clone.clone();
                }
                let clone = Object::new();
                self.clones
                    .insert(object.addr(), (value.clone(), Value::Object(clone.clone())));
                for (key, item) in object.entries() {
                    let copied = self.copy(&item);
                    clone.insert(key, copied);
                }
                Value::Object(clone)
            }
            other => other.clone(),
        }
    }
}

/// Copy `value` with a fresh identity map.
pub fn deep_copy(value: &Value) -> Value {
    DeepCopy::new().copy(value)
}
