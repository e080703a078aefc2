use crate::project::flatten::{collapse, flatten};
use crate::types::{OutputSpec, Record};
use serde_json::Value;

/// Write a query result into the record according to the output spec
pub fn map_result(record: &mut Record, spec: &OutputSpec, result: &Value) {
    match spec {
        OutputSpec::Literal(field) => output_to_field(record, field, result),
        OutputSpec::Wildcard(_) => output_to_wildcard_fields(record, spec, result),
    }
}

/// Assign the whole result to one field
pub fn output_to_field(record: &mut Record, field: &str, result: &Value) {
    if let Some(value) = collapse(flatten(result)) {
        record.set(field, value);
    }
}

/// Fan an object result out to one field per key.
///
/// A result that is not an object has no keys to substitute, so it is written
/// to the pattern name itself, placeholder and all.
pub fn output_to_wildcard_fields(record: &mut Record, spec: &OutputSpec, result: &Value) {
    let Value::Object(entries) = result else {
        output_to_field(record, spec.name(), result);
        return;
    };

    for (key, value) in entries {
        output_to_field(record, &spec.field_for(key), value);
    }
}
