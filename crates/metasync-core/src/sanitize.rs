//! Wire-payload normalization.
//!
//! Commits send the fetched entity back as a full replacement, so any
//! "missing value" sentinel that leaked into the payload must become an
//! explicit JSON null before it hits the wire. The transform is structure
//! preserving: keys, ordering, and every other scalar are left exactly as
//! they were.

use serde_json::Value;

/// Deep-sanitize a JSON value.
///
/// Mappings and sequences are rebuilt with each element sanitized; any
/// number that does not survive a finite float conversion (a NaN or
/// infinity smuggled in by a lossy producer) becomes `Value::Null`. On a
/// sentinel-free value this is the identity function.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, sanitize(v))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        Value::Number(number) => {
            let finite = number
                .as_f64()
                .map(f64::is_finite)
                .unwrap_or(true);
            if finite {
                Value::Number(number)
            } else {
                Value::Null
            }
        }
        other => other,
    }
}
