//! `inpData` extension of the URL Metric root schema.
//!
//! The storage layer validates submitted URL Metrics against a JSON schema.
//! The extension adds an optional `inpData` array so reports from the client
//! collector are accepted.

use serde_json::{Map, Value, json};

use crate::metrics::Rating;

/// Root property name of the extension.
pub const INP_DATA_PROPERTY: &str = "inpData";

/// Schema of the `inpData` property.
pub fn inp_data_schema() -> Value {
    let ratings: Vec<&str> = Rating::ALL.iter().map(|rating| rating.as_str()).collect();
    json!({
        "description": "INP metrics",
        "type": "array",
        "required": false,
        "items": {
            "type": "object",
            "required": true,
            "properties": {
                "value": {
                    "type": "number",
                    "required": true,
                },
                "rating": {
                    "type": "string",
                    "enum": ratings,
                    "required": true,
                },
                "interactionTarget": {
                    "type": "string",
                    "required": true,
                },
            },
            "additionalProperties": true,
        },
    })
}

/// Adds the `inpData` property to a root schema's `properties` map.
/// An existing definition is replaced.
pub fn extend_root_schema(properties: &mut Map<String, Value>) {
    properties.insert(INP_DATA_PROPERTY.to_string(), inp_data_schema());
}
