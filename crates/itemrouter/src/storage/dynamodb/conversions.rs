//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between JSON values and DynamoDB
//! `AttributeValue`s. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use itemrouter_core::item::{Item, ID_FIELD};
use itemrouter_core::storage::RepositoryError;
use serde_json::{Map, Number, Value};

/// Convert an Item to a DynamoDB item.
pub fn item_to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    let mut attributes: HashMap<String, AttributeValue> = item
        .attributes
        .iter()
        .map(|(name, value)| (name.clone(), json_to_attribute(value)))
        .collect();

    attributes.insert(ID_FIELD.to_string(), AttributeValue::S(item.id.clone()));

    attributes
}

/// Convert a DynamoDB item to an Item.
pub fn attributes_to_item(
    attributes: &HashMap<String, AttributeValue>,
) -> Result<Item, RepositoryError> {
    let id = get_string(attributes, ID_FIELD)?;

    let mut fields = Map::new();
    for (name, attribute) in attributes {
        if name != ID_FIELD {
            fields.insert(name.clone(), attribute_to_json(attribute)?);
        }
    }

    Ok(Item {
        id,
        attributes: fields,
    })
}

/// Convert a JSON value to its DynamoDB representation.
pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(name, value)| (name.clone(), json_to_attribute(value)))
                .collect(),
        ),
    }
}

/// Convert a DynamoDB attribute back to JSON.
///
/// String and number sets come back as arrays. Binary attributes have no
/// JSON form and are rejected.
pub fn attribute_to_json(attribute: &AttributeValue) -> Result<Value, RepositoryError> {
    match attribute {
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::L(values) => values
            .iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => map
            .iter()
            .map(|(name, value)| Ok((name.clone(), attribute_to_json(value)?)))
            .collect::<Result<Map<_, _>, RepositoryError>>()
            .map(Value::Object),
        AttributeValue::Ss(values) => Ok(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(values) => values
            .iter()
            .map(|n| parse_number(n))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::B(_) | AttributeValue::Bs(_) => Err(RepositoryError::InvalidData(
            "Binary attributes are not supported".to_string(),
        )),
        other => Err(RepositoryError::InvalidData(format!(
            "Unsupported attribute type: {:?}",
            other
        ))),
    }
}

fn parse_number(n: &str) -> Result<Value, RepositoryError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Value::from(u));
    }

    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| RepositoryError::InvalidData(format!("Invalid number: {}", n)))
}

fn get_string(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<String, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}
