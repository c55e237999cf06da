//! Helpers over raw metadata records.

use ertapi_common::Record;
use serde_json::Value;

use crate::error::{NodeError, Result};

/// Merge `update` into `target` key by key. Existing keys are overwritten,
/// none are removed. Returns the number of keys written.
pub fn merge_into(target: &mut Record, update: Record) -> usize {
    let written = update.len();
    for (key, value) in update {
        target.insert(key, value);
    }
    written
}

/// Owned form of [`merge_into`].
pub fn merged(mut base: Record, update: Record) -> Record {
    merge_into(&mut base, update);
    base
}

/// The raw child records of `name`, in server order.
pub fn collection<'a>(record: &'a Record, name: &str) -> Result<&'a [Value]> {
    match record.get(name) {
        None => Err(NodeError::UnknownCollection(name.to_string())),
        Some(Value::Array(children)) => Ok(children),
        Some(_) => Err(NodeError::MalformedCollection {
            collection: name.to_string(),
            reason: "not an array".to_string(),
        }),
    }
}

pub(crate) fn child_record<'a>(child: &'a Value, collection: &str, index: usize) -> Result<&'a Record> {
    child.as_object().ok_or_else(|| NodeError::MalformedCollection {
        collection: collection.to_string(),
        reason: format!("child {index} is not an object"),
    })
}

/// `field` of every child in `collection`, aligned by child index.
pub(crate) fn project(children: &[Value], collection: &str, field: &str) -> Result<Vec<Value>> {
    children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            child_record(child, collection, i)?
                .get(field)
                .cloned()
                .ok_or_else(|| NodeError::missing_on_child(field, i))
        })
        .collect()
}
