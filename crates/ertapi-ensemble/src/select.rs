//! Bulk columnar selection over a record's child collection.

use std::ops::Index;

use ertapi_common::Record;
use serde_json::Value;

use crate::error::{NodeError, Result};
use crate::record::{collection, project};

/// Requested field names: a single name or an ordered list.
/// Duplicates are dropped, first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldNames(Vec<String>);

impl FieldNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self(out)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FieldNames {
    fn from(name: &str) -> Self {
        Self::new([name])
    }
}

impl From<String> for FieldNames {
    fn from(name: String) -> Self {
        Self::new([name])
    }
}

impl From<Vec<&str>> for FieldNames {
    fn from(names: Vec<&str>) -> Self {
        Self::new(names)
    }
}

impl From<Vec<String>> for FieldNames {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<&[&str]> for FieldNames {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for FieldNames {
    fn from(names: [&str; N]) -> Self {
        Self::new(names)
    }
}

/// One column per requested field, addressable by that field's name.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    collection: String,
    columns: Vec<(String, Vec<Value>)>,
}

impl Selection {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn get(&self, field: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, values)| values.as_slice())
    }

    /// Field names in request order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of selected fields.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<(String, Vec<Value>)> {
        self.columns
    }
}

impl Index<&str> for Selection {
    type Output = [Value];

    fn index(&self, field: &str) -> &[Value] {
        match self.get(field) {
            Some(values) => values,
            None => panic!("field {field:?} was not selected from {:?}", self.collection),
        }
    }
}

/// Select `fields` from every child of `record[collection]`, aligned by child index.
pub fn select_fields(
    record: &Record,
    collection_name: &str,
    fields: impl Into<FieldNames>,
) -> Result<Selection> {
    let children = collection(record, collection_name)?;
    let fields = fields.into();
    if fields.is_empty() {
        return Err(NodeError::NoFieldsRequested(collection_name.to_string()));
    }
    let columns = fields
        .0
        .into_iter()
        .map(|field| {
            let values = project(children, collection_name, &field)?;
            Ok((field, values))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Selection { collection: collection_name.to_string(), columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ertapi_test_utils::record;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn realizations() -> Record {
        record(json!({
            "realizations": [
                {"name": "r1", "status": "done"},
                {"name": "r2", "status": "failed"},
            ]
        }))
    }

    #[test]
    fn test_select_named_columns() {
        let sel = select_fields(&realizations(), "realizations", ["name", "status"]).unwrap();
        assert_eq!(sel.collection(), "realizations");
        assert_eq!(sel.names().collect::<Vec<_>>(), vec!["name", "status"]);
        assert_eq!(sel["name"], [json!("r1"), json!("r2")]);
        assert_eq!(sel["status"], [json!("done"), json!("failed")]);
    }

    #[test]
    fn test_single_name_is_normalized() {
        let sel = select_fields(&realizations(), "realizations", "status").unwrap();
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.get("status").unwrap().len(), 2);
        assert!(sel.get("name").is_none());
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let names = FieldNames::from(vec!["name", "status", "name"]);
        assert_eq!(names.as_slice(), &["name".to_string(), "status".to_string()]);
    }

    #[test]
    fn test_unknown_collection() {
        let err = select_fields(&realizations(), "responses", "name").unwrap_err();
        assert!(matches!(err, NodeError::UnknownCollection(ref c) if c == "responses"));
    }

    #[test]
    fn test_empty_field_list_is_rejected() {
        let err = select_fields(&realizations(), "realizations", Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, NodeError::NoFieldsRequested(ref c) if c == "realizations"));
    }

    #[test]
    fn test_missing_field_on_any_child() {
        let r = record(json!({"realizations": [{"name": "r1", "status": "done"}, {"name": "r2"}]}));
        let err = select_fields(&r, "realizations", ["name", "status"]).unwrap_err();
        assert!(matches!(err, NodeError::MissingField { index: Some(1), .. }));
    }

    #[test]
    fn test_empty_collection_gives_empty_columns() {
        let r = record(json!({"parameters": []}));
        let sel = select_fields(&r, "parameters", "key").unwrap();
        assert_eq!(sel.get("key"), Some(&[][..]));
    }
}
