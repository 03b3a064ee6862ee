//! Format-agnostic structured records.

use serde::{Serialize, Serializer};

use crate::offset::FileObjectOffset;

/// A single decoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<TypedValue>),
    Map(Vec<(TypedValue, TypedValue)>),
    Struct(TypedStruct),
}

/// An ordered mapping of field names to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedStruct {
    fields: Vec<(String, TypedValue)>,
}

impl TypedStruct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing the value if the name already exists.
    pub fn put(mut self, name: impl Into<String>, value: TypedValue) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for TypedStruct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(n, v)| (n, v)))
    }
}

/// A record emitted by a file iterator together with the cursor that
/// points just past it. Committing that cursor means this record is done.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub value: TypedStruct,
    pub offset: FileObjectOffset,
}

impl FileRecord {
    pub fn new(value: TypedStruct, offset: FileObjectOffset) -> Self {
        Self { value, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_replaces_existing_field() {
        let s = TypedStruct::new()
            .put("id", TypedValue::Long(1))
            .put("name", TypedValue::String("foo".into()))
            .put("id", TypedValue::Long(2));
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("id"), Some(&TypedValue::Long(2)));
        assert_eq!(s.fields().map(|(n, _)| n).collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_json_keeps_field_order() {
        let nested = TypedStruct::new().put("zip", TypedValue::Null);
        let s = TypedStruct::new()
            .put("b", TypedValue::Boolean(true))
            .put("a", TypedValue::Array(vec![TypedValue::Int(1), TypedValue::Int(2)]))
            .put("addr", TypedValue::Struct(nested));
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"b":true,"a":[1,2],"addr":{"zip":null}}"#);
    }
}
