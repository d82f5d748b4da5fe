use crate::{JSON_DICT_KEY, PlistError, Result, VERSION_ATTRIBUTE};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Map;

/// Generic value tree shared by the plist and JSON sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Bool(bool),
    Dict(IndexMap<String, Value>),
    Array(Vec<Value>),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Value::Dict(value)
    }
}

/// JSON numbers and nulls have no plist counterpart and are rejected here.
impl TryFrom<serde_json::Value> for Value {
    type Error = PlistError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            serde_json::Value::Object(map) => dict_from_json(map).map(Value::Dict),
            other @ (serde_json::Value::Number(_) | serde_json::Value::Null) => {
                Err(PlistError::UnsupportedValueKind(other.to_string()))
            }
        }
    }
}

fn dict_from_json(map: Map<String, serde_json::Value>) -> Result<IndexMap<String, Value>> {
    map.into_iter()
        .map(|(key, value)| Ok((key, Value::try_from(value)?)))
        .collect()
}

/// Build the JSON root key, e.g. `plist version=1.0`
pub fn encode_composite_key(root_tag: &str, version: &str) -> String {
    format!("{root_tag} {VERSION_ATTRIBUTE}={version}")
}

/// Split a JSON root key back into the root tag name and version.
///
/// The tag ends at the first space; the version is everything after the
/// first `=` of the remainder.
pub fn decode_composite_key(key: &str) -> Result<(String, String)> {
    let invalid = || PlistError::InvalidCompositeKey(key.to_string());

    let (root_tag, attribute) = key.split_once(' ').ok_or_else(invalid)?;
    let (name, version) = attribute.split_once('=').ok_or_else(invalid)?;
    if root_tag.is_empty() || name != VERSION_ATTRIBUTE {
        return Err(invalid());
    }
    Ok((root_tag.to_string(), version.to_string()))
}

/// A parsed property list document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyList {
    pub root_tag: String,
    pub version: String,
    pub root: IndexMap<String, Value>,
}

impl PropertyList {
    pub fn new(
        root_tag: impl Into<String>,
        version: impl Into<String>,
        root: IndexMap<String, Value>,
    ) -> Self {
        Self {
            root_tag: root_tag.into(),
            version: version.into(),
            root,
        }
    }

    pub fn composite_key(&self) -> String {
        encode_composite_key(&self.root_tag, &self.version)
    }

    fn json_layout(&self) -> IndexMap<String, IndexMap<&'static str, &IndexMap<String, Value>>> {
        let mut body = IndexMap::new();
        body.insert(JSON_DICT_KEY, &self.root);
        let mut outer = IndexMap::new();
        outer.insert(self.composite_key(), body);
        outer
    }

    /// Wrap as `{ "<tag> version=<v>": { "dict": root } }`
    pub fn to_json_document(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.json_layout())?)
    }

    /// Render the JSON document with two-space indentation
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.json_layout())?)
    }

    /// Inverse of [`PropertyList::to_json_document`]
    pub fn from_json_document(document: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(outer) = document else {
            return Err(PlistError::InvalidDocument(
                "top level must be an object".to_string(),
            ));
        };
        if outer.len() != 1 {
            return Err(PlistError::InvalidDocument(format!(
                "expected a single root key, found {}",
                outer.len()
            )));
        }
        let Some((key, body)) = outer.into_iter().next() else {
            return Err(PlistError::InvalidDocument("empty document".to_string()));
        };
        let (root_tag, version) = decode_composite_key(&key)?;

        let serde_json::Value::Object(mut body) = body else {
            return Err(PlistError::InvalidDocument(format!(
                "value of {key:?} must be an object"
            )));
        };
        let root = match body.remove(JSON_DICT_KEY) {
            Some(serde_json::Value::Object(map)) => dict_from_json(map)?,
            Some(other) => {
                return Err(PlistError::InvalidDocument(format!(
                    "\"{JSON_DICT_KEY}\" must be an object, found {other}"
                )));
            }
            None => {
                return Err(PlistError::InvalidDocument(format!(
                    "missing \"{JSON_DICT_KEY}\" under {key:?}"
                )));
            }
        };
        if let Some(extra) = body.keys().next() {
            return Err(PlistError::InvalidDocument(format!(
                "unexpected key {extra:?} next to \"{JSON_DICT_KEY}\""
            )));
        }

        Ok(Self {
            root_tag,
            version,
            root,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_document(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_composite_key_roundtrip() {
        let key = encode_composite_key("plist", "1.0");
        assert_eq!(key, "plist version=1.0");
        assert_eq!(
            decode_composite_key(&key).unwrap(),
            ("plist".to_string(), "1.0".to_string())
        );
    }

    #[test]
    fn test_composite_key_version_with_equals() {
        let key = encode_composite_key("plist", "a=b");
        let (tag, version) = decode_composite_key(&key).unwrap();
        assert_eq!(tag, "plist");
        assert_eq!(version, "a=b");
    }

    #[test]
    fn test_composite_key_rejects_garbage() {
        for key in ["plist", "plist version", "plist revision=1.0", " version=1.0"] {
            assert!(matches!(
                decode_composite_key(key),
                Err(PlistError::InvalidCompositeKey(_))
            ));
        }
    }

    #[test]
    fn test_number_is_unsupported() {
        let err = Value::try_from(json!({"a": ["x", 3]})).unwrap_err();
        match err {
            PlistError::UnsupportedValueKind(v) => assert_eq!(v, "3"),
            other => panic!("Expected UnsupportedValueKind, got {other:?}"),
        }
    }

    #[test]
    fn test_null_is_unsupported() {
        assert!(matches!(
            Value::try_from(serde_json::Value::Null),
            Err(PlistError::UnsupportedValueKind(_))
        ));
    }

    #[test]
    fn test_json_document_preserves_order() {
        let mut root = IndexMap::new();
        root.insert("Zeta".to_string(), Value::from("z"));
        root.insert("Alpha".to_string(), Value::from(true));
        let plist = PropertyList::new("plist", "1.0", root);

        let text = plist.to_json_string().unwrap();
        assert!(text.find("Zeta").unwrap() < text.find("Alpha").unwrap());
        assert!(text.contains("\n  \"plist version=1.0\": {"));

        let back = PropertyList::from_json_str(&text).unwrap();
        assert_eq!(back, plist);
    }

    #[test]
    fn test_document_shape_errors() {
        for doc in [
            json!([]),
            json!({}),
            json!({"plist version=1.0": {}}),
            json!({"plist version=1.0": {"dict": []}}),
            json!({"plist version=1.0": "x"}),
            json!({"a version=1": {"dict": {}}, "b version=1": {"dict": {}}}),
            json!({"plist version=1.0": {"dict": {}, "array": []}}),
        ] {
            assert!(matches!(
                PropertyList::from_json_document(doc),
                Err(PlistError::InvalidDocument(_))
            ));
        }
    }

    #[test]
    fn test_extra_body_key_is_named() {
        let doc = json!({"plist version=1.0": {"dict": {"A": "b"}, "notes": "x"}});
        match PropertyList::from_json_document(doc) {
            Err(PlistError::InvalidDocument(msg)) => assert!(msg.contains("notes")),
            other => panic!("Expected InvalidDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_to_json_document_shape() {
        let mut root = IndexMap::new();
        root.insert("Items".to_string(), Value::Array(vec![Value::from("a"), Value::from(true)]));
        let plist = PropertyList::new("plist", "1.0", root);
        assert_eq!(
            plist.to_json_document().unwrap(),
            json!({"plist version=1.0": {"dict": {"Items": ["a", true]}}})
        );
    }

    #[test]
    fn test_value_serializes_untagged() {
        let value = Value::Array(vec![Value::from("a"), Value::from(false)]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["a",false]"#);
    }
}
