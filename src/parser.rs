use crate::{Element, PlistError, PropertyList, Result, VERSION_ATTRIBUTE, Value};
use crate::{TAG_ARRAY, TAG_DICT, TAG_FALSE, TAG_KEY, TAG_STRING, TAG_TRUE};
use indexmap::IndexMap;

/// The closed set of element names the converter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlistTag {
    Key,
    String,
    True,
    False,
    Dict,
    Array,
}

impl PlistTag {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TAG_KEY => Some(PlistTag::Key),
            TAG_STRING => Some(PlistTag::String),
            TAG_TRUE => Some(PlistTag::True),
            TAG_FALSE => Some(PlistTag::False),
            TAG_DICT => Some(PlistTag::Dict),
            TAG_ARRAY => Some(PlistTag::Array),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlistTag::Key => TAG_KEY,
            PlistTag::String => TAG_STRING,
            PlistTag::True => TAG_TRUE,
            PlistTag::False => TAG_FALSE,
            PlistTag::Dict => TAG_DICT,
            PlistTag::Array => TAG_ARRAY,
        }
    }
}

/// How the parser treats documents that stray from the expected shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagPolicy {
    /// Reject unknown tags, keyless values, dangling keys and odd roots
    #[default]
    Strict,
    /// Unknown tags read as strings, keyless values are dropped, a key stays
    /// pending until the next one, and the last root child wins
    Lenient,
}

/// Convert a single value node
fn parse_value(element: &Element, policy: TagPolicy) -> Result<Value> {
    match PlistTag::from_name(&element.tag) {
        Some(PlistTag::True) => Ok(Value::Bool(true)),
        Some(PlistTag::False) => Ok(Value::Bool(false)),
        Some(PlistTag::Dict) => parse_dict(element, policy).map(Value::Dict),
        Some(PlistTag::Array) => parse_array(element, policy).map(Value::Array),
        Some(PlistTag::String) => Ok(Value::String(element.text_or_empty().to_string())),
        Some(PlistTag::Key) | None => match policy {
            TagPolicy::Strict => Err(PlistError::UnknownTag(element.tag.clone())),
            TagPolicy::Lenient => {
                tracing::debug!("reading <{}> as a string", element.tag);
                Ok(Value::String(element.text_or_empty().to_string()))
            }
        },
    }
}

/// Parse a `dict` element whose children alternate `key` markers and values
pub fn parse_dict(element: &Element, policy: TagPolicy) -> Result<IndexMap<String, Value>> {
    let mut dict = IndexMap::new();
    let mut pending_key: Option<String> = None;

    for child in &element.children {
        if child.tag == TAG_KEY {
            if let (TagPolicy::Strict, Some(key)) = (policy, &pending_key) {
                return Err(PlistError::DanglingKey(key.clone()));
            }
            pending_key = Some(child.text_or_empty().to_string());
            continue;
        }

        let value = parse_value(child, policy)?;
        match policy {
            TagPolicy::Strict => match pending_key.take() {
                Some(key) => {
                    dict.insert(key, value);
                }
                None => {
                    return Err(PlistError::ValueWithoutKey {
                        value_tag: child.tag.clone(),
                    });
                }
            },
            TagPolicy::Lenient => match &pending_key {
                Some(key) => {
                    dict.insert(key.clone(), value);
                }
                None => tracing::warn!("dropping <{}> with no preceding <key>", child.tag),
            },
        }
    }

    if let (TagPolicy::Strict, Some(key)) = (policy, pending_key) {
        return Err(PlistError::DanglingKey(key));
    }
    Ok(dict)
}

/// Parse an `array` element; every child is a value
pub fn parse_array(element: &Element, policy: TagPolicy) -> Result<Vec<Value>> {
    element
        .children
        .iter()
        .map(|child| parse_value(child, policy))
        .collect()
}

/// Parse the outermost element into a [`PropertyList`]
pub fn parse_root(root: &Element, policy: TagPolicy) -> Result<PropertyList> {
    let version = root
        .attribute(VERSION_ATTRIBUTE)
        .ok_or_else(|| PlistError::MissingVersion(root.tag.clone()))?;

    let dict = match policy {
        TagPolicy::Strict => match root.children.as_slice() {
            [only] if only.tag == TAG_DICT => parse_dict(only, policy)?,
            [only] => {
                return Err(PlistError::InvalidRoot(format!(
                    "expected <{TAG_DICT}> under <{}>, found <{}>",
                    root.tag, only.tag
                )));
            }
            children => {
                return Err(PlistError::InvalidRoot(format!(
                    "expected exactly one child of <{}>, found {}",
                    root.tag,
                    children.len()
                )));
            }
        },
        TagPolicy::Lenient => {
            let mut dict = IndexMap::new();
            for child in &root.children {
                dict = parse_dict(child, policy)?;
            }
            dict
        }
    };

    Ok(PropertyList::new(root.tag.clone(), version, dict))
}
