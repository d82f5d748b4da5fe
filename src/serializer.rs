use crate::{Element, PropertyList, VERSION_ATTRIBUTE, Value};
use crate::{TAG_ARRAY, TAG_DICT, TAG_FALSE, TAG_KEY, TAG_STRING, TAG_TRUE};
use indexmap::IndexMap;

fn serialize_value(value: &Value, parent: &mut Element) {
    match value {
        Value::String(text) => {
            parent.sub_element(TAG_STRING).text = Some(text.clone());
        }
        Value::Bool(flag) => {
            parent.sub_element(if *flag { TAG_TRUE } else { TAG_FALSE });
        }
        Value::Dict(entries) => serialize_dict(entries, parent),
        Value::Array(items) => serialize_array(items, parent),
    }
}

/// Append a `dict` element with interleaved `key`/value children
pub fn serialize_dict(dict: &IndexMap<String, Value>, parent: &mut Element) {
    let dict_element = parent.sub_element(TAG_DICT);
    for (key, value) in dict {
        dict_element.sub_element(TAG_KEY).text = Some(key.clone());
        serialize_value(value, dict_element);
    }
}

/// Append an `array` element holding only value children
pub fn serialize_array(items: &[Value], parent: &mut Element) {
    let array_element = parent.sub_element(TAG_ARRAY);
    for item in items {
        serialize_value(item, array_element);
    }
}

/// Build `<root_tag version="...">` with a single `dict` child
pub fn build_root(plist: &PropertyList) -> Element {
    let mut root = Element::new(plist.root_tag.as_str())
        .with_attribute(VERSION_ATTRIBUTE, plist.version.as_str());
    serialize_dict(&plist.root, &mut root);
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TagPolicy, parse_root};

    fn tags(element: &Element) -> Vec<&str> {
        element.children.iter().map(|c| c.tag.as_str()).collect()
    }

    #[test]
    fn test_serialize_items_in_order() {
        let plist = PropertyList::from_json_str(
            r#"{"plist version=1.0": {"dict": {"Items": ["a", true, {"x": "y"}]}}}"#,
        )
        .unwrap();
        let root = build_root(&plist);

        assert_eq!(root.tag, "plist");
        assert_eq!(root.attribute("version"), Some("1.0"));
        assert_eq!(tags(&root), ["dict"]);

        let dict = &root.children[0];
        assert_eq!(tags(dict), ["key", "array"]);
        assert_eq!(dict.children[0].text.as_deref(), Some("Items"));

        let array = &dict.children[1];
        assert_eq!(tags(array), ["string", "true", "dict"]);
        assert_eq!(array.children[0].text.as_deref(), Some("a"));
        assert_eq!(array.children[1].text, None);
        assert_eq!(tags(&array.children[2]), ["key", "string"]);
        assert_eq!(array.children[2].children[0].text.as_deref(), Some("x"));
        assert_eq!(array.children[2].children[1].text.as_deref(), Some("y"));
    }

    #[test]
    fn test_false_is_empty_element() {
        let mut root = Element::new("r");
        serialize_array(&[Value::Bool(false)], &mut root);
        assert_eq!(root.to_xml_string().unwrap(), "<r><array><false/></array></r>");
    }

    #[test]
    fn test_parse_of_serialize_is_identity() {
        let mut inner = IndexMap::new();
        inner.insert("deep".to_string(), Value::Array(vec![Value::from("1"), Value::from(false)]));
        let mut root = IndexMap::new();
        root.insert("z".to_string(), Value::from("last & <first>"));
        root.insert("a".to_string(), Value::Dict(inner));
        root.insert("empty".to_string(), Value::Dict(IndexMap::new()));
        root.insert("blank".to_string(), Value::from(""));
        root.insert("list".to_string(), Value::Array(vec![Value::Array(vec![])]));
        let plist = PropertyList::new("plist", "1.0", root);

        let xml = build_root(&plist).to_xml_string().unwrap();
        let parsed = parse_root(&Element::parse_str(&xml).unwrap(), TagPolicy::Strict).unwrap();
        assert_eq!(parsed, plist);
    }
}
