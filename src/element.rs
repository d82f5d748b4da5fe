use crate::{PlistError, Result};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::io::{self, Write};

/// Deepest element nesting accepted by [`Element::parse_str`]
pub const MAX_DEPTH: usize = 256;

/// XML entity encoder for safe XML output
pub fn encode_xml_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// In-memory XML element.
///
/// `text` is the character data before the first child, `tail` the character
/// data following the element's closing tag inside its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Append a new child and return it for further building
    pub fn sub_element(&mut self, tag: impl Into<String>) -> &mut Element {
        self.children.push(Element::new(tag));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Element text, or the empty string when there is none
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Parse a document and return its root element.
    ///
    /// Declarations, DOCTYPE, comments and processing instructions are skipped.
    /// Documents nested deeper than [`MAX_DEPTH`] are rejected.
    pub fn parse_str(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    Self::check_depth(stack.len() + 1)?;
                    stack.push(Self::from_start(&e)?);
                }
                Event::Empty(e) => {
                    Self::check_depth(stack.len() + 1)?;
                    let element = Self::from_start(&e)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        PlistError::InvalidRoot("unbalanced closing tag".to_string())
                    })?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(e) => {
                    let raw = std::str::from_utf8(&e)?;
                    Self::append_text(&mut stack, &unescape(raw)?);
                }
                Event::CData(e) => {
                    Self::append_text(&mut stack, std::str::from_utf8(&e)?);
                }
                Event::GeneralRef(e) => {
                    let name = std::str::from_utf8(&e)?;
                    let reference = format!("&{name};");
                    Self::append_text(&mut stack, &unescape(&reference)?);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(PlistError::InvalidRoot(format!("<{}> is never closed", open.tag)));
        }
        root.ok_or_else(|| PlistError::InvalidRoot("document has no root element".to_string()))
    }

    fn check_depth(depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(PlistError::InvalidRoot(format!(
                "nesting too deep (more than {MAX_DEPTH} levels)"
            )));
        }
        Ok(())
    }

    fn from_start(start: &BytesStart) -> Result<Element> {
        let tag = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut element = Element::new(tag);
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = unescape(std::str::from_utf8(&attr.value)?)?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => *root = Some(element),
            None => {
                return Err(PlistError::InvalidRoot(format!(
                    "second top-level element <{}>",
                    element.tag
                )));
            }
        }
        Ok(())
    }

    fn append_text(stack: &mut [Element], text: &str) {
        // Character data outside the root element is dropped.
        let Some(current) = stack.last_mut() else {
            return;
        };
        let slot = match current.children.last_mut() {
            Some(child) => &mut child.tail,
            None => &mut current.text,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    /// Write the element (and its tail) without any XML declaration
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "<{}", self.tag)?;
        for (name, value) in &self.attributes {
            write!(out, " {}=\"{}\"", name, encode_xml_entities(value))?;
        }

        let text = self.text_or_empty();
        if text.is_empty() && self.children.is_empty() {
            write!(out, "/>")?;
        } else {
            write!(out, ">{}", encode_xml_entities(text))?;
            for child in &self.children {
                child.write_to(out)?;
            }
            write!(out, "</{}>", self.tag)?;
        }

        if let Some(tail) = &self.tail {
            write!(out, "{}", encode_xml_entities(tail))?;
        }
        Ok(())
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write_to(&mut output)?;
        String::from_utf8(output).map_err(|e| PlistError::Utf8(e.utf8_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_with_text_and_tail() {
        let root = Element::parse_str(
            "<?xml version=\"1.0\"?><a x=\"1\">hi<b>in</b>after<c/></a>",
        )
        .unwrap();
        assert_eq!(root.tag, "a");
        assert_eq!(root.attribute("x"), Some("1"));
        assert_eq!(root.text.as_deref(), Some("hi"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text.as_deref(), Some("in"));
        assert_eq!(root.children[0].tail.as_deref(), Some("after"));
        assert_eq!(root.children[1].tag, "c");
        assert_eq!(root.children[1].text, None);
    }

    #[test]
    fn test_parse_skips_doctype_and_comments() {
        let xml = "<?xml version='1.0' encoding='utf-8'?>\n\
            <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
            <!-- note --><plist version=\"1.0\"><dict/></plist>\n";
        let root = Element::parse_str(xml).unwrap();
        assert_eq!(root.tag, "plist");
        assert_eq!(root.children[0].tag, "dict");
    }

    #[test]
    fn test_parse_decodes_entities_and_cdata() {
        let xml = "<s a=\"&quot;q&quot;\">a &amp; b &lt;c&gt; &#65;<![CDATA[<raw>]]></s>";
        let root = Element::parse_str(xml).unwrap();
        assert_eq!(root.text.as_deref(), Some("a & b <c> A<raw>"));
        assert_eq!(root.attribute("a"), Some("\"q\""));
    }

    #[test]
    fn test_parse_rejects_unclosed_and_empty() {
        assert!(Element::parse_str("").is_err());
        assert!(Element::parse_str("<a><b></b>").is_err());
        assert!(Element::parse_str("<a></b>").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));

        assert!(Element::parse_str(&nested(MAX_DEPTH)).is_ok());
        match Element::parse_str(&nested(MAX_DEPTH + 1)) {
            Err(PlistError::InvalidRoot(msg)) => assert!(msg.contains("nesting too deep")),
            other => panic!("Expected InvalidRoot, got {other:?}"),
        }

        let empty_leaf = format!("{}<b/>{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert!(matches!(
            Element::parse_str(&empty_leaf),
            Err(PlistError::InvalidRoot(_))
        ));
        assert!(Element::parse_str(&nested(100_000)).is_err());
    }

    #[test]
    fn test_write_escapes_and_self_closes() {
        let mut root = Element::new("plist").with_attribute("version", "1.0");
        root.sub_element("string").text = Some("a<b & 'c'".to_string());
        root.sub_element("true");
        assert_eq!(
            root.to_xml_string().unwrap(),
            "<plist version=\"1.0\"><string>a&lt;b &amp; &apos;c&apos;</string><true/></plist>"
        );
    }

    #[test]
    fn test_write_then_parse_keeps_structure() {
        let mut root = Element::new("r");
        let child = root.sub_element("k");
        child.text = Some("x & y".to_string());
        child.tail = Some("\n".to_string());
        let back = Element::parse_str(&root.to_xml_string().unwrap()).unwrap();
        assert_eq!(back, root);
    }
}
