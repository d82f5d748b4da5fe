//! A library for converting Apple property lists to JSON and back.
//!
//! provides functionality to parse a tagged plist XML document into a generic
//! value tree, write that tree out as JSON, and rebuild a pretty-printed plist
//! (with its DOCTYPE header) from the JSON form.
//!
//! # Examples
//!
//! ```no_run
//! use plistsync::{ConvertOptions, PlistJsonConverter};
//!
//! // plist -> JSON
//! PlistJsonConverter::init("Info.plist", "Info.json", &ConvertOptions::default()).unwrap();
//!
//! // JSON -> plist (the plist file must already exist)
//! PlistJsonConverter::sync("Info.plist", "Info.json").unwrap();
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub mod cli;
mod converter;
mod element;
mod indent;
mod parser;
mod serializer;
mod value;

pub use converter::{ConvertOptions, PlistJsonConverter};
pub use element::{Element, MAX_DEPTH, encode_xml_entities};
pub use indent::indent;
pub use parser::{PlistTag, TagPolicy, parse_array, parse_dict, parse_root};
pub use serializer::{build_root, serialize_array, serialize_dict};
pub use value::{PropertyList, Value, decode_composite_key, encode_composite_key};

/// Error types for plist parsing and conversion
#[derive(Error, Debug)]
pub enum PlistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("Bad entity reference: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("Invalid UTF-8 in document: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown info property list type: {0}")]
    UnsupportedValueKind(String),
    #[error("Unknown property list tag <{0}>")]
    UnknownTag(String),
    #[error("<{value_tag}> appears in a dict without a preceding <key>")]
    ValueWithoutKey { value_tag: String },
    #[error("Key {0:?} has no value")]
    DanglingKey(String),
    #[error("Invalid root element: {0}")]
    InvalidRoot(String),
    #[error("Root element <{0}> has no version attribute")]
    MissingVersion(String),
    #[error("Invalid root key {0:?}, expected \"<tag> version=<version>\"")]
    InvalidCompositeKey(String),
    #[error("Invalid JSON document: {0}")]
    InvalidDocument(String),
    #[error("The given file with {} does not exist", .0.display())]
    MissingPlistFile(PathBuf),
    #[error("File not found please initialize tool with \"--init\"")]
    MissingJsonFile(PathBuf),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, PlistError>;

// Tag names
pub const TAG_KEY: &str = "key";
pub const TAG_STRING: &str = "string";
pub const TAG_TRUE: &str = "true";
pub const TAG_FALSE: &str = "false";
pub const TAG_DICT: &str = "dict";
pub const TAG_ARRAY: &str = "array";

/// Attribute on the root element carried through the composite key
pub const VERSION_ATTRIBUTE: &str = "version";

/// Key wrapping the root dict inside the JSON document
pub const JSON_DICT_KEY: &str = "dict";

/// Declaration spliced in front of every written plist
pub const PLIST_HEADER: &str = "<?xml version='1.0' encoding='utf-8'?>\n\
<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n";
