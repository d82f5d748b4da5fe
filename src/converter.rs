use crate::{
    Element, PLIST_HEADER, PlistError, PropertyList, Result, TagPolicy, build_root, indent,
    parse_root,
};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Settings for the plist -> JSON direction
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub policy: TagPolicy,
}

impl ConvertOptions {
    pub fn lenient() -> Self {
        Self {
            policy: TagPolicy::Lenient,
        }
    }
}

/// High-level converter between plist files and their JSON form
pub struct PlistJsonConverter;

impl PlistJsonConverter {
    /// Parse plist XML text into a [`PropertyList`]
    pub fn parse_plist(xml: &str, options: &ConvertOptions) -> Result<PropertyList> {
        let root = Element::parse_str(xml)?;
        parse_root(&root, options.policy)
    }

    /// Render a [`PropertyList`] as a complete plist file body, header included
    ///
    /// # Examples
    ///
    /// ```
    /// use plistsync::{PlistJsonConverter, PropertyList};
    ///
    /// let plist = PropertyList::from_json_str(r#"{"plist version=1.0": {"dict": {"On": true}}}"#).unwrap();
    /// let xml = PlistJsonConverter::render_plist(&plist).unwrap();
    /// assert!(xml.ends_with("<plist version=\"1.0\">\n  <dict>\n    <key>On</key>\n    <true/>\n  </dict>\n</plist>\n"));
    /// ```
    pub fn render_plist(plist: &PropertyList) -> Result<String> {
        let mut root = build_root(plist);
        indent(&mut root, 0);
        let body = root.to_xml_string()?;

        let mut document = String::with_capacity(PLIST_HEADER.len() + body.len());
        document.push_str(PLIST_HEADER);
        document.push_str(&body);
        Ok(document)
    }

    /// Convert plist XML text to the JSON document text
    ///
    /// # Examples
    ///
    /// ```
    /// use plistsync::{ConvertOptions, PlistJsonConverter};
    ///
    /// let json = PlistJsonConverter::plist_to_json(
    ///     "<plist version=\"1.0\"><dict><key>Name</key><string>Tool</string></dict></plist>",
    ///     &ConvertOptions::default(),
    /// )
    /// .unwrap();
    /// assert!(json.contains("\"plist version=1.0\""));
    /// ```
    pub fn plist_to_json(xml: &str, options: &ConvertOptions) -> Result<String> {
        Self::parse_plist(xml, options)?.to_json_string()
    }

    /// Convert JSON document text to a full plist file body
    pub fn json_to_plist(json: &str) -> Result<String> {
        let plist = PropertyList::from_json_str(json)?;
        Self::render_plist(&plist)
    }

    /// Init mode: read `plist_path`, write its JSON form to `json_path`.
    ///
    /// The JSON file is overwritten unconditionally.
    pub fn init<P: AsRef<Path>, Q: AsRef<Path>>(
        plist_path: P,
        json_path: Q,
        options: &ConvertOptions,
    ) -> Result<()> {
        let plist_path = plist_path.as_ref();
        let json_path = json_path.as_ref();
        tracing::debug!("reading plist from {}", plist_path.display());

        let xml = fs::read_to_string(plist_path)?;
        let plist = Self::parse_plist(&xml, options)?;
        tracing::debug!(
            "parsed <{}> version {} with {} top-level keys",
            plist.root_tag,
            plist.version,
            plist.root.len()
        );

        let json = plist.to_json_string()?;
        write_replacing(json_path, json.as_bytes())?;
        tracing::info!("wrote {}", json_path.display());
        Ok(())
    }

    /// Sync mode: rebuild `plist_path` from the JSON at `json_path`.
    ///
    /// Fails with [`PlistError::MissingJsonFile`] when the JSON is absent and
    /// [`PlistError::MissingPlistFile`] when the plist does not exist yet. The
    /// plist is only touched once the whole document has been rendered.
    pub fn sync<P: AsRef<Path>, Q: AsRef<Path>>(plist_path: P, json_path: Q) -> Result<()> {
        let plist_path = plist_path.as_ref();
        let json_path = json_path.as_ref();
        tracing::debug!("reading JSON from {}", json_path.display());

        let json = fs::read_to_string(json_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PlistError::MissingJsonFile(json_path.to_path_buf()),
            _ => PlistError::Io(e),
        })?;
        let plist = PropertyList::from_json_str(&json)?;

        if !plist_path.exists() {
            return Err(PlistError::MissingPlistFile(plist_path.to_path_buf()));
        }

        let document = Self::render_plist(&plist)?;
        write_replacing(plist_path, document.as_bytes())?;
        tracing::info!("wrote {}", plist_path.display());
        Ok(())
    }
}

/// Replace `path` with `contents` via a temporary file next to the real target.
///
/// Symlinks are followed and the target keeps its permissions; a target that
/// does not exist yet is created first so it gets the default mode.
fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let created = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => true,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => false,
        Err(e) => return Err(e.into()),
    };

    let result = replace_existing(path, contents);
    if result.is_err() && created {
        let _ = fs::remove_file(path);
    }
    result
}

fn replace_existing(path: &Path, contents: &[u8]) -> Result<()> {
    let target = fs::canonicalize(path)?;
    let permissions = fs::metadata(&target)?.permissions();
    let dir = target.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.as_file().set_permissions(permissions)?;
    temp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}
