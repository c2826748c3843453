//! Open Packaging Conventions helpers: part access, content types and
//! relationships.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slidepics_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Package-level relationships part.
pub const ROOT_RELS_PART: &str = "_rels/.rels";

/// Fallback content type for parts of unknown type.
const OCTET_STREAM: &str = "application/octet-stream";

/// A relationship from one part to another part or an external resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id referenced from the source part, e.g. `rId2`.
    pub id: String,
    /// Relationship type URI.
    pub rel_type: String,
    /// Target as written, relative to the source part unless external.
    pub target: String,
    /// `TargetMode="External"`: the target is a URI, not a part.
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends with `/{suffix}`, matching both the
    /// transitional and strict OOXML namespaces.
    pub fn is_type(&self, suffix: &str) -> bool {
        self.rel_type
            .rsplit('/')
            .next()
            .is_some_and(|last| last == suffix)
    }
}

/// Read a whole part from the archive.
pub fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => Error::MissingPart(name.to_string()),
        e => Error::ZipError(format!("Failed to open '{}': {}", name, e)),
    })?;

    let mut content = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

    Ok(content)
}

/// Name of the relationships part belonging to `part`.
///
/// `ppt/slides/slide1.xml` gives `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
///
/// Relative targets are joined onto the source part's folder with `.` and
/// `..` segments folded; absolute targets (`/ppt/...`) are taken from the
/// package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    let relative = match target.strip_prefix('/') {
        Some(absolute) => absolute,
        None => {
            if let Some((dir, _)) = source_part.rsplit_once('/') {
                segments.extend(dir.split('/').filter(|s| !s.is_empty()));
            }
            target
        }
    };

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}

/// Parse a relationships part.
pub fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = attribute_value(&attr);
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value.eq_ignore_ascii_case("External"),
                        _ => {}
                    }
                }

                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Content types declared in `[Content_Types].xml`.
#[derive(Debug, Default, Clone)]
pub struct ContentTypes {
    /// Lower-cased extension to content type.
    defaults: HashMap<String, String>,
    /// Lower-cased part name (with leading `/`) to content type.
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse the content types part.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);
        let mut types = Self::default();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match e.local_name().as_ref() {
                        b"Default" => {
                            if let (Some(ext), Some(ct)) =
                                (find_attribute(e, b"Extension"), find_attribute(e, b"ContentType"))
                            {
                                types.defaults.insert(ext.to_lowercase(), ct);
                            }
                        }
                        b"Override" => {
                            if let (Some(part), Some(ct)) =
                                (find_attribute(e, b"PartName"), find_attribute(e, b"ContentType"))
                            {
                                types.overrides.insert(part.to_lowercase(), ct);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing content types: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(types)
    }

    /// Content type of `part_name` (no leading `/`).
    ///
    /// Overrides win over extension defaults; unknown parts fall back to a
    /// guess from the extension.
    pub fn content_type_for(&self, part_name: &str) -> String {
        let key = format!("/{}", part_name.trim_start_matches('/')).to_lowercase();
        if let Some(ct) = self.overrides.get(&key) {
            return ct.clone();
        }

        let ext = part_extension(part_name).to_lowercase();
        if let Some(ct) = self.defaults.get(&ext) {
            return ct.clone();
        }

        guess_content_type(&ext).to_string()
    }
}

/// Detect the image format from its leading bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some("image/tiff")
    } else if bytes.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
        Some("image/x-wmf")
    } else if bytes.len() >= 44 && &bytes[40..44] == b" EMF" {
        Some("image/x-emf")
    } else {
        None
    }
}

/// Content type commonly used for a file extension.
fn guess_content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" | "jpe" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" | "dib" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => OCTET_STREAM,
    }
}

fn part_extension(part_name: &str) -> &str {
    let file = part_name.rsplit('/').next().unwrap_or(part_name);
    match file.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// Value of the unprefixed attribute `key`, unescaped.
pub(crate) fn find_attribute(element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| attribute_value(&attr))
}

pub(crate) fn attribute_value(attr: &quick_xml::events::attributes::Attribute) -> String {
    attr.unescape_value()
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
}
