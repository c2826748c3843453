//! PPTX file parser implementation.

use crate::document::{PptxDocument, SlidePart};
use crate::package::{
    self, read_part, rels_part_name, resolve_target, ContentTypes, Relationship,
    CONTENT_TYPES_PART, ROOT_RELS_PART,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slidepics_core::{
    DocumentLoader, Error, ImageContent, OtherShape, PictureShape, Result, Shape, Slide,
};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Main part used when the package relationships do not name one.
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Local names of the elements that count as shapes inside `p:spTree`.
const SHAPE_ELEMENTS: [&[u8]; 6] = [
    b"sp",
    b"grpSp",
    b"graphicFrame",
    b"cxnSp",
    b"pic",
    b"contentPart",
];

/// Local names marking a picture element as a media placeholder.
const MEDIA_ELEMENTS: [&[u8]; 5] = [
    b"videoFile",
    b"audioFile",
    b"quickTimeFile",
    b"wavAudioFile",
    b"media",
];

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    ///
    /// The whole package is kept in memory so the document can be saved
    /// again without touching the source file.
    pub fn parse<R: Read>(&self, mut reader: R) -> Result<PptxDocument> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.parse_bytes(data)
    }

    /// Parse a PPTX package held in memory.
    pub fn parse_bytes(&self, data: Vec<u8>) -> Result<PptxDocument> {
        let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let content_types = ContentTypes::parse(&read_part(&mut archive, CONTENT_TYPES_PART)?)?;
        let presentation_part = self.get_presentation_part(&mut archive)?;
        let slide_order = self.get_slide_order(&mut archive, &presentation_part)?;

        let mut slides = Vec::with_capacity(slide_order.len());
        let mut parts = Vec::with_capacity(slide_order.len());

        // Parse each slide in order
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let (slide, xml) =
                self.parse_slide(&mut archive, &content_types, slide_path, idx + 1)?;
            log::debug!(
                "Slide {} ({}): {} shapes, {} pictures",
                slide.number,
                slide_path,
                slide.shapes.len(),
                slide.picture_count()
            );
            slides.push(slide);
            parts.push(SlidePart::new(slide_path.clone(), xml));
        }

        drop(archive);
        Ok(PptxDocument::new(data, slides, parts))
    }

    /// Find the main presentation part through the package relationships.
    fn get_presentation_part<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<String> {
        let rels = match read_part(archive, ROOT_RELS_PART) {
            Ok(xml) => package::parse_relationships(&xml)?,
            Err(Error::MissingPart(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        Ok(rels
            .iter()
            .find(|r| r.is_type("officeDocument") && !r.external)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string()))
    }

    /// Get the ordered list of slide part names.
    ///
    /// The order is the `p:sldIdLst` of the presentation part. Packages without
    /// one fall back to the slide relationships sorted by slide number.
    fn get_slide_order<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        presentation_part: &str,
    ) -> Result<Vec<String>> {
        let rels_content = read_part(archive, &rels_part_name(presentation_part))?;
        let rels = package::parse_relationships(&rels_content)?;

        let presentation_xml = read_part(archive, presentation_part)?;
        let slide_ids = slide_id_list(&presentation_xml)?;

        if !slide_ids.is_empty() {
            return slide_ids
                .iter()
                .map(|id| {
                    rels.iter()
                        .find(|r| &r.id == id && r.is_type("slide"))
                        .map(|r| resolve_target(presentation_part, &r.target))
                        .ok_or_else(|| {
                            Error::MissingPart(format!(
                                "slide relationship {} of {}",
                                id, presentation_part
                            ))
                        })
                })
                .collect();
        }

        log::debug!("No slide id list in {}, ordering by relationship", presentation_part);
        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|r| r.is_type("slide") && !r.external)
            .map(|r| {
                let order_num = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
                (resolve_target(presentation_part, &r.target), order_num)
            })
            .collect();

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    ///
    /// Returns the slide together with its raw XML, which is needed later to
    /// remove pictures.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        content_types: &ContentTypes,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<(Slide, Vec<u8>)> {
        let content = read_part(archive, slide_path)?;
        let rels = match read_part(archive, &rels_part_name(slide_path)) {
            Ok(xml) => package::parse_relationships(&xml)?,
            Err(Error::MissingPart(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let mut slide = Slide::new(slide_number);
        for info in extract_shapes_from_xml(&content)? {
            let shape = self.classify_shape(archive, content_types, slide_path, &rels, info)?;
            slide.add_shape(shape);
        }

        Ok((slide, content))
    }

    /// Turn raw shape information into a [`Shape`], loading picture bytes.
    fn classify_shape<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        content_types: &ContentTypes,
        slide_path: &str,
        rels: &[Relationship],
        info: ShapeInfo,
    ) -> Result<Shape> {
        let embed = match info.embed {
            Some(ref embed) if info.kind == "pic" && !info.has_media => embed,
            _ => return Ok(Shape::Other(OtherShape { kind: info.kind })),
        };

        let rel = rels.iter().find(|r| &r.id == embed).ok_or_else(|| {
            Error::MissingPart(format!("image relationship {} of {}", embed, slide_path))
        })?;

        if rel.external {
            log::debug!("Skipping linked picture {} in {}", rel.target, slide_path);
            return Ok(Shape::Other(OtherShape { kind: info.kind }));
        }

        let image_part = resolve_target(slide_path, &rel.target);
        let bytes = read_part(archive, &image_part)?;
        let content_type = package::sniff_image_type(&bytes)
            .map(str::to_string)
            .unwrap_or_else(|| content_types.content_type_for(&image_part));

        Ok(Shape::Picture(PictureShape {
            name: info.name,
            image: ImageContent::new(bytes, content_type),
        }))
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for PptxParser {
    type Document = PptxDocument;

    fn extension(&self) -> &str {
        "pptx"
    }

    fn open(&self, path: &Path) -> Result<PptxDocument> {
        let data = std::fs::read(path)?;
        self.parse_bytes(data)
    }
}

/// Information about a top-level shape extracted from slide XML.
#[derive(Debug, Default, PartialEq)]
struct ShapeInfo {
    kind: String,
    name: Option<String>,
    embed: Option<String>,
    has_media: bool,
}

impl ShapeInfo {
    fn new(element: &BytesStart) -> Self {
        let qname = element.name();
        Self {
            kind: String::from_utf8_lossy(local_name(qname.as_ref())).into_owned(),
            ..Self::default()
        }
    }

    /// Record what a descendant element tells about this shape.
    fn inspect(&mut self, element: &BytesStart) {
        if self.kind != "pic" {
            return;
        }

        let qname = element.name();
        let name = local_name(qname.as_ref());

        if name == b"cNvPr" && self.name.is_none() {
            self.name = package::find_attribute(element, b"name");
        } else if name == b"blip" {
            for attr in element.attributes().flatten() {
                if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"embed" {
                    self.embed = Some(package::attribute_value(&attr));
                }
            }
        } else if MEDIA_ELEMENTS.contains(&name) {
            self.has_media = true;
        }
    }
}

/// Whether the innermost open elements are `cSld/spTree`.
pub(crate) fn in_shape_tree(stack: &[Vec<u8>]) -> bool {
    matches!(stack, [.., c_sld, sp_tree] if c_sld == b"cSld" && sp_tree == b"spTree")
}

/// Whether an element with this local name is a shape.
pub(crate) fn is_shape_element(name: &[u8]) -> bool {
    SHAPE_ELEMENTS.contains(&name)
}

/// Extract the top-level shapes of `p:cSld/p:spTree`, in document order.
fn extract_shapes_from_xml(xml: &[u8]) -> Result<Vec<ShapeInfo>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut shapes = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<(ShapeInfo, usize)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());

                if let Some((ref mut shape, _)) = current {
                    shape.inspect(e);
                } else if in_shape_tree(&stack) && is_shape_element(name) {
                    current = Some((ShapeInfo::new(e), stack.len() + 1));
                }
                stack.push(name.to_vec());
            }
            Ok(Event::Empty(ref e)) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());

                if let Some((ref mut shape, _)) = current {
                    shape.inspect(e);
                } else if in_shape_tree(&stack) && is_shape_element(name) {
                    shapes.push(ShapeInfo::new(e));
                }
            }
            Ok(Event::End(_)) => {
                if let Some((_, depth)) = current {
                    if depth == stack.len() {
                        if let Some((shape, _)) = current.take() {
                            shapes.push(shape);
                        }
                    }
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing slide at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

/// Relationship ids of `p:sldIdLst/p:sldId`, in presentation order.
fn slide_id_list(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sldId" =>
            {
                // `id` is the numeric slide id; the prefixed `r:id` is the relationship.
                for attr in e.attributes().flatten() {
                    if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
                        ids.push(package::attribute_value(&attr));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
