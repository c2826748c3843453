//! In-memory PPTX document that can drop its pictures and be saved again.

use crate::rewrite::remove_shapes;
use slidepics_core::{Error, PresentationDocument, Result, Slide};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Raw XML of one slide part.
#[derive(Debug, Clone)]
pub(crate) struct SlidePart {
    name: String,
    xml: Vec<u8>,
}

impl SlidePart {
    pub(crate) fn new(name: String, xml: Vec<u8>) -> Self {
        Self { name, xml }
    }
}

/// A parsed presentation together with the package it came from.
///
/// Saving copies every package entry unchanged except the slide parts that
/// were rewritten by [`PresentationDocument::remove_pictures`].
#[derive(Debug)]
pub struct PptxDocument {
    data: Vec<u8>,
    slides: Vec<Slide>,
    parts: Vec<SlidePart>,
    rewritten: HashMap<String, Vec<u8>>,
}

impl PptxDocument {
    pub(crate) fn new(data: Vec<u8>, slides: Vec<Slide>, parts: Vec<SlidePart>) -> Self {
        Self {
            data,
            slides,
            parts,
            rewritten: HashMap::new(),
        }
    }

    /// Part names of the slides, in presentation order.
    pub fn slide_part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    /// Whether any slide part differs from the source package.
    pub fn is_modified(&self) -> bool {
        !self.rewritten.is_empty()
    }

    /// Serialize the package into any seekable writer.
    pub fn write_to<W: Write + std::io::Seek>(&self, writer: W) -> Result<()> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))
            .map_err(|e| Error::ZipError(format!("Failed to reopen ZIP: {}", e)))?;
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            let replacement = self.rewritten.get(entry.name());

            match replacement {
                Some(xml) => {
                    let name = entry.name().to_string();
                    drop(entry);
                    zip.start_file(name.as_str(), options)
                        .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
                    zip.write_all(xml)?;
                }
                None => {
                    let name = entry.name().to_string();
                    zip.raw_copy_file(entry)
                        .map_err(|e| Error::ZipError(format!("Failed to copy '{}': {}", name, e)))?;
                }
            }
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(())
    }
}

impl PresentationDocument for PptxDocument {
    fn slides(&self) -> &[Slide] {
        &self.slides
    }

    fn remove_pictures(&mut self) -> Result<usize> {
        let mut removed = 0;

        for (slide, part) in self.slides.iter_mut().zip(self.parts.iter_mut()) {
            let positions: Vec<usize> = slide
                .shapes
                .iter()
                .enumerate()
                .filter(|(_, shape)| shape.is_picture())
                .map(|(idx, _)| idx)
                .collect();
            if positions.is_empty() {
                continue;
            }

            part.xml = remove_shapes(&part.xml, &positions)?;
            self.rewritten.insert(part.name.clone(), part.xml.clone());
            slide.shapes.retain(|shape| !shape.is_picture());
            removed += positions.len();

            log::debug!("Removed {} pictures from {}", positions.len(), part.name);
        }

        Ok(removed)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
