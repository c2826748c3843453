//! Builds small but well-formed .pptx packages for tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_VIDEO: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/video";
const REL_OFFICE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

pub const APP_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?><Properties><Application>Test</Application></Properties>"#;

pub fn png_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(b"fake png body");
    bytes
}

pub fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(b"fake jpeg body");
    bytes
}

/// One top-level shape of a fixture slide.
#[derive(Debug, Clone)]
pub enum Item {
    Text(&'static str),
    Picture { media: &'static str, bytes: Vec<u8> },
    LinkedPicture(&'static str),
    Video { poster: &'static str, bytes: Vec<u8> },
}

#[derive(Debug, Default)]
pub struct PptxBuilder {
    slides: Vec<Vec<Item>>,
    reversed: bool,
    skip_media: bool,
}

impl PptxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, items: Vec<Item>) -> Self {
        self.slides.push(items);
        self
    }

    /// List the slides in `sldIdLst` in reverse part order.
    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// Leave the media parts out of the package.
    pub fn without_media(mut self) -> Self {
        self.skip_media = true;
        self
    }

    pub fn write(&self, path: &Path) {
        fs::write(path, self.build()).unwrap();
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut data));
            let options = FileOptions::default();
            let mut media_written = HashSet::new();

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(self.content_types().as_bytes()).unwrap();

            zip.start_file("_rels/.rels", options).unwrap();
            zip.write_all(
                rels(&[format!(
                    r#"<Relationship Id="rId1" Type="{}" Target="ppt/presentation.xml"/>"#,
                    REL_OFFICE
                )])
                .as_bytes(),
            )
            .unwrap();

            zip.start_file("docProps/app.xml", options).unwrap();
            zip.write_all(APP_XML).unwrap();

            zip.start_file("ppt/presentation.xml", options).unwrap();
            zip.write_all(self.presentation().as_bytes()).unwrap();

            zip.start_file("ppt/_rels/presentation.xml.rels", options).unwrap();
            let slide_rels: Vec<String> = (0..self.slides.len())
                .map(|i| {
                    format!(
                        r#"<Relationship Id="rId{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                        i + 2,
                        REL_SLIDE,
                        i + 1
                    )
                })
                .collect();
            zip.write_all(rels(&slide_rels).as_bytes()).unwrap();

            for (idx, items) in self.slides.iter().enumerate() {
                let (xml, relationships) = slide_xml(items);

                zip.start_file(format!("ppt/slides/slide{}.xml", idx + 1), options)
                    .unwrap();
                zip.write_all(xml.as_bytes()).unwrap();

                zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", idx + 1), options)
                    .unwrap();
                zip.write_all(rels(&relationships).as_bytes()).unwrap();

                if self.skip_media {
                    continue;
                }
                for item in items {
                    let (media, bytes) = match item {
                        Item::Picture { media, bytes } => (media, bytes),
                        Item::Video { poster, bytes } => (poster, bytes),
                        _ => continue,
                    };
                    if media_written.insert(media.to_string()) {
                        zip.start_file(format!("ppt/media/{}", media), options).unwrap();
                        zip.write_all(bytes).unwrap();
                    }
                }
            }

            zip.finish().unwrap();
        }
        data
    }

    fn content_types(&self) -> String {
        let mut overrides = String::from(
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
        );
        for i in 0..self.slides.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i + 1
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="jpg" ContentType="image/jpeg"/><Default Extension="gif" ContentType="image/gif"/>{}</Types>"#,
            overrides
        )
    }

    fn presentation(&self) -> String {
        let mut order: Vec<usize> = (0..self.slides.len()).collect();
        if self.reversed {
            order.reverse();
        }

        let ids: String = order
            .iter()
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#,
            NS, ids
        )
    }
}

fn rels(relationships: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        relationships.concat()
    )
}

fn slide_xml(items: &[Item]) -> (String, Vec<String>) {
    let mut shapes = String::new();
    let mut relationships = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        let id = idx + 2;
        let rid = format!("rId{}", relationships.len() + 1);

        match item {
            Item::Text(text) => shapes.push_str(&format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
            )),
            Item::Picture { media, .. } => {
                relationships.push(format!(
                    r#"<Relationship Id="{rid}" Type="{REL_IMAGE}" Target="../media/{media}"/>"#
                ));
                shapes.push_str(&format!(
                    r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#
                ));
            }
            Item::LinkedPicture(url) => {
                relationships.push(format!(
                    r#"<Relationship Id="{rid}" Type="{REL_IMAGE}" Target="{url}" TargetMode="External"/>"#
                ));
                shapes.push_str(&format!(
                    r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Linked {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:link="{rid}"/></p:blipFill><p:spPr/></p:pic>"#
                ));
            }
            Item::Video { poster, .. } => {
                let video_rid = format!("rId{}", relationships.len() + 2);
                relationships.push(format!(
                    r#"<Relationship Id="{rid}" Type="{REL_IMAGE}" Target="../media/{poster}"/>"#
                ));
                relationships.push(format!(
                    r#"<Relationship Id="{video_rid}" Type="{REL_VIDEO}" Target="https://example.com/clip.mp4" TargetMode="External"/>"#
                ));
                shapes.push_str(&format!(
                    r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Video {id}"/><p:cNvPicPr/><p:nvPr><a:videoFile r:link="{video_rid}"/></p:nvPr></p:nvPicPr><p:blipFill><a:blip r:embed="{rid}"/></p:blipFill><p:spPr/></p:pic>"#
                ));
            }
        }
    }

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:sld>"#
    );

    (xml, relationships)
}

/// Read one entry of a zip file on disk.
pub fn read_entry(path: &Path, name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}

/// Names of all entries of a zip file on disk, in archive order.
pub fn entry_names(path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}
