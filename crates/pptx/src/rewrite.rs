//! Streaming removal of shapes from slide XML.

use crate::parser::{in_shape_tree, is_shape_element, local_name};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use slidepics_core::{Error, Result};

/// Copy `xml`, dropping the top-level shapes of `p:cSld/p:spTree` whose
/// 0-based position is listed in `remove`.
///
/// Everything else, including whitespace and the order of the remaining
/// shapes, is written back as read.
pub(crate) fn remove_shapes(xml: &[u8], remove: &[usize]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape_index = 0;
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::XmlError(format!(
                "Error rewriting slide at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => {
                    return Err(Error::XmlError("Unexpected end of slide XML".to_string()))
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(ref e) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());

                if in_shape_tree(&stack) && is_shape_element(name) {
                    shape_index += 1;
                    if remove.contains(&(shape_index - 1)) {
                        skip_depth = 1;
                        continue;
                    }
                }
                stack.push(name.to_vec());
            }
            Event::Empty(ref e) => {
                let qname = e.name();
                if in_shape_tree(&stack) && is_shape_element(local_name(qname.as_ref())) {
                    shape_index += 1;
                    if remove.contains(&(shape_index - 1)) {
                        continue;
                    }
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }

        writer
            .write_event(event)
            .map_err(|e| Error::XmlError(format!("Error writing slide: {}", e)))?;
    }

    Ok(writer.into_inner())
}
