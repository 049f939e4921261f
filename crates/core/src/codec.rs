//! Record transcoding between XML uploads and JSON artifacts.
//!
//! Decode consumes an XML document whose root wraps zero or more sibling
//! record elements; encode emits the records as a pretty-printed JSON array
//! with stable lowercase field names in the fixed order category, creator,
//! label, year, collection, price. The conversion is structure-preserving,
//! not byte-preserving: the same input always produces the same output, but
//! the output is a different format entirely.

use crate::{CoreError, CoreResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// One domain entry carried by an upload.
///
/// Immutable once parsed; a record only exists for the duration of a single
/// conversion call. Field declaration order is the JSON output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub category: String,
    pub creator: String,
    pub label: String,
    pub year: i32,
    pub collection: Option<String>,
    pub price: Option<f64>,
}

/// Accumulates field text for one record element during decode.
#[derive(Debug, Default)]
struct RecordDraft {
    category: Option<String>,
    creator: Option<String>,
    label: Option<String>,
    year: Option<String>,
    collection: Option<String>,
    price: Option<String>,
}

impl RecordDraft {
    /// Stores one child element's text; unknown elements are ignored.
    fn set(&mut self, field: &str, value: String) {
        match field {
            "category" => self.category = Some(value),
            "creator" => self.creator = Some(value),
            "label" => self.label = Some(value),
            "year" => self.year = Some(value),
            "collection" => self.collection = Some(value),
            "price" => self.price = Some(value),
            _ => {}
        }
    }

    /// Validates the accumulated fields into a [`Record`].
    ///
    /// `category`, `creator`, `label`, and `year` are required; `year` must
    /// parse as an integer and a present `price` as a decimal.
    fn finish(self, index: usize) -> CoreResult<Record> {
        let category = self.category.ok_or(CoreError::MissingField {
            index,
            field: "category",
        })?;
        let creator = self.creator.ok_or(CoreError::MissingField {
            index,
            field: "creator",
        })?;
        let label = self.label.ok_or(CoreError::MissingField {
            index,
            field: "label",
        })?;
        let year_text = self.year.ok_or(CoreError::MissingField {
            index,
            field: "year",
        })?;

        let year = year_text
            .trim()
            .parse::<i32>()
            .map_err(|_| CoreError::InvalidFieldValue {
                index,
                field: "year",
                value: year_text.clone(),
            })?;

        let price = match self.price {
            Some(text) => Some(text.trim().parse::<f64>().map_err(|_| {
                CoreError::InvalidFieldValue {
                    index,
                    field: "price",
                    value: text.clone(),
                }
            })?),
            None => None,
        };

        Ok(Record {
            category,
            creator,
            label,
            year,
            collection: self.collection,
            price,
        })
    }
}

/// Decodes an XML document into its record sequence.
///
/// The root element's name is not significant, and neither are the record
/// element names; each direct child of the root becomes one record from its
/// own child elements. Decoding the same bytes twice yields equal sequences.
///
/// # Errors
///
/// Returns `CoreError::Xml` for malformed XML, `CoreError::MissingRoot` for
/// input without a root element, and `CoreError::MissingField` /
/// `CoreError::InvalidFieldValue` for records violating the schema.
pub fn decode(xml: &[u8]) -> CoreResult<Vec<Record>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut draft: Option<RecordDraft> = None;
    let mut field: Option<String> = None;
    let mut text = String::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                depth += 1;
                match depth {
                    1 => saw_root = true,
                    2 => draft = Some(RecordDraft::default()),
                    3 => {
                        field =
                            Some(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(start) => match depth {
                0 => saw_root = true,
                1 => {
                    // A record element with no children at all
                    let index = records.len();
                    records.push(RecordDraft::default().finish(index)?);
                }
                2 => {
                    if let Some(d) = draft.as_mut() {
                        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                        d.set(&name, String::new());
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if depth == 3 {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if depth == 3 {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(_) => {
                match depth {
                    3 => {
                        if let (Some(d), Some(name)) = (draft.as_mut(), field.take()) {
                            d.set(&name, std::mem::take(&mut text));
                        }
                    }
                    2 => {
                        if let Some(d) = draft.take() {
                            let index = records.len();
                            records.push(d.finish(index)?);
                        }
                    }
                    _ => {}
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(CoreError::MissingRoot);
    }

    Ok(records)
}

/// Encodes a record sequence as a pretty-printed JSON array.
///
/// Absent optionals serialize as `null`. The output is byte-identical
/// across repeated calls on the same input.
///
/// # Errors
///
/// Returns `CoreError::JsonEncode` if serialization fails; that cannot
/// happen for records produced by [`decode`].
pub fn encode(records: &[Record]) -> CoreResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}
