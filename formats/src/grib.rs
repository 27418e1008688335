//! GRIB container identification.
//!
//! No field decoding here, just enough of editions 1 and 2 to tell what
//! a downloaded file holds: indicator sections, message lengths and the
//! closing `7777` markers.
//!

use eyre::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;
use tracing::trace;

const MAGIC: &[u8; 4] = b"GRIB";
const TRAILER: &[u8; 4] = b"7777";

#[derive(Debug, Error, PartialEq)]
pub enum GribError {
    #[error("no GRIB indicator found")]
    NotGrib,
    #[error("unsupported GRIB edition {0} at offset {1}")]
    BadEdition(u8, usize),
    #[error("truncated message at offset {0}, need {1} bytes")]
    Truncated(usize, usize),
    #[error("missing 7777 trailer for message at offset {0}")]
    NoTrailer(usize),
}

/// One identified GRIB message.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GribMessage {
    pub offset: usize,
    pub edition: u8,
    pub length: usize,
    /// Discipline octet, edition 2 only.
    pub discipline: Option<u8>,
}

/// Identification summary for a whole file.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GribInfo {
    pub messages: Vec<GribMessage>,
}

impl GribInfo {
    pub fn total_length(&self) -> usize {
        self.messages.iter().map(|m| m.length).sum()
    }

    /// Scan a byte buffer for GRIB messages.
    ///
    #[tracing::instrument(skip(data))]
    pub fn scan(data: &[u8]) -> Result<Self, GribError> {
        let mut messages = vec![];
        let mut offset = 0;

        while offset + 8 <= data.len() {
            if &data[offset..offset + 4] != MAGIC {
                offset += 1;
                continue;
            }

            let edition = data[offset + 7];
            let (length, discipline) = match edition {
                1 => {
                    // 24-bit total length right after the magic
                    let l = (usize::from(data[offset + 4]) << 16)
                        | (usize::from(data[offset + 5]) << 8)
                        | usize::from(data[offset + 6]);
                    (l, None)
                }
                2 => {
                    if offset + 16 > data.len() {
                        return Err(GribError::Truncated(offset, 16));
                    }
                    let mut l = 0usize;
                    for b in &data[offset + 8..offset + 16] {
                        l = (l << 8) | usize::from(*b);
                    }
                    (l, Some(data[offset + 6]))
                }
                e => return Err(GribError::BadEdition(e, offset)),
            };

            // Shortest possible message: indicator section plus trailer.
            let min = if edition == 1 { 12 } else { 20 };
            if length < min {
                return Err(GribError::Truncated(offset, min));
            }
            if offset + length > data.len() {
                return Err(GribError::Truncated(offset, length));
            }
            if &data[offset + length - 4..offset + length] != TRAILER {
                return Err(GribError::NoTrailer(offset));
            }

            messages.push(GribMessage {
                offset,
                edition,
                length,
                discipline,
            });
            offset += length;
        }

        if messages.is_empty() {
            return Err(GribError::NotGrib);
        }
        trace!("{} message(s)", messages.len());
        Ok(GribInfo { messages })
    }

    /// Render with `tabled`.
    ///
    pub fn list(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(vec!["Offset", "Edition", "Length", "Discipline"]);

        self.messages.iter().for_each(|m| {
            builder.push_record(vec![
                m.offset.to_string(),
                m.edition.to_string(),
                m.length.to_string(),
                m.discipline.map_or("-".to_string(), |d| d.to_string()),
            ]);
        });

        let all = builder.build().with(Style::modern()).to_string();
        format!(
            "{all}\n{} message(s), {} bytes",
            self.messages.len(),
            self.total_length()
        )
    }
}
