//! AIS AIVDM frame decoding.
//!
//! Covers the message types seen on a leisure-craft VHF receiver:
//! position reports (1/2/3 and class B 18) and static & voyage data (5).
//! Everything else is surfaced as `Unsupported` with its type number so
//! the stats stay honest.
//!

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use crate::Sentence;

#[derive(Debug, Error, PartialEq)]
pub enum AisError {
    #[error("not an AIVDM sentence: {0}")]
    NotAivdm(String),
    #[error("bad fragment header in {0}")]
    BadFragment(String),
    #[error("continuation frame {0} with no pending first part")]
    OrphanContinuation(String),
    #[error("first part repeated for message id {0}")]
    DuplicateFirst(String),
    #[error("invalid six-bit character {0:?}")]
    BadSixBit(char),
    #[error("payload too short: {0} bits, need {1}")]
    ShortPayload(usize, usize),
}

/// Unpacked six-bit payload.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitVec(Vec<bool>);

impl BitVec {
    /// Undo the six-bit ASCII armoring.
    ///
    pub fn unarmor(payload: &str, fill: u32) -> Result<Self, AisError> {
        let mut bits = Vec::with_capacity(payload.len() * 6);
        for ch in payload.chars() {
            let mut v = (ch as i32) - 48;
            if v > 40 {
                v -= 8;
            }
            if !(0..64).contains(&v) {
                return Err(AisError::BadSixBit(ch));
            }
            (0..6).rev().for_each(|i| bits.push((v >> i) & 1 == 1));
        }
        bits.truncate(bits.len().saturating_sub(fill as usize));
        Ok(BitVec(bits))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unsigned big-endian field over `[a, b)`.
    ///
    pub fn uint(&self, a: usize, b: usize) -> Result<u32, AisError> {
        if b > self.0.len() {
            return Err(AisError::ShortPayload(self.0.len(), b));
        }
        Ok(self.0[a..b].iter().fold(0, |acc, &bit| (acc << 1) | u32::from(bit)))
    }

    /// Two's-complement signed field over `[a, b)`.
    ///
    pub fn int(&self, a: usize, b: usize) -> Result<i32, AisError> {
        let v = self.uint(a, b)?;
        let n = b - a;
        if self.0[a] {
            Ok(v as i32 - (1 << n))
        } else {
            Ok(v as i32)
        }
    }

    /// Six-bit text field, `@` padding and outer spaces stripped.
    ///
    pub fn text(&self, a: usize, b: usize) -> String {
        let end = b.min(self.0.len());
        (a..end)
            .step_by(6)
            .filter(|i| i + 6 <= end)
            .map(|i| {
                let v = self.0[i..i + 6]
                    .iter()
                    .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit));
                if v < 32 {
                    char::from(v + 64)
                } else {
                    char::from(v)
                }
            })
            .collect::<String>()
            .replace('@', "")
            .trim()
            .to_string()
    }
}

/// Position report, types 1/2/3 (class A) and 18 (class B).
///
#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    pub mmsi: u32,
    /// Navigation status, class A only.
    pub status: Option<u32>,
    /// Speed over ground in knots, 102.3 means unavailable.
    pub sog: f64,
    pub lon: f64,
    pub lat: f64,
    /// Course over ground in degrees.
    pub cog: f64,
    /// True heading, 511 means unavailable.
    pub heading: u32,
    pub second: u32,
}

/// Static and voyage related data, type 5.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Static {
    pub mmsi: u32,
    pub imo: u32,
    pub callsign: String,
    pub shipname: String,
    pub shiptype: u32,
    /// Draught in metres.
    pub draught: f64,
    pub destination: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Position(Position),
    Static(Static),
    Unsupported(u32),
}

impl Message {
    pub fn mmsi(&self) -> Option<u32> {
        match self {
            Message::Position(p) => Some(p.mmsi),
            Message::Static(s) => Some(s.mmsi),
            Message::Unsupported(_) => None,
        }
    }

    /// Decode an unarmored payload.
    ///
    #[tracing::instrument(skip(bits))]
    pub fn decode(bits: &BitVec) -> Result<Self, AisError> {
        let mtype = bits.uint(0, 6)?;
        let mmsi = bits.uint(8, 38)?;

        let msg = match mtype {
            1..=3 => Message::Position(Position {
                mmsi,
                status: Some(bits.uint(38, 42)?),
                sog: f64::from(bits.uint(50, 60)?) / 10.,
                lon: f64::from(bits.int(61, 89)?) / 600_000.,
                lat: f64::from(bits.int(89, 116)?) / 600_000.,
                cog: f64::from(bits.uint(116, 128)?) / 10.,
                heading: bits.uint(128, 137)?,
                second: bits.uint(137, 143)?,
            }),
            18 => Message::Position(Position {
                mmsi,
                status: None,
                sog: f64::from(bits.uint(46, 56)?) / 10.,
                lon: f64::from(bits.int(57, 85)?) / 600_000.,
                lat: f64::from(bits.int(85, 112)?) / 600_000.,
                cog: f64::from(bits.uint(112, 124)?) / 10.,
                heading: bits.uint(124, 133)?,
                second: bits.uint(133, 139)?,
            }),
            5 => Message::Static(Static {
                mmsi,
                imo: bits.uint(40, 70)?,
                callsign: bits.text(70, 112),
                shipname: bits.text(112, 232),
                shiptype: bits.uint(232, 240)?,
                draught: f64::from(bits.uint(294, 302)?) / 10.,
                destination: bits.text(302, 422),
            }),
            _ => Message::Unsupported(mtype),
        };
        Ok(msg)
    }
}

/// Pending multipart payload.
///
#[derive(Debug)]
struct Pending {
    count: u32,
    parts: Vec<Option<(String, u32)>>,
}

/// Reassembler for multipart AIVDM frames.
///
/// Frames are pushed in log order; a complete message pops out when its
/// last fragment arrives.
///
#[derive(Debug, Default)]
pub struct Assembler {
    pending: BTreeMap<String, Pending>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one AIVDM sentence, returning a decoded message when the
    /// payload is complete.
    ///
    #[tracing::instrument(skip(self))]
    pub fn push(&mut self, s: &Sentence) -> Result<Option<Message>, AisError> {
        if !s.is_aivdm() {
            return Err(AisError::NotAivdm(s.raw.clone()));
        }
        if s.fields.len() < 6 {
            return Err(AisError::BadFragment(s.raw.clone()));
        }
        let count: u32 = s.fields[0]
            .parse()
            .map_err(|_| AisError::BadFragment(s.raw.clone()))?;
        let index: u32 = s.fields[1]
            .parse()
            .map_err(|_| AisError::BadFragment(s.raw.clone()))?;
        if count == 0 || index == 0 || index > count {
            return Err(AisError::BadFragment(s.raw.clone()));
        }
        let msgid = s.fields[2].clone();
        let payload = s.fields[4].clone();
        let fill: u32 = s.fields[5]
            .parse()
            .map_err(|_| AisError::BadFragment(s.raw.clone()))?;

        // single fragment, straight through
        if count == 1 {
            let bits = BitVec::unarmor(&payload, fill)?;
            return Message::decode(&bits).map(Some);
        }

        let slot = self.pending.entry(msgid.clone()).or_insert_with(|| Pending {
            count,
            parts: vec![None; count as usize],
        });
        if slot.count != count {
            self.pending.remove(&msgid);
            return Err(AisError::BadFragment(s.raw.clone()));
        }
        let idx = (index - 1) as usize;
        if index == 1 && slot.parts[0].is_some() {
            self.pending.remove(&msgid);
            return Err(AisError::DuplicateFirst(msgid));
        }
        if index > 1 && slot.parts[0].is_none() {
            self.pending.remove(&msgid);
            return Err(AisError::OrphanContinuation(s.raw.clone()));
        }
        slot.parts[idx] = Some((payload, fill));

        if slot.parts.iter().any(Option::is_none) {
            return Ok(None);
        }

        // all fragments in, fill bits only count on the last one
        let slot = self
            .pending
            .remove(&msgid)
            .ok_or_else(|| AisError::BadFragment(s.raw.clone()))?;
        let mut whole = String::new();
        let mut fill = 0;
        slot.parts.into_iter().flatten().for_each(|(p, f)| {
            whole.push_str(&p);
            fill = f;
        });
        trace!("assembled {} chars", whole.len());

        let bits = BitVec::unarmor(&whole, fill)?;
        Message::decode(&bits).map(Some)
    }
}
