//! NMEA 0183 sentences and capture logs.
//!
//! Capture logs are plain text files with one sentence per line,
//! optionally prefixed by an ISO timestamp inserted at reception time.
//!

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use estran_common::{parse_nmea_angle, Point};
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq)]
pub enum NmeaError {
    #[error("no leading $ or ! in {0}")]
    BadStart(String),
    #[error("no checksum in {0}")]
    NoChecksum(String),
    #[error("bad checksum in {0}: got {1:02X}, expected {2:02X}")]
    BadChecksum(String, u8, u8),
    #[error("address field too short in {0}")]
    ShortAddress(String),
    #[error("bad timestamp in log line {0}")]
    BadTimestamp(String),
    #[error("missing field {1} in {0}")]
    MissingField(String, usize),
}

/// XOR of all bytes between the leading `$`/`!` and the `*`.
///
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// One parsed NMEA sentence.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Sentence {
    /// Talker id, `GP`, `YD`, `AI`…
    pub talker: String,
    /// Sentence tag, `GLL`, `RMC`, `VDM`…
    pub tag: String,
    /// Comma separated payload fields after the address.
    pub fields: Vec<String>,
    /// The sentence as read.
    pub raw: String,
}

impl Sentence {
    /// Parse and verify one sentence.
    ///
    pub fn parse(line: &str) -> Result<Self, NmeaError> {
        let line = line.trim();
        if !(line.starts_with('$') || line.starts_with('!')) {
            return Err(NmeaError::BadStart(line.into()));
        }

        let star = line
            .rfind('*')
            .ok_or_else(|| NmeaError::NoChecksum(line.into()))?;
        let body = &line[1..star];
        let want = u8::from_str_radix(line[star + 1..].trim(), 16)
            .map_err(|_| NmeaError::NoChecksum(line.into()))?;

        let got = checksum(body);
        if got != want {
            return Err(NmeaError::BadChecksum(line.into(), got, want));
        }

        let mut fields = body.split(',').map(String::from);
        let address = fields
            .next()
            .ok_or_else(|| NmeaError::ShortAddress(line.into()))?;
        if address.len() < 5 {
            return Err(NmeaError::ShortAddress(line.into()));
        }

        Ok(Sentence {
            talker: address[..2].to_string(),
            tag: address[2..].to_string(),
            fields: fields.collect(),
            raw: line.to_string(),
        })
    }

    fn field(&self, n: usize) -> Result<&str, NmeaError> {
        self.fields
            .get(n)
            .map(String::as_str)
            .ok_or_else(|| NmeaError::MissingField(self.raw.clone(), n))
    }

    /// Extract a position when the sentence carries one.
    ///
    /// `GLL` has it first, `RMC` and `GGA` after the UTC time field.
    /// Sentences without a position yield `None`, as do empty fields
    /// (no fix yet).
    ///
    pub fn position(&self) -> Result<Option<Point>, NmeaError> {
        let idx = match self.tag.as_str() {
            "GLL" => 0,
            "RMC" => 2,
            "GGA" => 1,
            _ => return Ok(None),
        };

        let lat = self.field(idx)?;
        let ns = self.field(idx + 1)?;
        let lon = self.field(idx + 2)?;
        let ew = self.field(idx + 3)?;
        if lat.is_empty() || lon.is_empty() {
            return Ok(None);
        }

        let lat = parse_nmea_angle(lat, ns).map_err(|_| NmeaError::MissingField(self.raw.clone(), idx))?;
        let lon = parse_nmea_angle(lon, ew)
            .map_err(|_| NmeaError::MissingField(self.raw.clone(), idx + 2))?;
        Ok(Some(Point::new(lat, lon)))
    }

    /// AIS carrier sentences.
    ///
    pub fn is_aivdm(&self) -> bool {
        self.tag == "VDM" || self.tag == "VDO"
    }
}

/// One line of a timestamped capture log, `<iso timestamp> <sentence>`.
/// Bare sentences are accepted too.
///
#[derive(Clone, Debug, PartialEq)]
pub struct LogLine {
    pub time: Option<DateTime<Utc>>,
    pub sentence: Sentence,
}

impl LogLine {
    pub fn parse(line: &str) -> Result<Self, NmeaError> {
        let line = line.trim();
        match line.split_once(' ') {
            Some((ts, rest)) if !ts.starts_with('$') && !ts.starts_with('!') => {
                let time = ts
                    .parse::<DateTime<Utc>>()
                    .map_err(|_| NmeaError::BadTimestamp(line.into()))?;
                Ok(LogLine {
                    time: Some(time),
                    sentence: Sentence::parse(rest)?,
                })
            }
            _ => Ok(LogLine {
                time: None,
                sentence: Sentence::parse(line)?,
            }),
        }
    }
}

/// What a given sentence tag carries, for the stats listing.
///
fn describe(tag: &str) -> &'static str {
    match tag {
        "DBT" => "Depth below transducer",
        "DPT" => "Depth",
        "GGA" => "GPS fix data",
        "GLL" => "Geographic position",
        "GSA" => "GNSS DOP and active satellites",
        "GSV" => "Satellites in view",
        "HDG" => "Heading, deviation & variation",
        "MWV" => "Wind speed and angle",
        "RMC" => "Recommended minimum navigation data",
        "VDM" => "AIS VHF data-link message",
        "VDO" => "AIS VHF data-link own-vessel report",
        "VHW" => "Water speed and heading",
        "VTG" => "Track made good and ground speed",
        "ZDA" => "Time & date",
        _ => "Unknown",
    }
}

/// Per-tag tally over a capture log.
///
#[derive(Debug, Default)]
pub struct LogStats {
    /// Keyed by full address (`GPGLL`).
    pub counts: BTreeMap<String, usize>,
    /// AIS carrier frames seen.
    pub aivdm: usize,
    /// Lines we could not parse.
    pub errors: usize,
    pub total: usize,
}

impl LogStats {
    /// Tally a whole log.
    ///
    #[tracing::instrument(skip(data))]
    pub fn from_log(data: &str) -> Self {
        let mut stats = LogStats::default();
        data.lines()
            .filter(|l| !l.trim().is_empty())
            .for_each(|line| {
                stats.total += 1;
                match LogLine::parse(line) {
                    Ok(l) => {
                        let s = &l.sentence;
                        *stats
                            .counts
                            .entry(format!("{}{}", s.talker, s.tag))
                            .or_default() += 1;
                        if s.is_aivdm() {
                            stats.aivdm += 1;
                        }
                    }
                    Err(_) => stats.errors += 1,
                }
            });
        trace!("{} lines, {} errors", stats.total, stats.errors);
        stats
    }

    /// Render with `tabled`.
    ///
    pub fn list(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(vec!["Sentence", "Description", "Count"]);

        self.counts.iter().for_each(|(address, n)| {
            let descr = describe(&address[2..]);
            builder.push_record(vec![address.as_str(), descr, &n.to_string()]);
        });

        let all = builder.build().with(Style::modern()).to_string();
        format!(
            "{all}\n{} sentences, {} AIS frames, {} errors",
            self.total, self.aivdm, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("GPGLL,4916.45,N,12311.12,W,225444,A", 0x31)]
    #[case(
        "GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W",
        0x6A
    )]
    #[case("YDGLL,4821.624,N,00430.500,W,104145.00,A,A", 0x79)]
    fn test_checksum(#[case] body: &str, #[case] sum: u8) {
        assert_eq!(sum, checksum(body));
    }

    #[test]
    fn test_parse_gll() {
        let s = Sentence::parse("$GPGLL,4916.45,N,12311.12,W,225444,A*31").unwrap();
        assert_eq!("GP", s.talker);
        assert_eq!("GLL", s.tag);
        assert_eq!("4916.45", s.fields[0]);

        let p = s.position().unwrap().unwrap();
        assert!((p.lat - 49.274166666).abs() < 1e-6);
        assert!((p.lon - -123.185333333).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rmc_position() {
        let s = Sentence::parse(
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A",
        )
        .unwrap();
        let p = s.position().unwrap().unwrap();
        assert!((p.lat - 48.1173).abs() < 1e-6);
        assert!((p.lon - 11.516666666).abs() < 1e-6);
    }

    #[test]
    fn test_parse_bad_checksum() {
        let r = Sentence::parse("$GPGLL,4916.45,N,12311.12,W,225444,A*32");
        assert!(matches!(r, Err(NmeaError::BadChecksum(_, 0x31, 0x32))));
    }

    #[rstest]
    #[case("GPGLL,4916.45,N,12311.12,W,225444,A*31")]
    #[case("$GPGLL,4916.45,N,12311.12,W,225444,A")]
    #[case("$GP*55")]
    fn test_parse_bad(#[case] line: &str) {
        assert!(Sentence::parse(line).is_err());
    }

    #[test]
    fn test_logline_with_timestamp() {
        let l =
            LogLine::parse("2024-05-12T10:41:45Z $YDGLL,4821.624,N,00430.500,W,104145.00,A,A*79")
                .unwrap();
        assert!(l.time.is_some());
        assert_eq!("GLL", l.sentence.tag);
    }

    #[test]
    fn test_logline_bare() {
        let l = LogLine::parse("$GPGLL,4916.45,N,12311.12,W,225444,A*31").unwrap();
        assert!(l.time.is_none());
    }

    #[test]
    fn test_stats() {
        let log = "\
2024-05-12T10:41:45Z $YDGLL,4821.624,N,00430.500,W,104145.00,A,A*79
$GPGLL,4916.45,N,12311.12,W,225444,A*31
garbage line
";
        let stats = LogStats::from_log(log);
        assert_eq!(3, stats.total);
        assert_eq!(1, stats.errors);
        assert_eq!(Some(&1), stats.counts.get("GPGLL"));
        assert_eq!(Some(&1), stats.counts.get("YDGLL"));
        assert!(stats.list().contains("Geographic position"));
    }
}
