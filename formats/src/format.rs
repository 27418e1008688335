use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::EnumString;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Current formats.hcl version
///
const FVERSION: usize = 2;

/// This struct represents the format descriptor for each of the supported data types.
///
#[derive(Debug, Deserialize)]
pub struct FormatDescr {
    /// Type of data each format refers to
    #[serde(rename = "type")]
    pub dtype: String,
    /// Free text description
    pub description: String,
    /// Source
    pub source: String,
    /// URL to the site where this is defined
    pub url: String,
}

/// This struct represents the format file structure to be loaded from an HCL file.
///
#[derive(Debug, Deserialize)]
pub struct FormatFile {
    /// Version
    pub version: usize,
    /// Ordered list of format metadata
    pub format: BTreeMap<String, FormatDescr>,
}

/// All formats the toolbox can read or write.
///
#[derive(
    Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq, strum::Display, EnumString, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    #[default]
    None,
    /// NMEA 0183 sentences, raw or timestamped capture logs
    Nmea,
    /// AIS reports in AIVDM six-bit armoring
    Aivdm,
    /// GPS Exchange Format tracks
    Gpx,
    /// Keyhole Markup Language
    Kml,
    /// GeoJSON feature collections
    Geojson,
    /// SHOM tidal current atlas text files
    C2d,
    /// WMO GRIB container (identification only)
    Grib,
}

impl Format {
    /// List all supported formats into a string using `tabled`.
    ///
    pub fn list() -> eyre::Result<String> {
        let descr = include_str!("formats.hcl");
        let fstr: FormatFile = hcl::from_str(descr)?;

        // Safety checks
        //
        assert_eq!(fstr.version, FVERSION);

        let header = vec!["Name", "Type", "Description"];

        let mut builder = Builder::default();
        builder.push_record(header);

        fstr.format.iter().for_each(|(name, entry)| {
            let mut row = vec![];

            let name = name.clone();
            let dtype = entry.dtype.clone();
            let row_text = format!(
                "{}\nSource: {} -- URL: {}",
                entry.description, entry.source, entry.url
            );
            row.push(&name);
            row.push(&dtype);
            row.push(&row_text);
            builder.push_record(row);
        });
        let allf = builder.build().with(Style::modern()).to_string();
        let str = format!("List all formats:\n{allf}");
        Ok(str)
    }

    /// List all supported formats into a string
    ///
    pub fn list_plain() -> eyre::Result<String> {
        let descr = include_str!("formats.hcl");
        let fstr: FormatFile = hcl::from_str(descr)?;
        assert_eq!(fstr.version, FVERSION);
        let allf = fstr
            .format
            .iter()
            .map(|(name, entry)| {
                format!(
                    "{:10}{:6}{}\n{:16}Source: {} -- URL: {}",
                    name, entry.dtype, entry.description, "", entry.source, entry.url
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let str = format!("List all formats:\n\n{allf}");
        Ok(str)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::Nmea, Format::from_str("nmea").unwrap());
        assert_eq!(Format::C2d, Format::from_str("C2D").unwrap());
        assert!(Format::from_str("whatever").is_err());
    }

    #[test]
    fn test_format_list() {
        let all = Format::list().unwrap();
        assert!(all.contains("aivdm"));
        assert!(all.contains("grib"));
    }
}
