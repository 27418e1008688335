//! Angle conversions used all over the place.
//!
//! Three families of notation show up in the data we consume:
//!
//! - human sexagesimal (`47° 30' 9.0" N`, `47° 30.6' N`, `3.25° E`), also
//!   accepted with `h`/`m`/`s` markers for hour angles,
//! - NMEA `ddmm.mm` with a separate hemisphere field,
//! - the fixed 9-character `±DDMM.mmm` form of SHOM current atlases.
//!

use std::sync::LazyLock;

use eyre::{eyre, Result};
use regex::Regex;

static RE_DMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d+)°(\d+)'(\d+(?:\.\d+)?)"#).unwrap());
static RE_DM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)°(\d+(?:\.\d+)?)'").unwrap());
static RE_D: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)°").unwrap());

/// Parse a sexagesimal angle into decimal degrees.
///
/// Sign comes from a trailing (or leading) hemisphere letter; `S` and `W`
/// are negative.  Hour-angle markers (`12h 3m 51s`) are accepted as
/// aliases for `°`/`'`/`"`.
///
pub fn parse_dms(dms: &str) -> Result<f64> {
    let sign = if dms.contains('S') || dms.contains('W') {
        -1.
    } else {
        1.
    };

    let dms = dms
        .replace('h', "°")
        .replace('m', "'")
        .replace('s', "\"")
        .replace("''", "\"")
        .replace(',', ".")
        .replace(' ', "");

    // 47° 30' 9.0"
    if let Some(c) = RE_DMS.captures(&dms) {
        let d: u32 = c[1].parse()?;
        let m: u32 = c[2].parse()?;
        let s: f64 = c[3].parse()?;
        return Ok(sign * (f64::from(d) + f64::from(m) / 60. + s / 3600.));
    }

    // 47° 30.6'
    if let Some(c) = RE_DM.captures(&dms) {
        let d: u32 = c[1].parse()?;
        let m: f64 = c[2].parse()?;
        return Ok(sign * (f64::from(d) + m / 60.));
    }

    // 47°  3.25°
    if let Some(c) = RE_D.captures(&dms) {
        let d: f64 = c[1].parse()?;
        return Ok(sign * d);
    }

    Err(eyre!("invalid angle: {dms}"))
}

fn hemisphere(a: f64, is_lat: bool) -> (char, f64) {
    match (is_lat, a >= 0.) {
        (true, true) => ('N', a),
        (true, false) => ('S', -a),
        (false, true) => ('E', a),
        (false, false) => ('W', -a),
    }
}

/// Decimal degrees into `N 47° 30' 9.000`.
///
pub fn format_dms(a: f64, is_lat: bool) -> String {
    let (sign, a) = hemisphere(a, is_lat);

    let d = a.trunc() as i64;
    let m = (a * 60.).trunc() as i64 % 60;
    let s = (a * 3600.) % 60.;

    format!("{sign} {d}° {m}' {s:.3}")
}

/// Decimal degrees into `N 47° 30.00000'`.
///
pub fn format_dm(a: f64, is_lat: bool) -> String {
    let (sign, a) = hemisphere(a, is_lat);

    let d = a.trunc() as i64;
    let m = (a * 60.) % 60.;

    format!("{sign} {d}° {m:.5}'")
}

/// NMEA `ddmm.mm` + hemisphere field into decimal degrees.
///
/// `4821.624`/`N` is 48° 21.624' North.
///
pub fn parse_nmea_angle(a: &str, hemi: &str) -> Result<f64> {
    let a: f64 = a
        .parse()
        .map_err(|_| eyre!("invalid NMEA angle: {a}"))?;
    let a = (a % 100.) / 60. + (a / 100.).trunc();
    match hemi {
        "S" | "W" => Ok(-a),
        "N" | "E" => Ok(a),
        _ => Err(eyre!("invalid hemisphere: {hemi}")),
    }
}

/// 9-character `±DDMM.mmm` current-atlas angle into decimal degrees.
///
/// The field is right-aligned, the decimal point sits at the 6th column
/// and minutes take the last 6 characters.
///
pub fn parse_atlas_angle(s: &str) -> Result<f64> {
    if s.len() != 9 {
        return Err(eyre!("atlas angle must be 9 chars: {s:?}"));
    }
    let p = s
        .find('.')
        .ok_or_else(|| eyre!("no decimal point in atlas angle: {s:?}"))?;
    if p != 5 {
        return Err(eyre!("misplaced decimal point in atlas angle: {s:?}"));
    }

    let degrees: i32 = s[..p - 2].trim().parse()?;
    let minutes: f64 = s[p - 2..].parse()?;
    if !(0. ..60.).contains(&minutes) {
        return Err(eyre!("minutes out of range in atlas angle: {s:?}"));
    }

    let d = f64::from(degrees.abs()) + minutes / 60.;
    Ok(if degrees < 0 { -d } else { d })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[rstest]
    #[case("47° 30' 9.0\" N", 47.5025)]
    #[case("3° 30' 0.9\" W", -3.50025)]
    #[case("47° 30' N", 47.5)]
    #[case("47° 30.6' N", 47.51)]
    #[case("47°  S", -47.)]
    #[case("3.25° E", 3.25)]
    fn test_parse_dms(#[case] inp: &str, #[case] out: f64) {
        assert!(close(parse_dms(inp).unwrap(), out, 1e-9));
    }

    #[test]
    fn test_parse_dms_hour_angle() {
        assert!(close(parse_dms("12h 3m 51s").unwrap(), 12.064166, 1e-6));
        assert!(close(parse_dms("22h 38m").unwrap(), 22.63333, 1e-5));
    }

    #[test]
    fn test_parse_dms_bad() {
        assert!(parse_dms("foobar").is_err());
    }

    #[test]
    fn test_format_dms() {
        assert_eq!("N 47° 30' 9.000", format_dms(47.5025, true));
        assert_eq!("W 3° 30' 0.900", format_dms(-3.50025, false));
    }

    #[test]
    fn test_format_dm() {
        assert_eq!("S 47° 30.00000'", format_dm(-47.5, true));
        assert_eq!("E 3° 15.00000'", format_dm(3.25, false));
    }

    #[rstest]
    #[case("4821.624", "N", 48.3604)]
    #[case("00430.500", "W", -4.508333333333333)]
    fn test_parse_nmea_angle(#[case] a: &str, #[case] hemi: &str, #[case] out: f64) {
        assert!(close(parse_nmea_angle(a, hemi).unwrap(), out, 1e-9));
    }

    #[test]
    fn test_parse_nmea_angle_bad_hemi() {
        assert!(parse_nmea_angle("4821.624", "X").is_err());
    }

    #[rstest]
    #[case(" 4821.624", 48.3604)]
    #[case(" 4820.000", 48.333333333333336)]
    #[case(" -430.500", -4.508333333333333)]
    fn test_parse_atlas_angle(#[case] inp: &str, #[case] out: f64) {
        assert!(close(parse_atlas_angle(inp).unwrap(), out, 1e-9));
    }

    #[rstest]
    #[case("4821.624")]
    #[case(" 4821624 ")]
    #[case(" 4899.000")]
    fn test_parse_atlas_angle_bad(#[case] inp: &str) {
        assert!(parse_atlas_angle(inp).is_err());
    }
}
