//! The `convert-angle` command.
//!

use eyre::Result;

use estran_common::{format_dm, format_dms, parse_dms};

use crate::AngleOpts;

/// Decimal degrees in, sexagesimal out, and the other way around.
///
pub fn convert_angle(opts: &AngleOpts) -> Result<String> {
    let value = match opts.angle.parse::<f64>() {
        Ok(v) => v,
        _ => parse_dms(&opts.angle)?,
    };
    let text = if opts.dms {
        format_dms(value, !opts.lon)
    } else if opts.dm {
        format_dm(value, !opts.lon)
    } else {
        format!("{:.6}", value)
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(angle: &str, dms: bool, dm: bool, lon: bool) -> AngleOpts {
        AngleOpts {
            dms,
            dm,
            lon,
            angle: angle.to_string(),
        }
    }

    #[test]
    fn test_decimal_passthrough() {
        let r = convert_angle(&opts("-4.5", false, false, false)).unwrap();
        assert_eq!("-4.500000", r);
    }

    #[test]
    fn test_dms_parse() {
        let r = convert_angle(&opts(r#"48°23'00"N"#, false, false, false)).unwrap();
        assert!(r.starts_with("48.38333"));
    }

    #[test]
    fn test_bad_angle() {
        assert!(convert_angle(&opts("due north", false, false, false)).is_err());
    }
}
