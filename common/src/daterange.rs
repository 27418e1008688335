//! Module handling date ranges
//!
//! Tide and weather commands take either a single day or a `START..END`
//! interval on the command line.
//!

use chrono::NaiveDate;
use eyre::{eyre, Result};

pub fn parse_range(date: &str) -> Result<(String, String)> {
    let intv: Vec<&str> = date.split("..").collect();
    let (start, end) = match intv.len() {
        1 => {
            let start = intv[0];
            (start, start)
        }
        2 => {
            let start = intv[0];
            let end = intv[1];
            (start, end)
        }
        _ => {
            return Err(eyre!(
                "Bad interval, need single or couple dates.".to_string()
            ));
        }
    };
    // if end is empty, we had only "DDDD.." so return start both times
    //
    if end.is_empty() {
        Ok((start.to_string(), start.to_string()))
    } else {
        Ok((start.to_string(), end.to_string()))
    }
}

/// Parse both sides of an interval (or a single day twice) into plain
/// calendar days.
///
pub fn parse_interval(date: &str) -> Result<(NaiveDate, NaiveDate)> {
    let (start, end) = parse_range(date)?;

    let start = dateparser::parse(&start)
        .map_err(|e| eyre!("bad date {start}: {e}"))?
        .date_naive();
    let end = dateparser::parse(&end)
        .map_err(|e| eyre!("bad date {end}: {e}"))?
        .date_naive();

    if end < start {
        return Err(eyre!("interval ends before it starts: {date}"));
    }
    Ok((start, end))
}
