//! Reading of DSP date strings such as `GREGORIAN:CE:1900-01:CE:2000-12-31`.
//!
//! Only the parts needed to compare dates in SHACL are extracted: start and end are turned
//! into `YYYY-MM-DD` strings, partial dates are completed with `01`. Dates before the common
//! era are left out because `xsd:date` cannot order them against CE dates.

use lazy_static::lazy_static;
use regex::Regex;

use crate::data::{PropertyObject, TripleObjectType, TriplePropertyType};

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(
        r"^(?:(?P<cal>GREGORIAN|JULIAN|ISLAMIC):)?(?:(?P<era1>CE|BCE|BC|AD):)?(?P<d1>\d{1,4}(?:-\d{1,2}){0,2})(?::(?:(?P<era2>CE|BCE|BC|AD):)?(?P<d2>\d{1,4}(?:-\d{1,2}){0,2}))?$"
    )
    .expect("date regex is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Ce,
    Bce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleDate {
    pub era: Era,
    pub year: u32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: SingleDate,
    pub end: Option<SingleDate>,
}

fn parse_era(era: Option<&str>) -> Era {
    match era {
        Some("BCE") | Some("BC") => Era::Bce,
        _ => Era::Ce,
    }
}

fn parse_single(date: &str, era: Era) -> Option<SingleDate> {
    let mut parts = date.split('-');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next().map(str::parse::<u32>).transpose().ok()?;
    let day = parts.next().map(str::parse::<u32>).transpose().ok()?;
    Some(SingleDate {
        era,
        year,
        month,
        day,
    })
}

/// Parses a DSP date string. Returns `None` if the string has an unknown shape; no check is
/// made that month and day are in range.
pub fn parse_date_string(date: &str) -> Option<DateRange> {
    let caps = DATE_RE.captures(date.trim())?;
    let start_era = parse_era(caps.name("era1").map(|m| m.as_str()));
    let start = parse_single(caps.name("d1")?.as_str(), start_era)?;
    let end = match caps.name("d2") {
        Some(d2) => {
            let end_era = caps
                .name("era2")
                .map(|m| parse_era(Some(m.as_str())))
                .unwrap_or(start_era);
            Some(parse_single(d2.as_str(), end_era)?)
        }
        None => None,
    };
    Some(DateRange { start, end })
}

fn xsd_like(date: &SingleDate) -> Option<String> {
    if date.era == Era::Bce {
        return None;
    }
    Some(format!(
        "{:04}-{:02}-{:02}",
        date.year,
        date.month.unwrap_or(1),
        date.day.unwrap_or(1)
    ))
}

/// The `dateHasStart`/`dateHasEnd` metadata of a date value.
pub fn xsd_like_dates(date: &str) -> Vec<PropertyObject> {
    let Some(parsed) = parse_date_string(date) else {
        return Vec::new();
    };
    let Some(start) = xsd_like(&parsed.start) else {
        return Vec::new();
    };
    let mut dates = vec![PropertyObject::new(
        TriplePropertyType::KnoraDateStart,
        start.clone(),
        TripleObjectType::DateYyyyMmDd,
    )];
    // A single date ends where it starts.
    let end = match parsed.end.as_ref() {
        Some(end) => xsd_like(end),
        None => Some(start),
    };
    if let Some(end) = end {
        dates.push(PropertyObject::new(
            TriplePropertyType::KnoraDateEnd,
            end,
            TripleObjectType::DateYyyyMmDd,
        ));
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_is_parsed() {
        let parsed = parse_date_string("GREGORIAN:CE:1900-01:CE:2000-12-31").unwrap();
        assert_eq!(parsed.start.year, 1900);
        assert_eq!(parsed.start.month, Some(1));
        assert_eq!(parsed.end.unwrap().day, Some(31));
    }

    #[test]
    fn partial_dates_are_completed() {
        let dates = xsd_like_dates("CE:1900");
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].object_value.as_deref(), Some("1900-01-01"));
        let dates = xsd_like_dates("GREGORIAN:CE:1900-5:CE:1901");
        assert_eq!(dates[1].object_value.as_deref(), Some("1901-01-01"));
        assert_eq!(dates[0].object_value.as_deref(), Some("1900-05-01"));
    }

    #[test]
    fn bce_dates_are_skipped() {
        assert!(xsd_like_dates("GREGORIAN:BC:500:CE:100").is_empty());
        let dates = xsd_like_dates("GREGORIAN:CE:100:BCE:50");
        assert_eq!(dates.len(), 1);
    }

    #[test]
    fn out_of_range_components_are_kept_verbatim() {
        let dates = xsd_like_dates("2020-13-40");
        assert_eq!(dates[0].object_value.as_deref(), Some("2020-13-40"));
    }

    #[test]
    fn single_date_ends_on_its_start() {
        let dates = xsd_like_dates("GREGORIAN:CE:1850-03-12");
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].property_type, TriplePropertyType::KnoraDateStart);
        assert_eq!(dates[1].property_type, TriplePropertyType::KnoraDateEnd);
        assert_eq!(dates[1].object_value.as_deref(), Some("1850-03-12"));
    }

    #[test]
    fn garbage_is_not_a_date() {
        assert!(parse_date_string("yesterday").is_none());
        assert!(xsd_like_dates("").is_empty());
    }
}
