use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Replaces every markup tag with a space, so adjacent words stay apart.
pub fn strip_tags(html: &str) -> String {
    TAG_REGEX.replace_all(html, " ").into_owned()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Parses the timestamps the CMS emits. With an offset, the wall clock time
/// of that offset is kept.
pub fn parse_date_time(buf: &str) -> Result<NaiveDateTime, String> {
    let buf = buf.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(buf) {
        return Ok(date_time.naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(buf, format) {
            return Ok(date_time);
        }
    }

    NaiveDate::parse_from_str(buf, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("Unable to parse date time {}", buf))
}

/// `Mar 15, 2024`
pub fn format_long_date(date_time: &NaiveDateTime) -> String {
    date_time.format("%b %d, %Y").to_string()
}

/// `Mar 05`
pub fn format_month_day(date_time: &NaiveDateTime) -> String {
    date_time.format("%b %d").to_string()
}
