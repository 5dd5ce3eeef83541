use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteDate {
    pub year: String,
    pub month: String,
}

impl RouteDate {
    pub fn year_number(&self) -> Option<i32> {
        self.year.parse().ok()
    }
}

/// Year and month of the first `/YYYY/MM/` segment of `url`.
pub fn extract_route_date(url: &str) -> Option<RouteDate> {
    lazy_static! {
        static ref ROUTE_DATE_REGEX: Regex = Regex::new(
            r"/(?P<year>\d{4})/(?P<month>\d{2})/"
        ).unwrap();
    }

    let caps = ROUTE_DATE_REGEX.captures(url)?;
    Some(RouteDate {
        year: caps["year"].to_string(),
        month: caps["month"].to_string(),
    })
}

/// Last non-empty path segment.
pub fn slug_from_url(url: &str) -> String {
    url.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}
