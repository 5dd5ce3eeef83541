use std::collections::BTreeMap;

use serde::Serialize;

use crate::cms::post::Post;
use crate::text_utils::{format_month_day, parse_date_time};
use crate::view::route::{extract_route_date, slug_from_url};
use crate::view::ViewDefaults;

/// One line of the archive.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    /// Publish month and day, `Mar 05`.
    pub date: String,
    pub year: String,
    pub month: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct YearArchive {
    pub year: i32,
    pub posts: Vec<PostSummary>,
}

impl PostSummary {
    pub fn from_post(post: &Post, defaults: &ViewDefaults) -> Self {
        let route_date = defaults.route_date_or_default(&post.url);
        let date = parse_date_time(&post.start_publish)
            .map(|date_time| format_month_day(&date_time))
            .unwrap_or_default();

        PostSummary {
            title: post.name.clone(),
            slug: slug_from_url(&post.url),
            date,
            year: route_date.year,
            month: route_date.month,
        }
    }
}

/// Posts grouped by the year of their URL, newest year first. Inside a
/// year the incoming order is kept.
pub fn group_by_year(posts: &[Post], defaults: &ViewDefaults) -> Vec<YearArchive> {
    let mut by_year: BTreeMap<i32, Vec<PostSummary>> = BTreeMap::new();
    for post in posts {
        let year = extract_route_date(&post.url)
            .and_then(|route_date| route_date.year_number())
            .unwrap_or(defaults.fallback_year);
        by_year.entry(year)
            .or_default()
            .push(PostSummary::from_post(post, defaults));
    }

    by_year.into_iter()
        .rev()
        .map(|(year, posts)| YearArchive { year, posts })
        .collect()
}
