//! Read-only views computed over an aggregated post list.

pub mod archive;
pub mod card;
pub mod filter;
pub mod reading;
pub mod route;
pub mod tags;

pub use archive::{group_by_year, PostSummary, YearArchive};
pub use card::PostCard;
pub use filter::{filter_posts, posts_with_tag};
pub use reading::{excerpt, formatted_date, read_time};
pub use route::{extract_route_date, slug_from_url, RouteDate};
pub use tags::{post_tags, tag_counts, unique_tags, TagCount};

pub const DEFAULT_FALLBACK_YEAR: i32 = 2024;
pub const DEFAULT_FALLBACK_MONTH: &str = "01";
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;
pub const DEFAULT_CARD_TAG_LIMIT: usize = 5;
pub const DEFAULT_EXCERPT_LENGTH: usize = 150;

/// Values used when a post does not carry the information itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefaults {
    /// Year for posts whose URL has no `/YYYY/MM/` segment.
    pub fallback_year: i32,
    pub fallback_month: String,
    pub words_per_minute: usize,
    pub card_tag_limit: usize,
    pub excerpt_length: usize,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        ViewDefaults {
            fallback_year: DEFAULT_FALLBACK_YEAR,
            fallback_month: DEFAULT_FALLBACK_MONTH.to_string(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            card_tag_limit: DEFAULT_CARD_TAG_LIMIT,
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
        }
    }
}

impl ViewDefaults {
    /// Route date of `url`, or the fallback year and month.
    pub fn route_date_or_default(&self, url: &str) -> RouteDate {
        extract_route_date(url).unwrap_or_else(|| RouteDate {
            year: self.fallback_year.to_string(),
            month: self.fallback_month.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_posts {
    use crate::cms::post::Post;

    pub fn post(name: &str, url: &str, keywords: &[&str], category: &[&str]) -> Post {
        Post {
            name: name.to_string(),
            url: url.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category: category.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }
}
