use serde::Serialize;

use crate::cms::post::Post;
use crate::view::reading::{excerpt, formatted_date, read_time};
use crate::view::route::slug_from_url;
use crate::view::tags::post_tags;
use crate::view::ViewDefaults;

/// What a post listing needs to show one post.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostCard {
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub read_time: String,
    pub slug: String,
    pub year: String,
    pub month: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub tags: Vec<String>,
}

impl PostCard {
    pub fn from_post(post: &Post, defaults: &ViewDefaults) -> Self {
        let route_date = defaults.route_date_or_default(&post.url);
        let mut tags = post_tags(post);
        tags.truncate(defaults.card_tag_limit);
        let image = if post.twitter_card_image.is_empty() {
            None
        } else {
            Some(post.twitter_card_image.clone())
        };

        PostCard {
            title: post.name.clone(),
            excerpt: excerpt(post, defaults.excerpt_length),
            date: formatted_date(&post.start_publish),
            read_time: read_time(&post.body_text, defaults.words_per_minute),
            slug: slug_from_url(&post.url),
            year: route_date.year,
            month: route_date.month,
            image,
            tags,
        }
    }

    /// Canonical path of the post, `/{year}/{month}/{slug}`.
    pub fn link(&self) -> String {
        format!("/{}/{}/{}", self.year, self.month, self.slug)
    }
}
