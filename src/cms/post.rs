use serde::{Deserialize, Deserializer, Serialize};

use crate::cms::field::{normalize_categories, normalize_keywords, normalize_text, CategoryField, TextField};

/// The CMS sends `null` for properties that were never filled in.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all(deserialize = "PascalCase", serialize = "camelCase"))]
pub struct ContentLink {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guid_value: String,
}

/// A search result exactly as the CMS sends it.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct RawPost {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    pub description: Option<TextField>,
    pub intro_text: Option<TextField>,
    pub body_text: Option<TextField>,
    pub keywords: Option<TextField>,
    pub category: Option<CategoryField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_publish: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changed: String,
    pub twitter_card_image: Option<TextField>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_link: ContentLink,
}

/// One page of search results.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_matching: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<RawPost>,
}

/// A blog post with every polymorphic field already collapsed.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub name: String,
    pub url: String,
    pub description: String,
    pub intro_text: String,
    pub body_text: String,
    pub keywords: Vec<String>,
    pub category: Vec<String>,
    pub start_publish: String,
    pub created: String,
    pub changed: String,
    pub twitter_card_image: String,
    pub content_link: ContentLink,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Post {
            description: normalize_text(raw.description.as_ref()),
            intro_text: normalize_text(raw.intro_text.as_ref()),
            body_text: normalize_text(raw.body_text.as_ref()),
            keywords: normalize_keywords(raw.keywords.as_ref()),
            category: normalize_categories(raw.category.as_ref()),
            twitter_card_image: normalize_text(raw.twitter_card_image.as_ref()),
            name: raw.name,
            url: raw.url,
            start_publish: raw.start_publish,
            created: raw.created,
            changed: raw.changed,
            content_link: raw.content_link,
        }
    }
}

impl Post {
    /// Keywords followed by category names, in that order, duplicates kept.
    pub fn all_tags(&self) -> impl Iterator<Item=&String> {
        self.keywords.iter().chain(self.category.iter())
    }
}
