use crate::cms::post::Post;
use crate::text_utils::{format_long_date, parse_date_time, strip_tags, word_count};

/// Estimated reading time, never below one minute.
pub fn read_time(body_text: &str, words_per_minute: usize) -> String {
    let words = word_count(&strip_tags(body_text));
    let minutes = words.div_ceil(words_per_minute.max(1)).max(1);
    format!("{} min read", minutes)
}

/// `Mar 15, 2024`, or an empty string when the timestamp cannot be read.
pub fn formatted_date(iso_timestamp: &str) -> String {
    match parse_date_time(iso_timestamp) {
        Ok(date_time) => format_long_date(&date_time),
        Err(_) => String::new(),
    }
}

/// Description, or the head of the intro text when there is none.
pub fn excerpt(post: &Post, length: usize) -> String {
    if !post.description.is_empty() {
        return post.description.clone();
    }
    post.intro_text.chars().take(length).collect()
}
