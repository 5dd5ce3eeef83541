use std::collections::HashSet;

use crate::cms::post::Post;

fn matches_search(post: &Post, search: &str) -> bool {
    search.is_empty()
        || post.name.to_lowercase().contains(search)
        || post.description.to_lowercase().contains(search)
}

fn has_any_tag(post: &Post, selected: &HashSet<String>) -> bool {
    selected.is_empty() || post.all_tags().any(|tag| selected.contains(&tag.to_lowercase()))
}

/// Posts whose title or description contains `search` and that carry at
/// least one of `tags`. Both checks ignore case, and an empty `search` or
/// `tags` lets everything through.
pub fn filter_posts<'a, S: AsRef<str>>(posts: &'a [Post], search: &str, tags: &[S]) -> Vec<&'a Post> {
    let search = search.to_lowercase();
    let selected: HashSet<String> = tags.iter()
        .map(|tag| tag.as_ref().to_lowercase())
        .collect();

    posts.iter()
        .filter(|post| matches_search(post, &search) && has_any_tag(post, &selected))
        .collect()
}

/// Posts listed on the page of a single tag, optionally narrowed by `search`.
pub fn posts_with_tag<'a>(posts: &'a [Post], tag: &str, search: &str) -> Vec<&'a Post> {
    filter_posts(posts, search, &[tag])
}
