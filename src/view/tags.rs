use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::cms::post::Post;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Keywords then categories of one post, first occurrence kept.
pub fn post_tags(post: &Post) -> Vec<String> {
    let mut tags: Vec<String> = vec![];
    for tag in post.all_tags() {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// Every tag used by any post, sorted for display.
pub fn unique_tags(posts: &[Post]) -> Vec<String> {
    let tags: BTreeSet<&String> = posts.iter()
        .flat_map(|post| post.all_tags())
        .collect();
    tags.into_iter().cloned().collect()
}

/// Number of posts carrying each tag, most used first.
pub fn tag_counts(posts: &[Post]) -> Vec<TagCount> {
    let mut tag_map: HashMap<String, usize> = HashMap::new();
    for post in posts {
        for tag in post_tags(post) {
            *tag_map.entry(tag).or_insert(0) += 1;
        }
    }

    let mut tag_list: Vec<TagCount> = tag_map.into_iter()
        .map(|(name, count)| TagCount { name, count })
        .collect();
    tag_list.sort_by(|a, b| {
        b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name))
    });
    tag_list
}
