use crate::cms::post::Post;

fn normalize_path(path: &str) -> String {
    let lower = path.to_lowercase();
    match lower.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Finds the post published under `/{year}/{month}/{slug}`.
///
/// Both sides are lower-cased and lose one trailing slash before comparing.
/// When several posts share a path the first one, in aggregation order, wins.
pub fn find_by_route<'a>(year: &str, month: &str, slug: &str, posts: &'a [Post]) -> Option<&'a Post> {
    let with_slash = normalize_path(&format!("/{}/{}/{}/", year, month, slug));
    let without_slash = normalize_path(&format!("/{}/{}/{}", year, month, slug));

    posts.iter().find(|post| {
        let url = normalize_path(&post.url);
        url == with_slash || url == without_slash
    })
}
