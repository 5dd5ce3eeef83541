use std::collections::HashSet;

use spdlog::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::cms::error::{CmsError, Result};
use crate::cms::post::{ApiResponse, Post, RawPost};
use crate::cms::source::SearchSource;

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub page_size: usize,
    pub dedupe_by_guid: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            page_size: DEFAULT_PAGE_SIZE,
            dedupe_by_guid: false,
        }
    }
}

/// Outcome of one aggregation pass.
#[derive(Debug)]
pub struct AggregatedPosts {
    pub posts: Vec<Post>,
    pub total_matching: usize,
    pub pages_requested: usize,
    /// False when a page after the first failed or came back empty.
    pub complete: bool,
}

pub struct Aggregator<'a, S> {
    source: &'a S,
    options: AggregateOptions,
}

struct Collector {
    posts: Vec<Post>,
    seen: Option<HashSet<String>>,
}

impl Collector {
    fn new(dedupe_by_guid: bool) -> Self {
        Collector {
            posts: vec![],
            seen: if dedupe_by_guid { Some(HashSet::new()) } else { None },
        }
    }

    fn extend(&mut self, results: Vec<RawPost>) {
        for raw in results {
            if let Some(ref mut seen) = self.seen {
                let guid = &raw.content_link.guid_value;
                if !guid.is_empty() && !seen.insert(guid.clone()) {
                    debug!("Dropping duplicated post {} ({})", raw.url, guid);
                    continue;
                }
            }
            self.posts.push(Post::from(raw));
        }
    }
}

impl<'a, S: SearchSource> Aggregator<'a, S> {
    pub fn new(source: &'a S, options: AggregateOptions) -> Self {
        Aggregator { source, options }
    }

    async fn next_page(&self, skip: usize, top: usize, cancel: &CancellationToken) -> Result<ApiResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CmsError::Cancelled),
            page = self.source.fetch_page(skip, top) => page,
        }
    }

    /// Pages through the search until `TotalMatching` results were received.
    ///
    /// Only a failure of the first page is an error. Later failures end the
    /// pass and whatever was collected so far is returned.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<AggregatedPosts> {
        let page_size = self.options.page_size.max(1);
        if cancel.is_cancelled() {
            return Err(CmsError::Cancelled);
        }

        let first = match self.next_page(0, page_size, cancel).await {
            Ok(page) => page,
            Err(e) => {
                error!("Error fetching blog posts: {}", e);
                return Err(e);
            }
        };

        let total_matching = first.total_matching;
        let mut received = first.results.len();
        let mut pages_requested = 1;
        let mut complete = true;
        let mut collector = Collector::new(self.options.dedupe_by_guid);
        collector.extend(first.results);

        let mut skip = 0;
        while received < total_matching {
            skip += page_size;
            pages_requested += 1;
            let page = match self.next_page(skip, page_size, cancel).await {
                Ok(page) => page,
                Err(CmsError::Cancelled) => return Err(CmsError::Cancelled),
                Err(e) => {
                    warn!("Failed to fetch page at skip={}: {}", skip, e);
                    complete = false;
                    break;
                }
            };

            if page.results.is_empty() {
                warn!("Empty page at skip={} with {} of {} posts received", skip, received, total_matching);
                complete = false;
                break;
            }

            received += page.results.len();
            collector.extend(page.results);
        }

        info!("Aggregated {} posts of {} in {} requests", collector.posts.len(), total_matching, pages_requested);

        Ok(AggregatedPosts {
            posts: collector.posts,
            total_matching,
            pages_requested,
            complete,
        })
    }
}

pub async fn fetch_all<S: SearchSource>(source: &S, options: AggregateOptions, cancel: &CancellationToken) -> Result<Vec<Post>> {
    let aggregated = Aggregator::new(source, options).run(cancel).await?;
    Ok(aggregated.posts)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    struct MockSource {
        total: usize,
        failing_skips: HashSet<usize>,
        // Later pages start this many posts early, as if posts were published mid-pass
        shift_after_first: usize,
        requests: RefCell<Vec<(usize, usize)>>,
    }

    impl MockSource {
        fn new(total: usize) -> Self {
            MockSource {
                total,
                failing_skips: HashSet::new(),
                shift_after_first: 0,
                requests: RefCell::new(vec![]),
            }
        }

        fn failing_at(mut self, skip: usize) -> Self {
            self.failing_skips.insert(skip);
            self
        }

        fn raw_post(index: usize) -> RawPost {
            serde_json::from_value(json!({
                "Name": format!("Post {}", index),
                "Url": format!("/2024/01/post-{}/", index),
                "ContentLink": {"Id": index, "GuidValue": format!("guid-{}", index)}
            })).unwrap()
        }
    }

    impl SearchSource for MockSource {
        async fn fetch_page(&self, skip: usize, top: usize) -> Result<ApiResponse> {
            self.requests.borrow_mut().push((skip, top));
            if self.failing_skips.contains(&skip) {
                return Err(CmsError::Status(503));
            }

            let start = if skip > 0 { skip - self.shift_after_first } else { 0 };
            let end = (start + top).min(self.total);
            let results = (start.min(end)..end).map(MockSource::raw_post).collect();
            Ok(ApiResponse {
                total_matching: self.total,
                results,
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_all_pages() {
        let source = MockSource::new(250);
        let posts = fetch_all(&source, AggregateOptions::default(), &CancellationToken::new()).await.unwrap();

        assert_eq!(posts.len(), 250);
        assert_eq!(*source.requests.borrow(), vec![(0, 100), (100, 100), (200, 100)]);
        for (index, post) in posts.iter().enumerate() {
            assert_eq!(post.name, format!("Post {}", index));
        }
    }

    #[tokio::test]
    async fn test_single_page() {
        let source = MockSource::new(40);
        let aggregated = Aggregator::new(&source, AggregateOptions::default())
            .run(&CancellationToken::new()).await.unwrap();

        assert_eq!(aggregated.posts.len(), 40);
        assert_eq!(aggregated.pages_requested, 1);
        assert!(aggregated.complete);
    }

    #[tokio::test]
    async fn test_partial_result_on_later_failure() {
        let source = MockSource::new(250).failing_at(100);
        let aggregated = Aggregator::new(&source, AggregateOptions::default())
            .run(&CancellationToken::new()).await.unwrap();

        assert_eq!(aggregated.posts.len(), 100);
        assert_eq!(aggregated.total_matching, 250);
        assert_eq!(aggregated.pages_requested, 2);
        assert!(!aggregated.complete);
        assert_eq!(source.requests.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure() {
        let source = MockSource::new(250).failing_at(0);
        let res = fetch_all(&source, AggregateOptions::default(), &CancellationToken::new()).await;

        assert!(matches!(res, Err(CmsError::Status(503))));
        assert_eq!(source.requests.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_stops_pass() {
        // TotalMatching claims more posts than the source actually serves
        let source = MockSource::new(150);
        let options = AggregateOptions { page_size: 100, dedupe_by_guid: false };
        let shrinking = ShrinkingSource { inner: source, served: 120 };
        let aggregated = Aggregator::new(&shrinking, options)
            .run(&CancellationToken::new()).await.unwrap();

        assert_eq!(aggregated.posts.len(), 120);
        assert!(!aggregated.complete);
        assert_eq!(aggregated.pages_requested, 3);
    }

    struct ShrinkingSource {
        inner: MockSource,
        served: usize,
    }

    impl SearchSource for ShrinkingSource {
        async fn fetch_page(&self, skip: usize, top: usize) -> Result<ApiResponse> {
            let mut page = self.inner.fetch_page(skip, top).await?;
            page.results.retain(|raw| raw.content_link.id < self.served as i64);
            Ok(page)
        }
    }

    #[tokio::test]
    async fn test_overlap_kept_without_dedupe() {
        let mut source = MockSource::new(150);
        source.shift_after_first = 10;
        let posts = fetch_all(&source, AggregateOptions::default(), &CancellationToken::new()).await.unwrap();

        assert_eq!(posts.len(), 160);
        assert_eq!(posts[100].name, "Post 90");
    }

    #[tokio::test]
    async fn test_dedupe_by_guid() {
        let mut source = MockSource::new(150);
        source.shift_after_first = 10;
        let options = AggregateOptions { page_size: 100, dedupe_by_guid: true };
        let posts = fetch_all(&source, options, &CancellationToken::new()).await.unwrap();

        assert_eq!(posts.len(), 150);
        let guids: HashSet<_> = posts.iter().map(|p| p.content_link.guid_value.clone()).collect();
        assert_eq!(guids.len(), 150);
        assert_eq!(posts[100].name, "Post 100");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = MockSource::new(250);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = fetch_all(&source, AggregateOptions::default(), &cancel).await;

        assert!(matches!(res, Err(CmsError::Cancelled)));
        assert!(source.requests.borrow().is_empty());
    }

    /// Cancels the pass from inside the second page request, which then hangs.
    struct CancellingSource {
        inner: MockSource,
        cancel: CancellationToken,
    }

    impl SearchSource for CancellingSource {
        async fn fetch_page(&self, skip: usize, top: usize) -> Result<ApiResponse> {
            let page = self.inner.fetch_page(skip, top).await?;
            if skip > 0 {
                self.cancel.cancel();
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
            Ok(page)
        }
    }

    #[tokio::test]
    async fn test_cancelled_during_page_request() {
        let cancel = CancellationToken::new();
        let source = CancellingSource { inner: MockSource::new(250), cancel: cancel.clone() };
        let started = std::time::Instant::now();
        let res = Aggregator::new(&source, AggregateOptions::default()).run(&cancel).await;

        assert!(matches!(res, Err(CmsError::Cancelled)));
        assert_eq!(source.inner.requests.borrow().len(), 2);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }
}
