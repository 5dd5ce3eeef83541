use std::io;
use std::sync::Arc;

use ntex::http::header::CACHE_CONTROL;
use ntex::http::StatusCode;
use ntex::web;
use ntex::web::HttpRequest;
use serde::Serialize;
use spdlog::{info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::aggregator::{AggregateOptions, Aggregator};
use crate::cms::error::CmsError;
use crate::cms::post::Post;
use crate::cms::source::{HttpSearchSource, SearchSource};
use crate::config::{Config, Defaults};
use crate::content_cache::{Expire, PostCache, ALL_POSTS_KEY};
use crate::lookup::find_by_route;
use crate::query_string::QueryString;
use crate::view::{filter_posts, group_by_year, posts_with_tag, tag_counts, PostCard, ViewDefaults};

/// The aggregated post list every route reads from.
struct PostStore<S> {
    source: S,
    options: AggregateOptions,
    cache: PostCache,
    window: Expire,
    refill: Mutex<()>,
}

impl<S: SearchSource> PostStore<S> {
    fn new(source: S, options: AggregateOptions, defaults: &Defaults) -> Self {
        PostStore {
            source,
            options,
            cache: PostCache::with_window(defaults.cache_secs),
            window: defaults.cache_window().map_or(Expire::Never, Expire::After),
            refill: Mutex::new(()),
        }
    }

    /// Aggregated posts, from the cache while it is fresh.
    ///
    /// Only one pass refills the cache at a time. Truncated passes are served
    /// but not cached, so the next request retries.
    async fn load(&self) -> Result<Arc<Vec<Post>>, CmsError> {
        if let Some(posts) = self.cache.get(ALL_POSTS_KEY) {
            return Ok(posts);
        }

        let _refill = self.refill.lock().await;
        if let Some(posts) = self.cache.get(ALL_POSTS_KEY) {
            return Ok(posts);
        }

        // Abandoned requests drop the guard and stop paging
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        let aggregated = Aggregator::new(&self.source, self.options).run(&cancel).await?;
        if !aggregated.complete {
            warn!("Serving {} of {} posts without caching", aggregated.posts.len(), aggregated.total_matching);
            return Ok(Arc::new(aggregated.posts));
        }

        Ok(self.cache.add(ALL_POSTS_KEY, aggregated.posts, self.window))
    }
}

struct AppState {
    config: Config,
    posts: PostStore<HttpSearchSource>,
    view_defaults: ViewDefaults,
}

impl AppState {
    fn new(config: Config) -> Result<Self, CmsError> {
        let source = HttpSearchSource::new(&config.cms)?;
        let posts = PostStore::new(source, config.cms.aggregate_options(), &config.defaults);
        let view_defaults = config.defaults.view_defaults();
        Ok(AppState {
            config,
            posts,
            view_defaults,
        })
    }
}

fn error_response(status: StatusCode, message: &str) -> web::HttpResponse {
    web::HttpResponse::build(status)
        .content_type("application/json")
        .body(serde_json::json!({ "error": message }).to_string())
}

fn unavailable_status(err: &CmsError) -> StatusCode {
    err.upstream_status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .filter(|status| !status.is_success())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn unavailable(err: &CmsError) -> web::HttpResponse {
    let message = match err {
        CmsError::Status(code) => format!("API request failed: {}", code),
        _ => "Failed to fetch blog posts".to_string(),
    };
    error_response(unavailable_status(err), &message)
}

fn json_response<T: Serialize + ?Sized>(state: &AppState, value: &T) -> web::HttpResponse {
    match serde_json::to_string(value) {
        Ok(body) => web::HttpResponse::Ok()
            .content_type("application/json")
            .header(CACHE_CONTROL, format!("public, max-age={}", state.config.defaults.cache_secs))
            .body(body),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("Error serializing response: {}", e)),
    }
}

fn get_query(req: &HttpRequest) -> QueryString {
    QueryString::from(req.uri().query().unwrap_or_default())
}

fn to_cards(posts: &[&Post], defaults: &ViewDefaults) -> Vec<PostCard> {
    posts.iter().map(|post| PostCard::from_post(post, defaults)).collect()
}

#[web::get("/api/blog")]
async fn all_posts(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    match state.posts.load().await {
        Ok(posts) => json_response(&state, posts.as_slice()),
        Err(e) => unavailable(&e),
    }
}

#[web::get("/api/blog/{year}/{month}/{slug}")]
async fn single_post(path: web::types::Path<(String, String, String)>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let (year, month, slug) = path.into_inner();
    let posts = match state.posts.load().await {
        Ok(posts) => posts,
        Err(e) => return unavailable(&e),
    };

    match find_by_route(&year, &month, &slug, &posts) {
        Some(post) => json_response(&state, post),
        None => error_response(StatusCode::NOT_FOUND, "Post not found"),
    }
}

#[web::get("/api/archive")]
async fn archive(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    match state.posts.load().await {
        Ok(posts) => json_response(&state, &group_by_year(&posts, &state.view_defaults)),
        Err(e) => unavailable(&e),
    }
}

#[web::get("/api/tags")]
async fn tags(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    match state.posts.load().await {
        Ok(posts) => json_response(&state, &tag_counts(&posts)),
        Err(e) => unavailable(&e),
    }
}

#[web::get("/api/search")]
async fn search(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let query = get_query(&req);
    let posts = match state.posts.load().await {
        Ok(posts) => posts,
        Err(e) => return unavailable(&e),
    };

    let found = filter_posts(&posts, &query.get_search(), &query.get_tags());
    json_response(&state, &to_cards(&found, &state.view_defaults))
}

#[web::get("/api/tag/{tag}")]
async fn tag_page(req: HttpRequest, path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let query = get_query(&req);
    let tag = path.into_inner();
    let posts = match state.posts.load().await {
        Ok(posts) => posts,
        Err(e) => return unavailable(&e),
    };

    let found = posts_with_tag(&posts, &tag, &query.get_search());
    json_response(&state, &to_cards(&found, &state.view_defaults))
}

#[web::get("/api/latest")]
async fn latest(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let count = get_query(&req).get_count(state.config.defaults.latest_count);
    let posts = match state.posts.load().await {
        Ok(posts) => posts,
        Err(e) => return unavailable(&e),
    };

    let newest: Vec<&Post> = posts.iter().take(count).collect();
    json_response(&state, &to_cards(&newest, &state.view_defaults))
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    info!("Aggregating posts from {}", config.cms.base_url);

    let app_state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => return Err(io::Error::other(format!("Error creating CMS client: {}", e))),
    };

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(all_posts)
            .service(single_post)
            .service(archive)
            .service(tags)
            .service(search)
            .service(tag_page)
            .service(latest)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use ntex::web::test;
    use serde_json::json;

    use super::*;
    use crate::cms::error::Result;
    use crate::cms::post::ApiResponse;
    use crate::config::parse_config;

    const CONFIG: &str = r##"
[cms]
base_url = "http://127.0.0.1:9/search/content/"

[server]
address = "127.0.0.1"
port = 8001
"##;

    fn post(name: &str, url: &str, keywords: &[&str]) -> Post {
        Post {
            name: name.to_string(),
            url: url.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            start_publish: "2024-03-15T10:00:00Z".to_string(),
            ..Default::default()
        }
    }

    /// State whose cache already holds the posts, so no request leaves the test.
    fn cached_state() -> Arc<AppState> {
        let state = AppState::new(parse_config(CONFIG).unwrap()).unwrap();
        state.posts.cache.add(ALL_POSTS_KEY, vec![
            post("Edge proxy", "/2024/03/edge-proxy/", &["CMS", "Cloudflare"]),
            post("Search tuning", "/2023/08/search-tuning", &["Search"]),
            post("Commerce notes", "/2022/01/commerce-notes/", &["Commerce", "CMS"]),
        ], Expire::Never);
        Arc::new(state)
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = test::init_service(
            web::App::new()
                .state(cached_state())
                .service(all_posts)
                .service(single_post)
                .service(archive)
                .service(tags)
                .service(search)
                .service(tag_page)
                .service(latest)
        ).await;
        let req = test::TestRequest::with_uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_unavailable_status() {
        assert_eq!(unavailable_status(&CmsError::Status(503)), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable_status(&CmsError::Status(404)), StatusCode::NOT_FOUND);
        assert_eq!(unavailable_status(&CmsError::Cancelled), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[ntex::test]
    async fn test_all_posts() {
        let (status, json) = get_json("/api/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["name"], "Edge proxy");
    }

    #[ntex::test]
    async fn test_single_post() {
        let (status, json) = get_json("/api/blog/2023/08/Search-Tuning").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Search tuning");

        let (status, json) = get_json("/api/blog/2023/08/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Post not found");
    }

    #[ntex::test]
    async fn test_archive_and_tags() {
        let (_, json) = get_json("/api/archive").await;
        let years: Vec<i64> = json.as_array().unwrap().iter().map(|y| y["year"].as_i64().unwrap()).collect();
        assert_eq!(years, [2024, 2023, 2022]);

        let (_, json) = get_json("/api/tags").await;
        assert_eq!(json[0]["name"], "CMS");
        assert_eq!(json[0]["count"], 2);
    }

    #[ntex::test]
    async fn test_search_and_tag_page() {
        let (_, json) = get_json("/api/search?q=NOTES&tags=cms").await;
        let cards = json.as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["slug"], "commerce-notes");
        assert_eq!(cards[0]["date"], "Mar 15, 2024");

        let (_, json) = get_json("/api/tag/cms").await;
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[ntex::test]
    async fn test_latest() {
        let (_, json) = get_json("/api/latest").await;
        assert_eq!(json.as_array().unwrap().len(), 2);

        let (_, json) = get_json("/api/latest?count=1").await;
        assert_eq!(json[0]["title"], "Edge proxy");
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    /// Serves `total` posts, optionally failing every page after the first.
    struct PagedSource {
        total: usize,
        fail_after_first: bool,
        calls: Cell<usize>,
    }

    impl PagedSource {
        fn new(total: usize, fail_after_first: bool) -> Self {
            PagedSource {
                total,
                fail_after_first,
                calls: Cell::new(0),
            }
        }
    }

    impl SearchSource for PagedSource {
        async fn fetch_page(&self, skip: usize, top: usize) -> Result<ApiResponse> {
            self.calls.set(self.calls.get() + 1);
            // Lets concurrent loads interleave mid-pass
            tokio::task::yield_now().await;
            if skip > 0 && self.fail_after_first {
                return Err(CmsError::Status(502));
            }

            let end = (skip + top).min(self.total);
            let results = (skip..end).map(|index| serde_json::from_value(json!({
                "Name": format!("Post {}", index),
                "Url": format!("/2024/01/post-{}/", index),
                "ContentLink": {"Id": index, "GuidValue": format!("guid-{}", index)}
            })).unwrap()).collect();
            Ok(ApiResponse {
                total_matching: self.total,
                results,
            })
        }
    }

    fn store(source: PagedSource) -> PostStore<PagedSource> {
        PostStore::new(source, AggregateOptions::default(), &Defaults::default())
    }

    #[tokio::test]
    async fn test_complete_pass_is_cached() {
        let store = store(PagedSource::new(250, false));
        assert_eq!(store.load().await.unwrap().len(), 250);
        assert_eq!(store.cache.get(ALL_POSTS_KEY).unwrap().len(), 250);

        store.load().await.unwrap();
        assert_eq!(store.source.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_truncated_pass_is_not_cached() {
        let store = store(PagedSource::new(250, true));
        let posts = store.load().await.unwrap();
        assert_eq!(posts.len(), 100);
        assert!(store.cache.get(ALL_POSTS_KEY).is_none());

        // The next load runs a fresh pass
        assert_eq!(store.load().await.unwrap().len(), 100);
        assert_eq!(store.source.calls.get(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_pass() {
        let store = store(PagedSource::new(250, false));
        let (first, second) = tokio::join!(store.load(), store.load());

        assert_eq!(first.unwrap().len(), 250);
        assert_eq!(second.unwrap().len(), 250);
        assert_eq!(store.source.calls.get(), 3);
    }
}
