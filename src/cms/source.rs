use std::future::Future;
use std::time::Duration;

use spdlog::debug;

use crate::cms::error::{CmsError, Result};
use crate::cms::post::ApiResponse;
use crate::config::Cms;

pub const BLOG_POST_FILTER: &str = "ContentType/any(t:t eq 'BlogPostPage')";
pub const NEWEST_FIRST: &str = "StartPublish desc";

/// Fixed part of a search request. Paging parameters are added per page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub filter: String,
    pub order_by: String,
    pub personalize: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery {
            filter: BLOG_POST_FILTER.to_string(),
            order_by: NEWEST_FIRST.to_string(),
            personalize: true,
        }
    }
}

impl SearchQuery {
    pub fn params(&self, skip: usize, top: usize) -> Vec<(&'static str, String)> {
        vec![
            ("filter", self.filter.clone()),
            ("orderby", self.order_by.clone()),
            ("personalize", self.personalize.to_string()),
            ("skip", skip.to_string()),
            ("top", top.to_string()),
        ]
    }
}

/// Anything that can answer one page of the blog search.
pub trait SearchSource {
    fn fetch_page(&self, skip: usize, top: usize) -> impl Future<Output = Result<ApiResponse>>;
}

/// The CMS search endpoint reached over HTTP.
pub struct HttpSearchSource {
    client: reqwest::Client,
    base_url: String,
    query: SearchQuery,
}

impl HttpSearchSource {
    pub fn new(cms: &Cms) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cms.timeout_secs))
            .build()?;

        Ok(HttpSearchSource {
            client,
            base_url: cms.base_url.clone(),
            query: SearchQuery {
                filter: cms.filter.clone(),
                order_by: cms.order_by.clone(),
                personalize: cms.personalize,
            },
        })
    }
}

impl SearchSource for HttpSearchSource {
    async fn fetch_page(&self, skip: usize, top: usize) -> Result<ApiResponse> {
        debug!("Requesting {} skip={} top={}", self.base_url, skip, top);
        let response = self.client
            .get(&self.base_url)
            .query(&self.query.params(skip, top))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let page = serde_json::from_slice::<ApiResponse>(&body)?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = SearchQuery::default();
        let params = query.params(200, 100);
        assert_eq!(params, vec![
            ("filter", "ContentType/any(t:t eq 'BlogPostPage')".to_string()),
            ("orderby", "StartPublish desc".to_string()),
            ("personalize", "true".to_string()),
            ("skip", "200".to_string()),
            ("top", "100".to_string()),
        ]);
    }

    #[test]
    fn test_encoded_query() {
        let query = SearchQuery::default();
        let encoded = serde_urlencoded::to_string(query.params(0, 100)).unwrap();
        assert_eq!(encoded, "filter=ContentType%2Fany%28t%3At+eq+%27BlogPostPage%27%29&orderby=StartPublish+desc&personalize=true&skip=0&top=100");
    }
}
