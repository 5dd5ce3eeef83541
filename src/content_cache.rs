use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::cms::post::Post;

pub const ALL_POSTS_KEY: &str = "all-posts";

/// Keeps aggregated results around for their freshness window.
pub struct ContentCache<T> {
    cache: Option<RwLock<CacheMap<T>>>,
}

type CacheMap<T> = HashMap<String, CacheValue<T>>;

pub type PostCache = ContentCache<Vec<Post>>;

#[derive(Clone, Copy)]
pub enum Expire {
    Never,
    After(Duration),
}

struct CacheValue<T> {
    expire_date: DateTime<Utc>,
    value: Arc<T>,
}

impl<T> ContentCache<T> {
    fn new() -> Self {
        ContentCache {
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    fn non_caching() -> Self {
        ContentCache {
            cache: None,
        }
    }

    /// A cache holding entries for `secs` seconds. Zero disables caching.
    pub fn with_window(secs: u64) -> Self {
        if secs == 0 {
            Self::non_caching()
        } else {
            Self::new()
        }
    }

    pub fn add(&self, key: &str, content: T, expire_after: Expire) -> Arc<T> {
        let value = Arc::new(content);
        if let Some(ref cache) = self.cache {
            let expire_date = match expire_after {
                Expire::Never => DateTime::<Utc>::MAX_UTC,
                Expire::After(duration) => Utc::now().checked_add_signed(duration).unwrap_or(DateTime::<Utc>::MAX_UTC),
            };

            let mut cache = cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(key.to_string(), CacheValue {
                expire_date,
                value: value.clone(),
            });
        }
        value
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let cache = self.cache.as_ref()?;
        let cache = cache.read().unwrap_or_else(|e| e.into_inner());
        let cache_value = cache.get(key)?;
        if Utc::now() > cache_value.expire_date {
            return None;
        }
        Some(cache_value.value.clone())
    }
}
