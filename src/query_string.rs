use std::collections::HashMap;

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString {
            items,
        }
    }

    /// Free text search, `q`.
    pub fn get_search(&self) -> String {
        self.items.get("q").map(|q| q.trim().to_string()).unwrap_or_default()
    }

    /// Selected tags, `tags=a,b`.
    pub fn get_tags(&self) -> Vec<String> {
        match self.items.get("tags") {
            Some(tags) => tags.split(',')
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(|tag| tag.to_string())
                .collect(),
            None => vec![],
        }
    }

    pub fn get_count(&self, default: usize) -> usize {
        match self.items.get("count").and_then(|val| val.parse::<usize>().ok()) {
            Some(0) | None => default,
            Some(count) => count,
        }
    }
}
