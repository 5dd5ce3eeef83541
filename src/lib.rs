pub mod config;
pub mod server;
pub mod logger;
pub mod cms;
pub mod aggregator;
pub mod lookup;
pub mod view;
pub mod content_cache;
mod text_utils;
mod query_string;

pub use aggregator::{fetch_all, AggregateOptions, Aggregator};
pub use lookup::find_by_route;
