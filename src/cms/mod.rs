pub mod error;
pub mod field;
pub mod post;
pub mod source;

pub use error::CmsError;
pub use post::{ApiResponse, Post, RawPost};
pub use source::{HttpSearchSource, SearchQuery, SearchSource};
