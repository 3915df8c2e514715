//! Web-facing collaborators: search, page fetching, and caching

pub mod cache;
pub mod fetcher;
pub mod search;

pub use cache::{MemoryCache, SearchResultCache};
pub use fetcher::PageFetcher;
pub use search::BraveSearchClient;
