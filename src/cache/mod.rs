pub mod fallback;
pub mod scraper_cache;

pub use scraper_cache::{LiveSource, ScraperCache};
