pub mod fetcher;

pub use fetcher::{AccessRoute, PageFetcher, PageSource};
