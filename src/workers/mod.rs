pub mod cache_warmer;
pub mod executor;
pub mod refresh;

pub use cache_warmer::CacheWarmerWorker;
pub use executor::TaskExecutor;
pub use refresh::{
    LoadError, LoadReport, RefreshCoordinator, RefreshGuard, RefreshState, ValidationError,
};
