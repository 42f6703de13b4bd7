//! Product sources for the trend-hunting pipeline: an Apify actor-backed
//! source and an offline sample catalog.

pub mod apify;
pub mod error;
pub mod normalize;
pub(crate) mod parse;
pub(crate) mod rate_limit;
pub mod sample;
pub mod source;
pub mod types;

pub use apify::ApifyClient;
pub use error::ApifyError;
pub use normalize::normalize_item;
pub use sample::SampleCatalog;
pub use source::ApifyProductSource;
pub use types::{RunData, TrendSearchInput};
