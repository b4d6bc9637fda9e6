pub mod builder;
pub mod config;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod types;
pub mod utils;

pub use error::{Result, ScrapeError};
