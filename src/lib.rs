pub mod dataloader;
pub mod worker;

pub use dataloader::config::{FetcherConfig, SampleErrorPolicy};
pub use dataloader::error::{FetcherError, Result};
pub use dataloader::example::LoadedExample;
pub use dataloader::label::Label;
pub use dataloader::transform::ImageArray;
pub use worker::fetcher::DataFetcher;
