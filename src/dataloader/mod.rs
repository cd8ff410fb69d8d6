pub mod config;
pub mod error;
pub mod example;
pub mod info;
pub mod label;
pub mod manifest;
pub mod sampler;
pub mod transform;
