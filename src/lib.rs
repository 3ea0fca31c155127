pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod series;
pub mod stats;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod test_support;
