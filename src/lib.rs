pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod flex_id;
pub mod paginator;
pub mod pipeline;
pub mod playlist;
pub mod prober;
pub mod writer;

#[cfg(test)]
mod scripted;

pub use client::{CatalogClient, PageFetcher, PageResult};
pub use config::{HarvestConfig, LinkPolicy, ProbePolicy};
pub use errors::{HarvestError, TransportKind};
pub use pipeline::{harvest, run, Harvest, HarvestReport};
pub use prober::DiscoveredHost;
