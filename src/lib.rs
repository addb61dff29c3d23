//! Bounded-memory streaming graph ingestion with an online, local,
//! SCD-style community assignment engine (spec.md §1–§2).

pub mod adjacency;
pub mod buffer_pool;
pub mod community;
pub mod config;
pub mod engine;
pub mod error;
pub mod page;
pub mod store;

pub use community::Community;
pub use config::{EdgeMode, GraphConfig};
pub use engine::CommunityEngine;
pub use error::{GraphError, Result};
pub use page::{Edge, IntId};
pub use store::{ExtId, GraphCallbacks, GraphStore, GraphStoreView};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
