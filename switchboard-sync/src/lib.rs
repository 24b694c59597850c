//! Keeps local entity collections in step with the gateway.
//!
//! # Architecture
//!
//! - **crossfill**: reconciles a list of entities against a freshly fetched
//!   list of records, preserving entity identity
//! - **Collection**: the list plus a key index
//! - **Synchronizer**: fetch, reconcile, sort; driven by a
//!   [`switchboard_refresh::Refresher`]
//! - **loaders**: one ready-made synchronizer per gateway collection
//! - **events**: pushed changes applied between polls
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use switchboard_api::{GatewayFixture, MemoryGateway};
//! use switchboard_sync::{loaders, SyncConfig};
//!
//! let gateway = Arc::new(MemoryGateway::new(GatewayFixture::default()));
//! let config = SyncConfig::default();
//! let inputs = Arc::new(loaders::inputs(gateway, config.inputs));
//! assert_eq!(inputs.name(), "inputs");
//! ```

mod collection;
mod config;
mod crossfill;
mod error;
mod events;
pub mod loaders;
mod synchronizer;

pub use collection::Collection;
pub use config::{RefreshConfig, SyncConfig};
pub use crossfill::{crossfill, Factory, ReconcileReport};
pub use error::{SyncError, SyncResult};
pub use events::{apply_event, GatewayEvent, OutputState};
pub use synchronizer::{SyncOutcome, Synchronizer};
