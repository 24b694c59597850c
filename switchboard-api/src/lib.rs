//! Remote gateway API for Switchboard.
//!
//! The console never talks to hardware directly; it talks to a gateway that
//! exposes one remote operation per action (fetch output configurations,
//! switch an output, read an app's configuration, ...). This crate defines
//! that contract and ships an in-memory implementation.
//!
//! - [`GatewayApi`]: async trait, one method per remote operation; payloads
//!   are JSON-shaped records
//! - [`ApiError`]: how a remote call fails (always carries a message)
//! - [`MemoryGateway`]: a gateway backed by a [`GatewayFixture`], used by the
//!   test suites and the console binary
//!
//! HTTP framing, authentication and JSON encoding belong to real transport
//! implementations of [`GatewayApi`] and are not part of this crate.

mod api;
mod error;
mod fixture;
mod memory;

pub use api::{GatewayApi, LedTarget};
pub use error::{ApiError, ApiResult};
pub use fixture::{AppFixture, GatewayFixture};
pub use memory::MemoryGateway;
