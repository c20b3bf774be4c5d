//! Fixture HTTP server for browser tests
//!
//! Serves three static routes (`/json`, `/text`, `/image`) and tells the
//! orchestrator once its socket is bound.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{FixtureError, FixtureResult};
pub use routes::{router, FixtureState, JsonFixture};
pub use server::{run, BoundServer, FixtureServer, ReadinessNotifier, SERVER_NAME};
