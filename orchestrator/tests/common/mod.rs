//! Common test utilities and infrastructure
//!
//! Fake projects on disk whose tools are shell scripts, plus helpers to run
//! stages against them.

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
#[allow(unused_imports)]
pub use fixtures::TestFixtures;
#[allow(unused_imports)]
pub use helpers::FakeProject;
