//! Conformance suite runs against the memory backend.
//!
//! Everything here goes through `dyn Storager`, the same way an external
//! backend would be exercised:
//!
//! ```text
//! cargo test -p polystore-integration
//! ```

use std::sync::{Arc, Once};

use polystore_conformance::{Fixtures, StdRandom, UuidPaths};
use polystore_memory::MemoryStorage;
use polystore_types::Storager;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A fresh memory backend behind the contract trait.
#[must_use]
pub fn store() -> Arc<dyn Storager> {
    init_tracing();
    Arc::new(MemoryStorage::new())
}

/// Fixtures with entropy-seeded content and unique paths.
#[must_use]
pub fn fixtures() -> Fixtures {
    Fixtures::default()
}

/// Deterministic fixtures for reproducible runs.
#[must_use]
pub fn seeded_fixtures(seed: u64) -> Fixtures {
    Fixtures::new(StdRandom::seeded(seed), UuidPaths::default())
}

mod test_capabilities;
mod test_core;
mod test_suite;
