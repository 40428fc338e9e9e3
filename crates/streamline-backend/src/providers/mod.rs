//! Backend implementations

pub mod fixture;
pub mod p4;

pub use fixture::{Fixture, FixtureBackend};
pub use p4::P4Backend;

use super::backend::VcsBackend;
use anyhow::{Context, Result};
use streamline_core::{BackendConfig, BackendKind};

/// Factory function to create the configured backend
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn VcsBackend>> {
    match config.kind {
        BackendKind::P4 => Ok(Box::new(P4Backend::new(config))),
        BackendKind::Fixture => {
            let path = config
                .fixture
                .as_deref()
                .context("backend.fixture must be set for the fixture backend")?;
            let backend = FixtureBackend::load(path)
                .with_context(|| format!("failed to load fixture {}", path.display()))?;
            Ok(Box::new(backend))
        }
    }
}
