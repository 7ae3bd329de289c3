//! Provider resolution
//!
//! Turns construction options into a concrete provider: a pre-built
//! instance is used as-is, otherwise `type` is looked up in a static
//! registry and its constructor is fed `config`. Resolution never
//! performs I/O.

use std::sync::Arc;
use tracing::debug;

use super::drive::DriveProvider;
use super::fs::FsProvider;
use super::traits::CloudProvider;
use crate::config::ProviderOptions;
use crate::error::{CloudFileError, CloudResult};

type ProviderCtor = fn(&serde_json::Value) -> CloudResult<Arc<dyn CloudProvider>>;

/// Known backends, by registry name
static REGISTRY: &[(&str, ProviderCtor)] = &[
	("google-drive-v2", DriveProvider::v2_from_value as ProviderCtor),
	("google-drive-v3", DriveProvider::v3_from_value as ProviderCtor),
	("local-fs", FsProvider::from_value as ProviderCtor),
];

/// Names accepted in `provider.type`
pub fn registered_types() -> Vec<&'static str> {
	REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Resolve the provider named by `options`
pub fn resolve_provider(options: &ProviderOptions) -> CloudResult<Arc<dyn CloudProvider>> {
	if let Some(instance) = &options.instance {
		debug!("Using pre-built {} provider", instance.kind());
		return Ok(instance.clone());
	}

	let kind = options.kind.as_deref().ok_or_else(|| {
		CloudFileError::resolution("provider.instance or provider.type is required")
	})?;

	let ctor = REGISTRY
		.iter()
		.find(|(name, _)| *name == kind)
		.map(|(_, ctor)| *ctor)
		.ok_or_else(|| {
			CloudFileError::resolution(format!(
				"provider not found: {} (known: {})",
				kind,
				registered_types().join(", ")
			))
		})?;

	debug!("Resolving {} provider from config", kind);
	ctor(&options.config)
}


// vim: ts=4
