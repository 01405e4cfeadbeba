use infill_worker::PoolConfig;
use serde::Deserialize;

use crate::ConfigError;

/// Settings for an [`Enricher`](crate::Enricher).
///
/// ```toml
/// max_cascade_depth = 16
///
/// [pool]
/// workers = 4
/// backlog = 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
	pub pool: PoolConfig,
	/// Nesting limit for cascades below the top-level object.
	pub max_cascade_depth: usize,
}

impl Default for EnrichConfig {
	fn default() -> Self {
		Self {
			pool: PoolConfig::default(),
			max_cascade_depth: 32,
		}
	}
}

impl EnrichConfig {
	/// Parses a TOML document; missing keys keep their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		toml::from_str(input).map_err(|err| ConfigError::Toml(err.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(EnrichConfig::from_toml_str("").unwrap(), EnrichConfig::default());
	}

	#[test]
	fn nested_pool_table_is_read() {
		let config = EnrichConfig::from_toml_str(
			r#"
			max_cascade_depth = 4

			[pool]
			workers = 3
			backlog = 0
			"#,
		)
		.unwrap();
		assert_eq!(config.max_cascade_depth, 4);
		assert_eq!(config.pool.workers, 3);
		assert_eq!(config.pool.backlog, 0);
		assert_eq!(config.pool.thread_name, PoolConfig::default().thread_name);
	}

	#[test]
	fn typos_are_reported() {
		let err = EnrichConfig::from_toml_str("max_depth = 3").unwrap_err();
		assert!(matches!(err, ConfigError::Toml(msg) if msg.contains("max_depth")));
	}
}
