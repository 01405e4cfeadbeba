use serde::Deserialize;

/// Shape of an [`ExecutionPool`](crate::ExecutionPool).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
	/// Worker thread count. Zero is clamped to one.
	pub workers: usize,
	/// Tasks that may wait for a worker before submitters start running
	/// overflow inline.
	pub backlog: usize,
	/// Prefix for worker thread names; the worker index is appended.
	pub thread_name: String,
}

impl Default for PoolConfig {
	fn default() -> Self {
		Self {
			workers: 1,
			backlog: 1,
			thread_name: "infill-worker".to_string(),
		}
	}
}

impl PoolConfig {
	/// Worker count after clamping.
	pub fn effective_workers(&self) -> usize {
		self.workers.max(1)
	}

	/// Maximum number of tasks admitted to the pool at once.
	pub fn capacity(&self) -> usize {
		self.effective_workers().saturating_add(self.backlog)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn missing_keys_fall_back_to_defaults() {
		let config: PoolConfig = toml::from_str("workers = 4").unwrap();
		assert_eq!(
			config,
			PoolConfig {
				workers: 4,
				..PoolConfig::default()
			}
		);
		assert_eq!(config.capacity(), 5);
	}

	#[test]
	fn zero_workers_clamps_to_one() {
		let config = PoolConfig {
			workers: 0,
			backlog: 0,
			..PoolConfig::default()
		};
		assert_eq!(config.effective_workers(), 1);
		assert_eq!(config.capacity(), 1);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(toml::from_str::<PoolConfig>("threads = 2").is_err());
	}
}
