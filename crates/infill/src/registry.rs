//! Handler singleton cache.
//!
//! # Invariants
//!
//! - At most one instance per handler type is ever published, including under
//!   concurrent first use.
//! - Entries are never evicted or replaced.
//! - Failed constructions are not cached; the next use retries.
//! - No registry lock is held while a constructor runs. Only first users of
//!   the same handler type wait for each other, so a constructor may itself
//!   use the registry for other handler types.

use std::any::TypeId;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, LazyLock};

use infill_worker::panic_message;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::{FillError, FillHandler, HandlerType};

/// Registry of handler instances keyed by handler type.
#[derive(Default)]
pub struct HandlerRegistry {
	handlers: RwLock<FxHashMap<TypeId, Arc<dyn FillHandler>>>,
	/// Per-type gates serializing first construction.
	building: Mutex<FxHashMap<TypeId, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for HandlerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HandlerRegistry").field("handlers", &self.len()).finish()
	}
}

static GLOBAL_REGISTRY: LazyLock<Arc<HandlerRegistry>> = LazyLock::new(|| Arc::new(HandlerRegistry::new()));

impl HandlerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Process-wide registry used by [`crate::enrich`].
	pub fn global() -> Arc<Self> {
		Arc::clone(&GLOBAL_REGISTRY)
	}

	/// Returns the cached instance for `ty`, if one was published.
	pub fn get(&self, ty: &HandlerType) -> Option<Arc<dyn FillHandler>> {
		self.handlers.read().get(&ty.id()).cloned()
	}

	/// Returns the cached instance for `ty`, constructing it on first use.
	///
	/// Racing first users of one type wait on that type's gate for the
	/// winner instead of building duplicates. A constructor that needs the
	/// same handler type it is building deadlocks.
	pub fn get_or_create(&self, ty: &HandlerType) -> Result<Arc<dyn FillHandler>, FillError> {
		if let Some(handler) = self.get(ty) {
			return Ok(handler);
		}

		let gate = Arc::clone(self.building.lock().entry(ty.id()).or_default());
		let _building = gate.lock();
		if let Some(handler) = self.get(ty) {
			return Ok(handler);
		}

		let handler = match catch_unwind(AssertUnwindSafe(|| ty.construct())) {
			Ok(Ok(handler)) => handler,
			Ok(Err(err)) => {
				return Err(FillError::Construct {
					handler: ty.name(),
					message: format!("{err:#}"),
				});
			}
			Err(payload) => {
				return Err(FillError::Construct {
					handler: ty.name(),
					message: panic_message(payload.as_ref()),
				});
			}
		};
		tracing::debug!(handler = ty.name(), "infill.registry.constructed");
		// `register` may have published an instance meanwhile; it wins.
		Ok(Arc::clone(self.handlers.write().entry(ty.id()).or_insert(handler)))
	}

	/// Publishes a pre-built instance unless one already exists.
	///
	/// Returns `true` if `handler` was inserted.
	pub fn register<H: FillHandler>(&self, handler: H) -> bool {
		let ty = HandlerType::of::<H>();
		let mut handlers = self.handlers.write();
		if handlers.contains_key(&ty.id()) {
			return false;
		}
		handlers.insert(ty.id(), Arc::new(handler));
		tracing::debug!(handler = ty.name(), "infill.registry.registered");
		true
	}

	pub fn contains<H: FillHandler>(&self) -> bool {
		self.handlers.read().contains_key(&TypeId::of::<H>())
	}

	pub fn len(&self) -> usize {
		self.handlers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Barrier;
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	use std::time::{Duration, Instant};

	use super::*;
	use crate::FillMetadata;

	static RACE_BUILDS: AtomicUsize = AtomicUsize::new(0);

	struct RaceHandler;

	impl FillHandler for RaceHandler {
		fn construct() -> anyhow::Result<Self> {
			RACE_BUILDS.fetch_add(1, Ordering::SeqCst);
			std::thread::sleep(std::time::Duration::from_millis(5));
			Ok(Self)
		}

		fn fill(&self, _metadata: &mut FillMetadata<'_>) -> anyhow::Result<()> {
			Ok(())
		}
	}

	static FLAKY_BUILDS: AtomicUsize = AtomicUsize::new(0);

	struct FlakyHandler;

	impl FillHandler for FlakyHandler {
		fn construct() -> anyhow::Result<Self> {
			if FLAKY_BUILDS.fetch_add(1, Ordering::SeqCst) == 0 {
				anyhow::bail!("backing table not loaded");
			}
			Ok(Self)
		}

		fn fill(&self, _metadata: &mut FillMetadata<'_>) -> anyhow::Result<()> {
			Ok(())
		}
	}

	struct PresetHandler {
		tag: &'static str,
	}

	impl FillHandler for PresetHandler {
		fn construct() -> anyhow::Result<Self> {
			Ok(Self { tag: "constructed" })
		}

		fn fill(&self, metadata: &mut FillMetadata<'_>) -> anyhow::Result<()> {
			metadata.set(self.tag.to_string())?;
			Ok(())
		}
	}

	#[test]
	fn concurrent_first_use_builds_one_instance() {
		let registry = HandlerRegistry::new();
		let ty = HandlerType::of::<RaceHandler>();
		let barrier = Barrier::new(8);
		let instances: Vec<Arc<dyn FillHandler>> = std::thread::scope(|s| {
			let handles: Vec<_> = (0..8)
				.map(|_| {
					s.spawn(|| {
						barrier.wait();
						registry.get_or_create(&ty).unwrap()
					})
				})
				.collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});

		assert_eq!(RACE_BUILDS.load(Ordering::SeqCst), 1);
		assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn failed_construction_is_retried() {
		let registry = HandlerRegistry::new();
		let ty = HandlerType::of::<FlakyHandler>();

		let err = registry.get_or_create(&ty).err().expect("first build fails");
		assert!(matches!(&err, FillError::Construct { message, .. } if message.contains("backing table")));
		assert!(!registry.contains::<FlakyHandler>());

		registry.get_or_create(&ty).unwrap();
		assert!(registry.contains::<FlakyHandler>());
	}

	static SLOW_STARTED: AtomicBool = AtomicBool::new(false);
	static SLOW_RELEASE: AtomicBool = AtomicBool::new(false);

	struct SlowHandler;

	impl FillHandler for SlowHandler {
		fn construct() -> anyhow::Result<Self> {
			SLOW_STARTED.store(true, Ordering::SeqCst);
			let deadline = Instant::now() + Duration::from_secs(5);
			while !SLOW_RELEASE.load(Ordering::SeqCst) && Instant::now() < deadline {
				std::thread::sleep(Duration::from_millis(1));
			}
			Ok(Self)
		}

		fn fill(&self, _metadata: &mut FillMetadata<'_>) -> anyhow::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn slow_construction_does_not_block_other_types() {
		let registry = HandlerRegistry::new();
		std::thread::scope(|s| {
			let slow = s.spawn(|| registry.get_or_create(&HandlerType::of::<SlowHandler>()).map(|_| ()));
			while !SLOW_STARTED.load(Ordering::SeqCst) {
				std::thread::yield_now();
			}

			// Another type builds and reads while the slow constructor is running.
			registry.get_or_create(&HandlerType::of::<PresetHandler>()).unwrap();
			assert!(registry.contains::<PresetHandler>());
			assert!(!registry.contains::<SlowHandler>());

			SLOW_RELEASE.store(true, Ordering::SeqCst);
			slow.join().unwrap().unwrap();
		});
		assert_eq!(registry.len(), 2);
	}

	#[test]
	fn register_is_insert_if_absent() {
		let registry = HandlerRegistry::new();
		assert!(registry.register(PresetHandler { tag: "preset" }));
		assert!(!registry.register(PresetHandler { tag: "late" }));
		assert_eq!(registry.len(), 1);

		// The preset instance wins over lazy construction.
		let ty = HandlerType::of::<PresetHandler>();
		let first = registry.get_or_create(&ty).unwrap();
		let again = registry.get(&ty).unwrap();
		assert!(Arc::ptr_eq(&first, &again));
	}
}
