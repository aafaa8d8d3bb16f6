use std::sync::Arc;

use crate::{Engine, EngineConfig, EngineError, ProcessEngine, RegexEngine, RegexFlavor};

/// Engines available to a session, in registration order.
#[derive(Default, Clone)]
pub struct EngineRegistry {
	engines: Vec<Arc<dyn Engine>>,
}

impl EngineRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry holding the in-process `regex` and `fancy-regex` engines.
	pub fn with_builtins() -> Self {
		let mut registry = Self::new();
		for flavor in [RegexFlavor::Standard, RegexFlavor::Fancy] {
			registry.engines.push(Arc::new(RegexEngine::new(flavor)));
		}
		registry
	}

	/// Built-in engines plus one [`ProcessEngine`] per config entry.
	///
	/// # Errors
	///
	/// Fails if two engines share a name.
	pub fn from_configs<'a>(configs: impl IntoIterator<Item = &'a EngineConfig>) -> Result<Self, EngineError> {
		let mut registry = Self::with_builtins();
		for config in configs {
			registry.register(Arc::new(ProcessEngine::new(config.clone())))?;
		}
		Ok(registry)
	}

	/// Adds `engine`, rejecting a name that is already taken.
	pub fn register(&mut self, engine: Arc<dyn Engine>) -> Result<(), EngineError> {
		if self.get(engine.name()).is_some() {
			return Err(EngineError::DuplicateEngine(engine.name().to_string()));
		}
		tracing::debug!(engine = engine.name(), kind = ?engine.kind(), "engine.registered");
		self.engines.push(engine);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn Engine>> {
		self.engines.iter().find(|e| e.name() == name).cloned()
	}

	/// Like [`Self::get`], but an unknown name is an error.
	pub fn require(&self, name: &str) -> Result<Arc<dyn Engine>, EngineError> {
		self.get(name).ok_or_else(|| EngineError::UnknownEngine(name.to_string()))
	}

	pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
		self.engines.iter().map(|e| e.name())
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Engine>> + '_ {
		self.engines.iter()
	}

	pub fn len(&self) -> usize {
		self.engines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.engines.is_empty()
	}
}

impl std::fmt::Debug for EngineRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.names()).finish()
	}
}
