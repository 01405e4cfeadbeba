use infill_worker::PoolError;

/// Why one field could not be filled.
///
/// Field errors are recorded per field and never abort the enclosing call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FillError {
	/// The handler could not be constructed.
	#[error("failed to construct handler {handler}: {message}")]
	Construct { handler: &'static str, message: String },

	/// The handler returned an error.
	#[error("handler {handler} failed: {message}")]
	Handler { handler: &'static str, message: String },

	/// The handler or the cascade below it panicked.
	#[error("{handler} panicked: {message}")]
	Panicked { handler: &'static str, message: String },

	/// A value of the wrong type was written into the field.
	#[error("field expects a value of type {expected}")]
	FieldType { expected: &'static str },
}

/// Configuration parse failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid enrich config: {0}")]
	Toml(String),
}

/// Unrecoverable failures of a top-level call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichError {
	#[error(transparent)]
	Pool(#[from] PoolError),

	#[error(transparent)]
	Config(#[from] ConfigError),
}
