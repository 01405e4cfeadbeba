use std::panic::{AssertUnwindSafe, catch_unwind};

use infill_worker::panic_message;

use crate::{FillError, FillMetadata, HandlerRegistry};

/// Hands `metadata` to the handler named by its marking.
///
/// The handler is looked up (or built) in `registry` and invoked on the
/// calling thread. Only the handler writes the field. Failures are logged
/// here and returned for the report; they never propagate further.
pub fn dispatch(registry: &HandlerRegistry, metadata: &mut FillMetadata<'_>) -> Result<(), FillError> {
	let handler_type = metadata.marking().handler;
	let result = registry.get_or_create(&handler_type).and_then(|handler| {
		match catch_unwind(AssertUnwindSafe(|| handler.fill(metadata))) {
			Ok(Ok(())) => Ok(()),
			Ok(Err(err)) => Err(match err.downcast::<FillError>() {
				Ok(fill_err) => fill_err,
				Err(err) => FillError::Handler {
					handler: handler_type.name(),
					message: format!("{err:#}"),
				},
			}),
			Err(payload) => Err(FillError::Panicked {
				handler: handler_type.name(),
				message: panic_message(payload.as_ref()),
			}),
		}
	});

	if let Err(err) = &result {
		tracing::warn!(
			host = metadata.host_type(),
			field = metadata.field_name(),
			handler = handler_type.name(),
			error = %err,
			"infill.dispatch.failed"
		);
	}
	result
}
