use std::any::Any;

use tokio::task::JoinError;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&'static str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

/// Returns the panic message of a failed task, or `None` if it was aborted.
pub(crate) fn join_error_panic_message(err: JoinError) -> Option<String> {
	if err.is_panic() {
		Some(panic_message(&*err.into_panic()))
	} else {
		None
	}
}
