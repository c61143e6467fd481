//! Backend error types

use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a session backend
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
	/// No connection to the store could be established or checked out
	#[error("Connection error: {0}")]
	Connection(String),

	/// The store rejected or failed a command
	#[error("Command error: {0}")]
	Command(String),

	/// The operation did not finish in time
	#[error("Operation timed out after {0:?}")]
	Timeout(Duration),
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;
