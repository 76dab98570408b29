//! Error type shared by the console controllers and the API client.
//!
//! Nothing here is fatal: every variant maps back to an interactive, retryable state.

use thiserror::Error;

/// Failure surfaced to the operator by a console operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
	/// The server rejected the session token (HTTP 401).
	#[error("not authorized, please log in again")]
	Unauthorized,

	/// An access key is required to log in.
	#[error("access key is empty")]
	EmptyAccessKey,

	/// The server refused the access key.
	#[error("invalid access key")]
	InvalidAccessKey,

	/// A relation needs a non-empty type before it is sent.
	#[error("relation type is empty")]
	EmptyRelationType,

	/// Linking an entity needs a target session id.
	#[error("session id is empty")]
	EmptySessionId,

	/// Saving properties with nothing to save.
	#[error("no properties to update")]
	NoPropertyEdits,

	/// Property key outside the editable allow-list.
	#[error("property `{0}` is not editable")]
	PropertyNotEditable(String),

	/// A relation from a node to itself.
	#[error("cannot connect a node to itself")]
	SelfLoop,

	/// The operation needs a selected node.
	#[error("no node selected")]
	NoSelection,

	/// The operation needs the selection to be in edit mode.
	#[error("node is not being edited")]
	NotEditing,

	/// Linking to a session only works for entity nodes.
	#[error("`{0}` is not an entity node")]
	NotAnEntity(String),

	/// A debug search needs a query.
	#[error("search query is empty")]
	EmptyQuery,

	/// No graph scope has been loaded yet.
	#[error("no session loaded")]
	NoSessionLoaded,

	/// Nothing to visualize.
	#[error("no debug search result")]
	NoDebugResult,

	/// No connect-mode pair is waiting for a relation type.
	#[error("no pending connection")]
	NoPendingEdge,

	/// The id is not part of the current snapshot.
	#[error("node `{0}` is not in the current graph")]
	UnknownNode(String),

	/// Non-2xx response; `message` is the server detail or the status text.
	#[error("{message}")]
	Server {
		/// HTTP status code.
		status: u16,
		/// Server-provided detail, or the transport status text.
		message: String,
	},

	/// The request never produced a response.
	#[error("connection error: {0}")]
	Transport(String),

	/// The response body could not be decoded.
	#[error("malformed response: {0}")]
	Decode(String),
}

impl ConsoleError {
	/// True for failures that force a logout.
	pub fn is_auth(&self) -> bool {
		matches!(self, Self::Unauthorized)
	}

	/// True for failures rejected locally before any network call.
	pub fn is_validation(&self) -> bool {
		matches!(
			self,
			Self::EmptyAccessKey
				| Self::EmptyRelationType
				| Self::EmptySessionId
				| Self::NoPropertyEdits
				| Self::PropertyNotEditable(_)
				| Self::SelfLoop
				| Self::NoSelection
				| Self::NotEditing
				| Self::NotAnEntity(_)
				| Self::EmptyQuery
				| Self::NoSessionLoaded
				| Self::NoDebugResult
				| Self::NoPendingEdge
				| Self::UnknownNode(_)
		)
	}
}

impl From<reqwest::Error> for ConsoleError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			Self::Decode(err.to_string())
		} else {
			Self::Transport(err.to_string())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_error_displays_detail_verbatim() {
		let err = ConsoleError::Server {
			status: 409,
			message: "relation already exists".into(),
		};
		assert_eq!(err.to_string(), "relation already exists");
		assert!(!err.is_validation());
		assert!(!err.is_auth());
	}

	#[test]
	fn classification() {
		assert!(ConsoleError::Unauthorized.is_auth());
		assert!(ConsoleError::SelfLoop.is_validation());
		assert!(ConsoleError::EmptyRelationType.is_validation());
		assert!(!ConsoleError::Transport("reset".into()).is_validation());
	}
}
