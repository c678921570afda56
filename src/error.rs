//! Crate-level error types for command handling and dispatch.

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;
use crate::widget::ObjRef;

/// Failure reported by a backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached or timed out.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The requested object does not exist on the backend.
    #[error("object not found: {0}")]
    NotFound(ObjRef),

    #[error("{0}")]
    Other(String),
}

/// Serializable classification of a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    WidgetNotFound,
    InvalidTransition,
    BackendResolutionFailed,
    ValidationFailed,
}

/// Reason a command handler rejected a command.
///
/// A rejected command commits no mutations of its own; the runner turns the
/// error into a `CommandRejected` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The widget reference does not resolve to a widget of the expected kind.
    #[error("widget not found: {widget}")]
    WidgetNotFound { widget: ObjRef },

    /// The command is not allowed in the current dashboard state.
    #[error("invalid transition: {reason}")]
    InvalidTransition { reason: String },

    /// A collaborator call made while the handler was suspended failed.
    #[error("backend resolution failed: {0}")]
    BackendResolutionFailed(#[from] BackendError),

    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl CommandError {
    pub fn widget_not_found(widget: &ObjRef) -> Self {
        Self::WidgetNotFound {
            widget: widget.clone(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::WidgetNotFound { .. } => ErrorKind::WidgetNotFound,
            CommandError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            CommandError::BackendResolutionFailed(_) => ErrorKind::BackendResolutionFailed,
            CommandError::ValidationFailed { .. } | CommandError::Layout(_) => {
                ErrorKind::ValidationFailed
            }
        }
    }
}

/// Error returned to a caller waiting on a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The command was still queued when the dashboard was reset or
    /// unmounted; it was dropped without running.
    #[error("command cancelled before it ran")]
    Cancelled,

    /// The runner task has exited, so no further commands can be processed.
    #[error("dashboard runner is no longer running")]
    RunnerGone,
}
