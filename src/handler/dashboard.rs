use super::HandlerResult;
use crate::event::EventPayload;
use crate::state::Mutation;

/// Discard unsaved changes. The render mode is left as it is.
pub(super) fn reset() -> HandlerResult {
    Ok((vec![Mutation::ResetToPersisted], EventPayload::DashboardWasReset))
}
