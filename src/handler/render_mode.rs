use std::collections::BTreeMap;

use tracing::debug;

use super::{DashboardContext, HandlerOutput};
use crate::error::CommandError;
use crate::event::{DashboardEvent, EventPayload};
use crate::state::{DashboardState, Mutation, RenderMode};
use crate::widget::{ObjRef, Widget};

/// Switch between view and edit mode.
///
/// Toasts are cleared on every path, including rejection. With edit mode
/// globally disabled a request for edit mode is answered as view mode and
/// nothing but the toasts changes.
pub(super) async fn change_render_mode(
    ctx: &DashboardContext,
    state: &DashboardState,
    tag: &str,
    render_mode: RenderMode,
    reset_dashboard: bool,
    correlation_id: Option<String>,
) -> HandlerOutput {
    let clear_toasts = vec![Mutation::RemoveAllToasts];

    if render_mode == RenderMode::Edit && !ctx.config.edit_mode_enabled {
        debug!("edit mode is disabled, staying in view mode");
        return HandlerOutput {
            mutations: clear_toasts,
            event: DashboardEvent::new(
                EventPayload::RenderModeChanged {
                    render_mode: RenderMode::View,
                },
                correlation_id,
            ),
        };
    }

    if render_mode == RenderMode::Edit {
        // Validate what the widgets will look like after the optional reset.
        let widgets = if reset_dashboard {
            &state.persisted.widgets
        } else {
            &state.widgets
        };
        if let Err(err) = validate_drills(ctx, widgets).await {
            return HandlerOutput {
                mutations: clear_toasts,
                event: DashboardEvent::rejected(tag, &err, correlation_id),
            };
        }
    }

    let mut mutations = clear_toasts;
    mutations.push(Mutation::SetRenderMode(render_mode));
    if reset_dashboard {
        mutations.push(Mutation::ResetToPersisted);
    }

    HandlerOutput {
        mutations,
        event: DashboardEvent::new(EventPayload::RenderModeChanged { render_mode }, correlation_id),
    }
}

/// Check every configured drill target against the backend.
async fn validate_drills(
    ctx: &DashboardContext,
    widgets: &BTreeMap<ObjRef, Widget>,
) -> Result<(), CommandError> {
    let mut invalid = Vec::new();
    for (widget_ref, widget) in widgets {
        for target in widget.drill_targets() {
            if !ctx.backend.drills.target_exists(&target).await? {
                debug!(widget = %widget_ref, ?target, "drill target no longer exists");
                if !invalid.contains(widget_ref) {
                    invalid.push(widget_ref.clone());
                }
            }
        }
    }

    if invalid.is_empty() {
        return Ok(());
    }
    let list: Vec<&str> = invalid.iter().map(ObjRef::as_str).collect();
    Err(CommandError::ValidationFailed {
        reason: format!("invalid drill targets on widgets: {}", list.join(", ")),
    })
}
