use super::HandlerResult;
use crate::error::CommandError;
use crate::event::EventPayload;
use crate::state::{DashboardState, Mutation, Toast, ToastSeverity};
use crate::widget::ObjRef;

pub(super) fn add_toast(id: String, text: String, severity: ToastSeverity) -> HandlerResult {
    let toast = Toast { id, text, severity };
    Ok((
        vec![Mutation::AddToast(toast.clone())],
        EventPayload::ToastMessageAdded { toast },
    ))
}

/// Removing an unknown toast is not an error.
pub(super) fn remove_toast(id: String) -> HandlerResult {
    Ok((
        vec![Mutation::RemoveToast(id.clone())],
        EventPayload::ToastMessageRemoved { id },
    ))
}

pub(super) fn select_widget(state: &DashboardState, widget: Option<ObjRef>) -> HandlerResult {
    if let Some(widget_ref) = &widget
        && state.widget(widget_ref).is_none()
    {
        return Err(CommandError::widget_not_found(widget_ref));
    }
    Ok((
        vec![Mutation::SelectWidget(widget.clone())],
        EventPayload::WidgetSelected { widget },
    ))
}
