//! Command handlers.
//!
//! [`handle`] routes a command to the handler for its type. A handler reads
//! the current snapshot, may suspend on backend calls, and returns the
//! mutations to commit together with exactly one terminal event. A rejected
//! command commits nothing, except that a render mode change always clears
//! toasts.

mod dashboard;
mod kpi;
mod layout;
mod render_mode;
mod ui;

use crate::backend::Backend;
use crate::command::{CommandPayload, DashboardCommand};
use crate::config::DashboardConfig;
use crate::error::CommandError;
use crate::event::{DashboardEvent, EventPayload};
use crate::state::{DashboardState, Mutation};

/// Read-only context shared by all handlers of a dashboard instance.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub backend: Backend,
    pub config: DashboardConfig,
}

/// Mutations to commit and the terminal event to emit for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutput {
    pub mutations: Vec<Mutation>,
    pub event: DashboardEvent,
}

impl HandlerOutput {
    fn rejected(command: &str, error: &CommandError, correlation_id: Option<String>) -> Self {
        Self {
            mutations: Vec::new(),
            event: DashboardEvent::rejected(command, error, correlation_id),
        }
    }
}

/// Result of a handler that may reject: mutations plus the success payload.
pub(crate) type HandlerResult = Result<(Vec<Mutation>, EventPayload), CommandError>;

/// Handle one command against a snapshot.
///
/// Never fails: rejections are reported through the returned event.
pub async fn handle(
    ctx: &DashboardContext,
    state: &DashboardState,
    cmd: DashboardCommand,
) -> HandlerOutput {
    let tag = cmd.tag();
    let correlation_id = cmd.correlation_id;

    let result = match cmd.payload {
        CommandPayload::ChangeRenderMode {
            render_mode,
            reset_dashboard,
        } => {
            return render_mode::change_render_mode(
                ctx,
                state,
                tag,
                render_mode,
                reset_dashboard,
                correlation_id,
            )
            .await;
        }
        CommandPayload::ResetDashboard => dashboard::reset(),

        CommandPayload::ChangeKpiWidgetHeader { widget, header } => {
            kpi::change_header(state, widget, header)
        }
        CommandPayload::ChangeKpiWidgetMeasure {
            widget,
            measure,
            header,
        } => kpi::change_measure(ctx, state, widget, measure, header).await,
        CommandPayload::ChangeKpiWidgetFilterSettings { widget, operation } => {
            kpi::change_filter_settings(ctx, state, widget, operation).await
        }
        CommandPayload::ChangeKpiWidgetComparison { widget, comparison } => {
            kpi::change_comparison(state, widget, comparison)
        }
        CommandPayload::RefreshKpiWidget { widget } => kpi::refresh(state, widget),
        CommandPayload::SetDrillForKpiWidget {
            widget,
            legacy_dashboard,
            legacy_dashboard_tab,
        } => kpi::set_drill(state, widget, legacy_dashboard, legacy_dashboard_tab),
        CommandPayload::RemoveDrillForKpiWidget { widget } => kpi::remove_drill(state, widget),

        CommandPayload::AddLayoutSection {
            index,
            header,
            items,
            widgets,
        } => layout::add_section(state, index, header, items, widgets),
        CommandPayload::RemoveLayoutSection { index } => layout::remove_section(state, index),
        CommandPayload::MoveLayoutSection { from, to } => layout::move_section(state, from, to),
        CommandPayload::MoveSectionItem {
            from_section,
            from_item,
            to_section,
            to_item,
        } => layout::move_item(state, from_section, from_item, to_section, to_item),
        CommandPayload::MoveSectionItemToNewSection {
            from_section,
            from_item,
            to_section,
        } => layout::move_item_to_new_section(state, from_section, from_item, to_section),
        CommandPayload::RemoveSectionItem { section, item } => {
            layout::remove_item(state, section, item)
        }

        CommandPayload::AddToastMessage { id, text, severity } => {
            ui::add_toast(id, text, severity)
        }
        CommandPayload::RemoveToastMessage { id } => ui::remove_toast(id),
        CommandPayload::SelectWidget { widget } => ui::select_widget(state, widget),
    };

    match result {
        Ok((mutations, payload)) => HandlerOutput {
            mutations,
            event: DashboardEvent::new(payload, correlation_id),
        },
        Err(err) => HandlerOutput::rejected(tag, &err, correlation_id),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::context;
    use super::*;
    use crate::command;
    use crate::error::ErrorKind;
    use crate::state::RenderMode;
    use crate::state::test_fixtures::sample_document;
    use crate::widget::{KpiComparison, ObjRef, WidgetHeader};

    #[tokio::test]
    async fn every_kpi_command_rejects_unknown_widget_without_mutations() {
        let ctx = context();
        let state = DashboardState::new(sample_document(), RenderMode::Edit);
        let ghost = || ObjRef::new("ghost");

        let commands = vec![
            command::change_kpi_widget_header(ghost(), WidgetHeader::titled("x")),
            command::change_kpi_widget_measure(ghost(), ObjRef::new("m.orders"), None),
            command::disable_kpi_widget_date_filter(ghost()),
            command::ignore_filter_on_kpi_widget(ghost(), [ObjRef::new("label.region")]),
            command::unignore_filter_on_kpi_widget(ghost(), [ObjRef::new("label.region")]),
            command::change_kpi_widget_comparison(ghost(), KpiComparison::default()),
            command::refresh_kpi_widget(ghost()),
            command::set_drill_for_kpi_widget(ghost(), ObjRef::new("legacy"), "tab"),
            command::remove_drill_for_kpi_widget(ghost()),
            command::select_widget(Some(ghost())),
        ];

        for cmd in commands {
            let tag = cmd.tag();
            let output = handle(&ctx, &state, cmd.with_correlation_id("c")).await;
            assert!(output.mutations.is_empty(), "{tag} produced mutations");
            assert_eq!(
                output.event.rejection_kind(),
                Some(ErrorKind::WidgetNotFound),
                "{tag} should reject with WidgetNotFound"
            );
            assert_eq!(output.event.correlation_id.as_deref(), Some("c"));
        }
    }

    #[tokio::test]
    async fn insight_widget_is_not_a_kpi() {
        let ctx = context();
        let state = DashboardState::new(sample_document(), RenderMode::View);
        let output = handle(&ctx, &state, command::refresh_kpi_widget(ObjRef::new("w2"))).await;
        assert_eq!(output.event.rejection_kind(), Some(ErrorKind::WidgetNotFound));
    }

    #[tokio::test]
    async fn reset_produces_reset_mutation_and_event() {
        let ctx = context();
        let state = DashboardState::new(sample_document(), RenderMode::Edit);
        let output = handle(&ctx, &state, command::reset_dashboard()).await;
        assert_eq!(output.mutations, vec![Mutation::ResetToPersisted]);
        assert_eq!(output.event.payload, EventPayload::DashboardWasReset);
    }
}
