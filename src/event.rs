//! Events emitted once a command completes.
//!
//! Every command yields exactly one terminal event: either the success event
//! of its handler or [`EventPayload::CommandRejected`]. Events carry the
//! originating command's correlation id and are broadcast to all subscribers
//! in command dispatch order.

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, ErrorKind};
use crate::layout::{LayoutItem, LayoutSection};
use crate::state::{RenderMode, Toast};
use crate::widget::{KpiComparison, LegacyDrill, ObjRef, WidgetHeader};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum EventPayload {
    #[serde(rename = "GDC.DASH/EVT.RENDER_MODE.CHANGED")]
    RenderModeChanged { render_mode: RenderMode },

    #[serde(rename = "GDC.DASH/EVT.RESET")]
    DashboardWasReset,

    #[serde(rename = "GDC.DASH/EVT.KPI_WIDGET.HEADER_CHANGED")]
    KpiWidgetHeaderChanged {
        #[serde(rename = "ref")]
        widget: ObjRef,
        header: WidgetHeader,
    },

    #[serde(rename = "GDC.DASH/EVT.KPI_WIDGET.MEASURE_CHANGED")]
    KpiWidgetMeasureChanged {
        #[serde(rename = "ref")]
        widget: ObjRef,
        measure: ObjRef,
        header: WidgetHeader,
    },

    #[serde(rename = "GDC.DASH/EVT.KPI_WIDGET.FILTER_SETTINGS_CHANGED")]
    KpiWidgetFilterSettingsChanged {
        #[serde(rename = "ref")]
        widget: ObjRef,
        date_dataset: Option<ObjRef>,
        ignored_filters: Vec<ObjRef>,
    },

    #[serde(rename = "GDC.DASH/EVT.KPI_WIDGET.COMPARISON_CHANGED")]
    KpiWidgetComparisonChanged {
        #[serde(rename = "ref")]
        widget: ObjRef,
        comparison: KpiComparison,
    },

    #[serde(rename = "GDC.DASH/EVT.KPI_WIDGET.REFRESHED")]
    KpiWidgetRefreshed {
        #[serde(rename = "ref")]
        widget: ObjRef,
    },

    #[serde(rename = "GDC.DASH/EVT.KPI_WIDGET.DRILL_SET")]
    KpiWidgetDrillSet {
        #[serde(rename = "ref")]
        widget: ObjRef,
        drill: LegacyDrill,
    },

    #[serde(rename = "GDC.DASH/EVT.KPI_WIDGET.DRILL_REMOVED")]
    KpiWidgetDrillRemoved {
        #[serde(rename = "ref")]
        widget: ObjRef,
    },

    #[serde(rename = "GDC.DASH/EVT.FLUID_LAYOUT.SECTION_ADDED")]
    LayoutSectionAdded {
        index: usize,
        section: LayoutSection,
    },

    #[serde(rename = "GDC.DASH/EVT.FLUID_LAYOUT.SECTION_REMOVED")]
    LayoutSectionRemoved {
        index: usize,
        section: LayoutSection,
    },

    #[serde(rename = "GDC.DASH/EVT.FLUID_LAYOUT.SECTION_MOVED")]
    LayoutSectionMoved { from: usize, to: usize },

    #[serde(rename = "GDC.DASH/EVT.FLUID_LAYOUT.ITEM_MOVED")]
    LayoutSectionItemMoved {
        item: LayoutItem,
        from_section: usize,
        from_item: usize,
        /// Final index of the destination section.
        to_section: usize,
        to_item: usize,
        source_section_removed: bool,
    },

    #[serde(rename = "GDC.DASH/EVT.FLUID_LAYOUT.ITEM_MOVED_TO_NEW_SECTION")]
    LayoutSectionItemMovedToNewSection {
        item: LayoutItem,
        from_section: usize,
        from_item: usize,
        /// Final index of the new section.
        to_section: usize,
        source_section_removed: bool,
    },

    #[serde(rename = "GDC.DASH/EVT.FLUID_LAYOUT.ITEM_REMOVED")]
    LayoutSectionItemRemoved {
        section: usize,
        item: LayoutItem,
        section_removed: bool,
    },

    #[serde(rename = "GDC.DASH/EVT.UI.TOAST_ADDED")]
    ToastMessageAdded { toast: Toast },

    #[serde(rename = "GDC.DASH/EVT.UI.TOAST_REMOVED")]
    ToastMessageRemoved { id: String },

    #[serde(rename = "GDC.DASH/EVT.UI.WIDGET_SELECTED")]
    WidgetSelected {
        #[serde(rename = "ref")]
        widget: Option<ObjRef>,
    },

    #[serde(rename = "GDC.DASH/EVT.COMMAND.REJECTED")]
    CommandRejected {
        /// Tag of the rejected command.
        command: String,
        kind: ErrorKind,
        reason: String,
    },
}

/// An event together with the correlation id of the command that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl DashboardEvent {
    pub fn new(payload: EventPayload, correlation_id: Option<String>) -> Self {
        Self {
            correlation_id,
            payload,
        }
    }

    /// Build the rejection event for a failed command.
    pub fn rejected(command: &str, error: &CommandError, correlation_id: Option<String>) -> Self {
        Self::new(
            EventPayload::CommandRejected {
                command: command.to_string(),
                kind: error.kind(),
                reason: error.to_string(),
            },
            correlation_id,
        )
    }

    /// The error kind if this is a rejection.
    pub fn rejection_kind(&self) -> Option<ErrorKind> {
        match &self.payload {
            EventPayload::CommandRejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.rejection_kind().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejection_carries_kind_reason_and_correlation() {
        let err = CommandError::widget_not_found(&ObjRef::new("k9"));
        let event = DashboardEvent::rejected(
            "GDC.DASH/CMD.KPI_WIDGET.REFRESH",
            &err,
            Some("c-1".into()),
        );

        assert!(event.is_rejection());
        assert_eq!(event.rejection_kind(), Some(ErrorKind::WidgetNotFound));
        assert_eq!(event.correlation_id.as_deref(), Some("c-1"));
        match event.payload {
            EventPayload::CommandRejected {
                command, reason, ..
            } => {
                assert_eq!(command, "GDC.DASH/CMD.KPI_WIDGET.REFRESH");
                assert_eq!(reason, "widget not found: k9");
            }
            other => panic!("expected CommandRejected, got {other:?}"),
        }
    }

    #[test]
    fn success_events_are_not_rejections() {
        let event = DashboardEvent::new(EventPayload::DashboardWasReset, None);
        assert!(!event.is_rejection());
    }

    #[test]
    fn serializes_with_type_and_payload() {
        let event = DashboardEvent::new(
            EventPayload::RenderModeChanged {
                render_mode: RenderMode::View,
            },
            Some("c-2".into()),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "correlationId": "c-2",
                "type": "GDC.DASH/EVT.RENDER_MODE.CHANGED",
                "payload": { "renderMode": "view" }
            })
        );
    }
}
