//! Dashboard commands and their constructors.
//!
//! A command is an immutable request to change the dashboard. It is built by
//! one of the constructor functions in this module, optionally tagged with a
//! correlation id, and handed to the runner, which consumes it exactly once.
//!
//! On the wire a command is `{"type": <tag>, "payload": {...},
//! "correlationId": <id>}`.

use serde::{Deserialize, Serialize};

use crate::layout::{LayoutItem, SectionHeader};
use crate::state::{RenderMode, ToastSeverity};
use crate::widget::{KpiComparison, ObjRef, Widget, WidgetHeader};

/// Marker for the `"from-measure"` header sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FromMeasure {
    #[serde(rename = "from-measure")]
    FromMeasure,
}

/// Header to apply together with a KPI measure change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasureHeader {
    /// Use the display title of the new measure.
    FromMeasure(FromMeasure),
    Replace(WidgetHeader),
}

impl MeasureHeader {
    /// The `"from-measure"` sentinel.
    pub fn from_measure() -> Self {
        Self::FromMeasure(FromMeasure::FromMeasure)
    }
}

/// Marker for the `"default"` date dataset sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultDataset {
    #[serde(rename = "default")]
    Default,
}

/// Date dataset to enable date filtering with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateDatasetChoice {
    /// Resolve the primary dataset for the widget's measure from the catalog.
    Default(DefaultDataset),
    Dataset(ObjRef),
}

impl DateDatasetChoice {
    /// The `"default"` sentinel.
    pub fn default_dataset() -> Self {
        Self::Default(DefaultDataset::Default)
    }
}

/// Change applied to a KPI widget's filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FilterOperation {
    /// Replace date dataset and ignore-list as-is.
    Replace {
        date_dataset: Option<ObjRef>,
        ignored_filters: Vec<ObjRef>,
    },
    EnableDateFilter {
        date_dataset: DateDatasetChoice,
    },
    DisableDateFilter,
    ReplaceAttributeIgnores {
        display_forms: Vec<ObjRef>,
    },
    /// Set union into the ignore-list.
    IgnoreAttributeFilter {
        display_forms: Vec<ObjRef>,
    },
    /// Set difference out of the ignore-list.
    UnignoreAttributeFilter {
        display_forms: Vec<ObjRef>,
    },
}

/// The typed body of a [`DashboardCommand`], one variant per command tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum CommandPayload {
    #[serde(rename = "GDC.DASH/CMD.CHANGE_RENDER_MODE")]
    ChangeRenderMode {
        render_mode: RenderMode,
        #[serde(default)]
        reset_dashboard: bool,
    },

    #[serde(rename = "GDC.DASH/CMD.RESET")]
    ResetDashboard,

    #[serde(rename = "GDC.DASH/CMD.KPI_WIDGET.CHANGE_HEADER")]
    ChangeKpiWidgetHeader {
        #[serde(rename = "ref")]
        widget: ObjRef,
        header: WidgetHeader,
    },

    #[serde(rename = "GDC.DASH/CMD.KPI_WIDGET.CHANGE_MEASURE")]
    ChangeKpiWidgetMeasure {
        #[serde(rename = "ref")]
        widget: ObjRef,
        measure: ObjRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<MeasureHeader>,
    },

    #[serde(rename = "GDC.DASH/CMD.KPI_WIDGET.CHANGE_FILTER_SETTINGS")]
    ChangeKpiWidgetFilterSettings {
        #[serde(rename = "ref")]
        widget: ObjRef,
        operation: FilterOperation,
    },

    #[serde(rename = "GDC.DASH/CMD.KPI_WIDGET.CHANGE_COMPARISON")]
    ChangeKpiWidgetComparison {
        #[serde(rename = "ref")]
        widget: ObjRef,
        comparison: KpiComparison,
    },

    #[serde(rename = "GDC.DASH/CMD.KPI_WIDGET.REFRESH")]
    RefreshKpiWidget {
        #[serde(rename = "ref")]
        widget: ObjRef,
    },

    #[serde(rename = "GDC.DASH/CMD.KPI_WIDGET.SET_DRILL")]
    SetDrillForKpiWidget {
        #[serde(rename = "ref")]
        widget: ObjRef,
        legacy_dashboard: ObjRef,
        legacy_dashboard_tab: String,
    },

    #[serde(rename = "GDC.DASH/CMD.KPI_WIDGET.REMOVE_DRILL")]
    RemoveDrillForKpiWidget {
        #[serde(rename = "ref")]
        widget: ObjRef,
    },

    #[serde(rename = "GDC.DASH/CMD.FLUID_LAYOUT.ADD_SECTION")]
    AddLayoutSection {
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<SectionHeader>,
        #[serde(default)]
        items: Vec<LayoutItem>,
        /// Definitions of widgets placed by `items` that are new to the dashboard.
        #[serde(default)]
        widgets: Vec<Widget>,
    },

    #[serde(rename = "GDC.DASH/CMD.FLUID_LAYOUT.REMOVE_SECTION")]
    RemoveLayoutSection { index: usize },

    #[serde(rename = "GDC.DASH/CMD.FLUID_LAYOUT.MOVE_SECTION")]
    MoveLayoutSection { from: usize, to: usize },

    #[serde(rename = "GDC.DASH/CMD.FLUID_LAYOUT.MOVE_ITEM")]
    MoveSectionItem {
        from_section: usize,
        from_item: usize,
        to_section: usize,
        to_item: usize,
    },

    #[serde(rename = "GDC.DASH/CMD.FLUID_LAYOUT.MOVE_ITEM_TO_NEW_SECTION")]
    MoveSectionItemToNewSection {
        from_section: usize,
        from_item: usize,
        to_section: usize,
    },

    #[serde(rename = "GDC.DASH/CMD.FLUID_LAYOUT.REMOVE_ITEM")]
    RemoveSectionItem { section: usize, item: usize },

    #[serde(rename = "GDC.DASH/CMD.UI.ADD_TOAST")]
    AddToastMessage {
        id: String,
        text: String,
        severity: ToastSeverity,
    },

    #[serde(rename = "GDC.DASH/CMD.UI.REMOVE_TOAST")]
    RemoveToastMessage { id: String },

    #[serde(rename = "GDC.DASH/CMD.UI.SELECT_WIDGET")]
    SelectWidget {
        #[serde(rename = "ref")]
        widget: Option<ObjRef>,
    },
}

impl CommandPayload {
    /// The wire tag of this command.
    pub fn tag(&self) -> &'static str {
        match self {
            CommandPayload::ChangeRenderMode { .. } => "GDC.DASH/CMD.CHANGE_RENDER_MODE",
            CommandPayload::ResetDashboard => "GDC.DASH/CMD.RESET",
            CommandPayload::ChangeKpiWidgetHeader { .. } => "GDC.DASH/CMD.KPI_WIDGET.CHANGE_HEADER",
            CommandPayload::ChangeKpiWidgetMeasure { .. } => {
                "GDC.DASH/CMD.KPI_WIDGET.CHANGE_MEASURE"
            }
            CommandPayload::ChangeKpiWidgetFilterSettings { .. } => {
                "GDC.DASH/CMD.KPI_WIDGET.CHANGE_FILTER_SETTINGS"
            }
            CommandPayload::ChangeKpiWidgetComparison { .. } => {
                "GDC.DASH/CMD.KPI_WIDGET.CHANGE_COMPARISON"
            }
            CommandPayload::RefreshKpiWidget { .. } => "GDC.DASH/CMD.KPI_WIDGET.REFRESH",
            CommandPayload::SetDrillForKpiWidget { .. } => "GDC.DASH/CMD.KPI_WIDGET.SET_DRILL",
            CommandPayload::RemoveDrillForKpiWidget { .. } => {
                "GDC.DASH/CMD.KPI_WIDGET.REMOVE_DRILL"
            }
            CommandPayload::AddLayoutSection { .. } => "GDC.DASH/CMD.FLUID_LAYOUT.ADD_SECTION",
            CommandPayload::RemoveLayoutSection { .. } => {
                "GDC.DASH/CMD.FLUID_LAYOUT.REMOVE_SECTION"
            }
            CommandPayload::MoveLayoutSection { .. } => "GDC.DASH/CMD.FLUID_LAYOUT.MOVE_SECTION",
            CommandPayload::MoveSectionItem { .. } => "GDC.DASH/CMD.FLUID_LAYOUT.MOVE_ITEM",
            CommandPayload::MoveSectionItemToNewSection { .. } => {
                "GDC.DASH/CMD.FLUID_LAYOUT.MOVE_ITEM_TO_NEW_SECTION"
            }
            CommandPayload::RemoveSectionItem { .. } => "GDC.DASH/CMD.FLUID_LAYOUT.REMOVE_ITEM",
            CommandPayload::AddToastMessage { .. } => "GDC.DASH/CMD.UI.ADD_TOAST",
            CommandPayload::RemoveToastMessage { .. } => "GDC.DASH/CMD.UI.REMOVE_TOAST",
            CommandPayload::SelectWidget { .. } => "GDC.DASH/CMD.UI.SELECT_WIDGET",
        }
    }
}

/// A command together with the caller's correlation id.
///
/// # Examples
///
/// ```
/// use dashfold::{ObjRef, command};
///
/// let cmd = command::refresh_kpi_widget(ObjRef::new("kpi-1")).with_correlation_id("req-7");
///
/// assert_eq!(cmd.tag(), "GDC.DASH/CMD.KPI_WIDGET.REFRESH");
/// assert_eq!(cmd.correlation_id.as_deref(), Some("req-7"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(flatten)]
    pub payload: CommandPayload,
}

impl DashboardCommand {
    /// A command without a correlation id.
    pub fn new(payload: CommandPayload) -> Self {
        Self {
            correlation_id: None,
            payload,
        }
    }

    /// Set the correlation id carried through to the resulting event.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Wire type tag, e.g. `GDC.DASH/CMD.RESET`.
    pub fn tag(&self) -> &'static str {
        self.payload.tag()
    }
}

impl From<CommandPayload> for DashboardCommand {
    fn from(payload: CommandPayload) -> Self {
        Self::new(payload)
    }
}

// --- Constructors ---

/// Switch between view and edit mode, optionally resetting the dashboard.
pub fn change_render_mode(render_mode: RenderMode, reset_dashboard: bool) -> DashboardCommand {
    CommandPayload::ChangeRenderMode {
        render_mode,
        reset_dashboard,
    }
    .into()
}

/// Discard unsaved changes and restore the persisted dashboard.
///
/// When dispatched, every command still queued ahead of it is dropped with
/// [`DispatchError::Cancelled`](crate::DispatchError::Cancelled).
pub fn reset_dashboard() -> DashboardCommand {
    CommandPayload::ResetDashboard.into()
}

/// Replace the KPI widget's header with `header`.
pub fn change_kpi_widget_header(widget: ObjRef, header: WidgetHeader) -> DashboardCommand {
    CommandPayload::ChangeKpiWidgetHeader { widget, header }.into()
}

/// Swap the KPI's measure. Without a header the existing one is kept.
pub fn change_kpi_widget_measure(
    widget: ObjRef,
    measure: ObjRef,
    header: Option<MeasureHeader>,
) -> DashboardCommand {
    CommandPayload::ChangeKpiWidgetMeasure {
        widget,
        measure,
        header,
    }
    .into()
}

fn change_filter_settings(widget: ObjRef, operation: FilterOperation) -> DashboardCommand {
    CommandPayload::ChangeKpiWidgetFilterSettings { widget, operation }.into()
}

/// Replace the date dataset and ignore-list of the KPI as given.
///
/// # Arguments
///
/// * `widget` - the KPI widget to update.
/// * `date_dataset` - dataset to filter dates by, `None` to disable date
///   filtering.
/// * `ignored_filters` - display forms of dashboard attribute filters the
///   KPI ignores. Duplicates are dropped; every entry must match a
///   dashboard attribute filter.
pub fn replace_kpi_widget_filter_settings(
    widget: ObjRef,
    date_dataset: Option<ObjRef>,
    ignored_filters: Vec<ObjRef>,
) -> DashboardCommand {
    change_filter_settings(
        widget,
        FilterOperation::Replace {
            date_dataset,
            ignored_filters,
        },
    )
}

/// Enable date filtering on the KPI, either with an explicit dataset or
/// with [`DateDatasetChoice::default_dataset`].
pub fn enable_kpi_widget_date_filter(
    widget: ObjRef,
    date_dataset: DateDatasetChoice,
) -> DashboardCommand {
    change_filter_settings(widget, FilterOperation::EnableDateFilter { date_dataset })
}

/// Stop filtering the KPI by date.
pub fn disable_kpi_widget_date_filter(widget: ObjRef) -> DashboardCommand {
    change_filter_settings(widget, FilterOperation::DisableDateFilter)
}

/// Replace the KPI's ignore-list, keeping its date dataset.
pub fn replace_kpi_widget_ignored_filters(
    widget: ObjRef,
    display_forms: Vec<ObjRef>,
) -> DashboardCommand {
    change_filter_settings(
        widget,
        FilterOperation::ReplaceAttributeIgnores { display_forms },
    )
}

/// Add display forms to the KPI's ignore-list. Idempotent.
pub fn ignore_filter_on_kpi_widget(
    widget: ObjRef,
    display_forms: impl IntoIterator<Item = ObjRef>,
) -> DashboardCommand {
    change_filter_settings(
        widget,
        FilterOperation::IgnoreAttributeFilter {
            display_forms: display_forms.into_iter().collect(),
        },
    )
}

/// Remove display forms from the KPI's ignore-list. Idempotent.
pub fn unignore_filter_on_kpi_widget(
    widget: ObjRef,
    display_forms: impl IntoIterator<Item = ObjRef>,
) -> DashboardCommand {
    change_filter_settings(
        widget,
        FilterOperation::UnignoreAttributeFilter {
            display_forms: display_forms.into_iter().collect(),
        },
    )
}

/// Set comparison settings; [`KpiComparison::default`] disables comparison.
pub fn change_kpi_widget_comparison(widget: ObjRef, comparison: KpiComparison) -> DashboardCommand {
    CommandPayload::ChangeKpiWidgetComparison { widget, comparison }.into()
}

/// Ask the KPI to reload its data. Commits nothing.
pub fn refresh_kpi_widget(widget: ObjRef) -> DashboardCommand {
    CommandPayload::RefreshKpiWidget { widget }.into()
}

/// Drill from the KPI to a tab of a legacy dashboard.
pub fn set_drill_for_kpi_widget(
    widget: ObjRef,
    legacy_dashboard: ObjRef,
    legacy_dashboard_tab: impl Into<String>,
) -> DashboardCommand {
    CommandPayload::SetDrillForKpiWidget {
        widget,
        legacy_dashboard,
        legacy_dashboard_tab: legacy_dashboard_tab.into(),
    }
    .into()
}

/// Remove the KPI's legacy drill, if any.
pub fn remove_drill_for_kpi_widget(widget: ObjRef) -> DashboardCommand {
    CommandPayload::RemoveDrillForKpiWidget { widget }.into()
}

/// Insert a new section at `index`. Edit mode only.
///
/// # Arguments
///
/// * `index` - position of the new section; `index == len` appends.
/// * `header` - optional section header.
/// * `items` - slots of the section. Each widget slot must name an existing
///   widget or one of `widgets`.
/// * `widgets` - widgets created together with the section.
pub fn add_layout_section(
    index: usize,
    header: Option<SectionHeader>,
    items: Vec<LayoutItem>,
    widgets: Vec<Widget>,
) -> DashboardCommand {
    CommandPayload::AddLayoutSection {
        index,
        header,
        items,
        widgets,
    }
    .into()
}

/// Remove the section at `index` and every widget it holds. Edit mode only.
pub fn remove_layout_section(index: usize) -> DashboardCommand {
    CommandPayload::RemoveLayoutSection { index }.into()
}

/// Move the section at `from` so that it ends up at `to`. Edit mode only.
pub fn move_layout_section(from: usize, to: usize) -> DashboardCommand {
    CommandPayload::MoveLayoutSection { from, to }.into()
}

/// Move an item into an existing section. Edit mode only.
///
/// `to_section` is given in coordinates of the layout before the move;
/// `to_item` is the insertion index in the destination section.
pub fn move_section_item(
    from_section: usize,
    from_item: usize,
    to_section: usize,
    to_item: usize,
) -> DashboardCommand {
    CommandPayload::MoveSectionItem {
        from_section,
        from_item,
        to_section,
        to_item,
    }
    .into()
}

/// Drag an item out into a new section of its own.
pub fn move_section_item_to_new_section(
    from_section: usize,
    from_item: usize,
    to_section: usize,
) -> DashboardCommand {
    CommandPayload::MoveSectionItemToNewSection {
        from_section,
        from_item,
        to_section,
    }
    .into()
}

/// Remove a slot and its widget. Edit mode only.
pub fn remove_section_item(section: usize, item: usize) -> DashboardCommand {
    CommandPayload::RemoveSectionItem { section, item }.into()
}

/// Show a toast. The toast id is generated here so callers can remove it later.
pub fn add_toast_message(text: impl Into<String>, severity: ToastSeverity) -> DashboardCommand {
    CommandPayload::AddToastMessage {
        id: uuid::Uuid::new_v4().to_string(),
        text: text.into(),
        severity,
    }
    .into()
}

/// Dismiss a toast. Unknown ids are ignored.
pub fn remove_toast_message(id: impl Into<String>) -> DashboardCommand {
    CommandPayload::RemoveToastMessage { id: id.into() }.into()
}

/// Select a widget, or clear the selection with `None`.
pub fn select_widget(widget: Option<ObjRef>) -> DashboardCommand {
    CommandPayload::SelectWidget { widget }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn correlation_id_defaults_to_none() {
        let cmd = reset_dashboard();
        assert_eq!(cmd.correlation_id, None);
        assert_eq!(cmd.tag(), "GDC.DASH/CMD.RESET");
    }

    #[test]
    fn builder_sets_correlation_id() {
        let cmd = refresh_kpi_widget(ObjRef::new("k1")).with_correlation_id(String::from("c-1"));
        assert_eq!(cmd.correlation_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn ignore_accepts_any_iterable_of_refs() {
        let cmd = ignore_filter_on_kpi_widget(ObjRef::new("k1"), [ObjRef::new("df1")]);
        assert_eq!(
            cmd.payload,
            CommandPayload::ChangeKpiWidgetFilterSettings {
                widget: ObjRef::new("k1"),
                operation: FilterOperation::IgnoreAttributeFilter {
                    display_forms: vec![ObjRef::new("df1")],
                },
            }
        );
    }

    #[test]
    fn serializes_with_type_payload_and_correlation_id() {
        let cmd = change_kpi_widget_header(ObjRef::new("k1"), WidgetHeader::titled("Revenue"))
            .with_correlation_id("c-9");
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value,
            json!({
                "correlationId": "c-9",
                "type": "GDC.DASH/CMD.KPI_WIDGET.CHANGE_HEADER",
                "payload": { "ref": "k1", "header": { "title": "Revenue" } }
            })
        );
    }

    #[test]
    fn measure_header_sentinel_is_a_plain_string() {
        let value = serde_json::to_value(MeasureHeader::from_measure()).unwrap();
        assert_eq!(value, json!("from-measure"));

        let parsed: MeasureHeader = serde_json::from_value(json!("from-measure")).unwrap();
        assert_eq!(parsed, MeasureHeader::from_measure());

        let parsed: MeasureHeader = serde_json::from_value(json!({ "title": "T" })).unwrap();
        assert_eq!(parsed, MeasureHeader::Replace(WidgetHeader::titled("T")));
    }

    #[test]
    fn default_dataset_sentinel_is_distinct_from_refs() {
        let parsed: DateDatasetChoice = serde_json::from_value(json!("default")).unwrap();
        assert_eq!(parsed, DateDatasetChoice::default_dataset());

        let parsed: DateDatasetChoice = serde_json::from_value(json!("dataset.created")).unwrap();
        assert_eq!(
            parsed,
            DateDatasetChoice::Dataset(ObjRef::new("dataset.created"))
        );
    }

    #[test]
    fn filter_operation_is_tagged_by_type() {
        let value = serde_json::to_value(FilterOperation::DisableDateFilter).unwrap();
        assert_eq!(value, json!({ "type": "disableDateFilter" }));

        let value = serde_json::to_value(FilterOperation::IgnoreAttributeFilter {
            display_forms: vec![ObjRef::new("df1")],
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "type": "ignoreAttributeFilter", "displayForms": ["df1"] })
        );
    }

    #[test]
    fn toast_constructor_generates_unique_ids() {
        let a = add_toast_message("saved", ToastSeverity::Success);
        let b = add_toast_message("saved", ToastSeverity::Success);
        assert_ne!(a, b);
    }
}
