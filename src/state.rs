//! The dashboard state snapshot and its reducer.
//!
//! [`DashboardState`] is an immutable, versioned value. It only changes by
//! folding [`Mutation`]s through [`DashboardState::apply`], and only the
//! runner does that, after a handler has finished. Read-side helpers are
//! plain accessor methods over the snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::DashboardDocument;
use crate::filter::DashboardFilters;
use crate::layout::Layout;
use crate::widget::{KpiComparison, KpiWidget, LegacyDrill, ObjRef, Widget, WidgetHeader};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderMode {
    #[default]
    View,
    Edit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModeState {
    pub mode: RenderMode,
    /// Layout or widgets changed since edit mode was entered.
    pub edit_session_dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToastSeverity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: String,
    pub text: String,
    pub severity: ToastSeverity,
}

/// Transient UI state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub toasts: Vec<Toast>,
    pub selected_widget: Option<ObjRef>,
}

/// A single store mutation produced by a command handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Mutation {
    SetRenderMode(RenderMode),
    /// Restore layout, widgets and filters from the persisted document.
    ResetToPersisted,
    SetKpiHeader {
        widget: ObjRef,
        header: WidgetHeader,
    },
    SetKpiMeasure {
        widget: ObjRef,
        measure: ObjRef,
        header: WidgetHeader,
    },
    SetKpiDateDataset {
        widget: ObjRef,
        date_dataset: Option<ObjRef>,
    },
    SetKpiIgnoredFilters {
        widget: ObjRef,
        ignored_filters: Vec<ObjRef>,
    },
    SetKpiComparison {
        widget: ObjRef,
        comparison: KpiComparison,
    },
    SetKpiDrill {
        widget: ObjRef,
        drill: Option<LegacyDrill>,
    },
    ReplaceLayout(Layout),
    AddWidget(Widget),
    /// Remove a widget definition. Any slot still pointing at it is nulled.
    RemoveWidget(ObjRef),
    AddToast(Toast),
    RemoveToast(String),
    RemoveAllToasts,
    SelectWidget(Option<ObjRef>),
}

impl Mutation {
    /// Whether this mutation touches the persisted part of the dashboard.
    fn is_structural(&self) -> bool {
        !matches!(
            self,
            Mutation::SetRenderMode(_)
                | Mutation::ResetToPersisted
                | Mutation::AddToast(_)
                | Mutation::RemoveToast(_)
                | Mutation::RemoveAllToasts
                | Mutation::SelectWidget(_)
        )
    }
}

/// Versioned snapshot of a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    /// Incremented once per committed batch of mutations.
    pub version: u64,
    /// The dashboard as last persisted; target of a reset.
    pub persisted: DashboardDocument,
    pub layout: Layout,
    pub widgets: BTreeMap<ObjRef, Widget>,
    pub filters: DashboardFilters,
    pub render_mode: RenderModeState,
    pub ui: UiState,
}

impl DashboardState {
    /// Fresh state at version 0 with `document` as both the working copy
    /// and the persisted baseline.
    pub fn new(document: DashboardDocument, mode: RenderMode) -> Self {
        Self {
            version: 0,
            layout: document.layout.clone(),
            widgets: document.widgets.clone(),
            filters: document.filters.clone(),
            persisted: document,
            render_mode: RenderModeState {
                mode,
                edit_session_dirty: false,
            },
            ui: UiState::default(),
        }
    }

    // --- Accessors ---

    pub fn widget(&self, widget: &ObjRef) -> Option<&Widget> {
        self.widgets.get(widget)
    }

    /// The widget, if it exists and is a KPI.
    pub fn kpi_widget(&self, widget: &ObjRef) -> Option<&KpiWidget> {
        self.widget(widget).and_then(Widget::as_kpi)
    }

    pub fn is_edit_mode(&self) -> bool {
        self.render_mode.mode == RenderMode::Edit
    }

    pub fn layout_position_of(&self, widget: &ObjRef) -> Option<(usize, usize)> {
        self.layout.position_of(widget)
    }

    pub fn widget_refs_in_layout(&self) -> Vec<&ObjRef> {
        self.layout.widget_refs().collect()
    }

    /// Layout slots pointing at widgets that do not exist. Always empty for
    /// states built by the reducer from a consistent document.
    pub fn dangling_layout_refs(&self) -> Vec<&ObjRef> {
        self.layout
            .widget_refs()
            .filter(|r| !self.widgets.contains_key(*r))
            .collect()
    }

    /// The current working copy of the persisted sections.
    pub fn document(&self) -> DashboardDocument {
        DashboardDocument {
            title: self.persisted.title.clone(),
            layout: self.layout.clone(),
            widgets: self.widgets.clone(),
            filters: self.filters.clone(),
        }
    }

    // --- Reducer ---

    /// Apply a batch of mutations and bump the version.
    ///
    /// An empty batch returns the state unchanged, version included.
    pub fn reduce(self, mutations: &[Mutation]) -> Self {
        if mutations.is_empty() {
            return self;
        }
        let mut next = mutations.iter().fold(self, DashboardState::apply);
        next.version += 1;
        next
    }

    /// Apply a single mutation.
    ///
    /// Mutations addressing a KPI widget that does not exist leave the state
    /// unchanged; handlers validate references before producing them.
    pub fn apply(mut self, mutation: &Mutation) -> Self {
        if mutation.is_structural() && self.is_edit_mode() {
            self.render_mode.edit_session_dirty = true;
        }

        match mutation {
            Mutation::SetRenderMode(mode) => {
                self.render_mode = RenderModeState {
                    mode: *mode,
                    edit_session_dirty: false,
                };
            }
            Mutation::ResetToPersisted => {
                self.layout = self.persisted.layout.clone();
                self.widgets = self.persisted.widgets.clone();
                self.filters = self.persisted.filters.clone();
                self.render_mode.edit_session_dirty = false;
                self.ui.selected_widget = None;
            }
            Mutation::SetKpiHeader { widget, header } => {
                if let Some(kpi) = self.kpi_mut(widget) {
                    kpi.header = header.clone();
                }
            }
            Mutation::SetKpiMeasure {
                widget,
                measure,
                header,
            } => {
                if let Some(kpi) = self.kpi_mut(widget) {
                    kpi.measure = measure.clone();
                    kpi.header = header.clone();
                }
            }
            Mutation::SetKpiDateDataset {
                widget,
                date_dataset,
            } => {
                if let Some(kpi) = self.kpi_mut(widget) {
                    kpi.date_dataset = date_dataset.clone();
                }
            }
            Mutation::SetKpiIgnoredFilters {
                widget,
                ignored_filters,
            } => {
                if let Some(kpi) = self.kpi_mut(widget) {
                    kpi.ignored_filters = ignored_filters.clone();
                }
            }
            Mutation::SetKpiComparison { widget, comparison } => {
                if let Some(kpi) = self.kpi_mut(widget) {
                    kpi.comparison = *comparison;
                }
            }
            Mutation::SetKpiDrill { widget, drill } => {
                if let Some(kpi) = self.kpi_mut(widget) {
                    kpi.drill = drill.clone();
                }
            }
            Mutation::ReplaceLayout(layout) => {
                self.layout = layout.clone();
            }
            Mutation::AddWidget(widget) => {
                self.widgets
                    .insert(widget.widget_ref().clone(), widget.clone());
            }
            Mutation::RemoveWidget(widget) => {
                for item in self.layout.sections.iter_mut().flat_map(|s| s.items.iter_mut()) {
                    if item.widget.as_ref() == Some(widget) {
                        item.widget = None;
                    }
                }
                self.widgets.remove(widget);
                if self.ui.selected_widget.as_ref() == Some(widget) {
                    self.ui.selected_widget = None;
                }
            }
            Mutation::AddToast(toast) => {
                self.ui.toasts.push(toast.clone());
            }
            Mutation::RemoveToast(id) => {
                self.ui.toasts.retain(|t| &t.id != id);
            }
            Mutation::RemoveAllToasts => {
                self.ui.toasts.clear();
            }
            Mutation::SelectWidget(widget) => {
                self.ui.selected_widget = widget.clone();
            }
        }
        self
    }

    fn kpi_mut(&mut self, widget: &ObjRef) -> Option<&mut KpiWidget> {
        match self.widgets.get_mut(widget) {
            Some(Widget::Kpi(kpi)) => Some(kpi),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use crate::document::DashboardDocument;
    use crate::filter::{AttributeFilter, DashboardFilters, DateFilter};
    use crate::layout::Layout;
    use crate::widget::{
        DrillDefinition, DrillTarget, InsightWidget, KpiWidget, ObjRef, WidgetHeader,
    };

    /// Sections `[[w1], [w2, w3]]`: KPIs `w1` and `w3`, insight `w2`.
    /// Dashboard attribute filters exist on `label.region` and `label.product`.
    pub(crate) fn sample_document() -> DashboardDocument {
        let mut revenue = KpiWidget::new("w1", "m.revenue");
        revenue.header = WidgetHeader::titled("Revenue");

        let mut trend = InsightWidget::new("w2", "insight.trend");
        trend.drills.push(DrillDefinition {
            origin: ObjRef::new("m.revenue"),
            target: DrillTarget::Insight {
                target: ObjRef::new("insight.detail"),
            },
            intersection: vec![ObjRef::new("label.region")],
        });

        DashboardDocument {
            title: "Sales overview".into(),
            ..Default::default()
        }
        .with_widget(revenue)
        .with_widget(trend)
        .with_widget(KpiWidget::new("w3", "m.orders"))
        .with_layout(Layout::from_widgets(vec![vec!["w1"], vec!["w2", "w3"]]))
        .with_filters(DashboardFilters {
            date_filter: Some(DateFilter::AllTime),
            attribute_filters: vec![
                AttributeFilter::all("f-region", "label.region"),
                AttributeFilter::all("f-product", "label.product"),
            ],
        })
    }
}
