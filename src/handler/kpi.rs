//! KPI widget handlers.
//!
//! Every handler first resolves the target reference to a KPI widget; a
//! missing widget or one of another kind rejects with `WidgetNotFound`.

use tracing::debug;

use super::{DashboardContext, HandlerResult};
use crate::backend::primary_date_dataset;
use crate::command::{DateDatasetChoice, FilterOperation, MeasureHeader};
use crate::error::{BackendError, CommandError};
use crate::event::EventPayload;
use crate::state::{DashboardState, Mutation};
use crate::widget::{KpiComparison, KpiWidget, LegacyDrill, ObjRef, WidgetHeader};

fn require_kpi<'s>(
    state: &'s DashboardState,
    widget: &ObjRef,
) -> Result<&'s KpiWidget, CommandError> {
    state
        .kpi_widget(widget)
        .ok_or_else(|| CommandError::widget_not_found(widget))
}

pub(super) fn change_header(
    state: &DashboardState,
    widget: ObjRef,
    header: WidgetHeader,
) -> HandlerResult {
    require_kpi(state, &widget)?;
    Ok((
        vec![Mutation::SetKpiHeader {
            widget: widget.clone(),
            header: header.clone(),
        }],
        EventPayload::KpiWidgetHeaderChanged { widget, header },
    ))
}

pub(super) async fn change_measure(
    ctx: &DashboardContext,
    state: &DashboardState,
    widget: ObjRef,
    measure: ObjRef,
    header: Option<MeasureHeader>,
) -> HandlerResult {
    let kpi = require_kpi(state, &widget)?;

    let header = match header {
        Some(MeasureHeader::FromMeasure(_)) => {
            let title = ctx.backend.measures.measure_title(&measure).await?;
            debug!(%measure, %title, "resolved header from measure");
            WidgetHeader::titled(title)
        }
        Some(MeasureHeader::Replace(header)) => header,
        None => kpi.header.clone(),
    };

    Ok((
        vec![Mutation::SetKpiMeasure {
            widget: widget.clone(),
            measure: measure.clone(),
            header: header.clone(),
        }],
        EventPayload::KpiWidgetMeasureChanged {
            widget,
            measure,
            header,
        },
    ))
}

pub(super) async fn change_filter_settings(
    ctx: &DashboardContext,
    state: &DashboardState,
    widget: ObjRef,
    operation: FilterOperation,
) -> HandlerResult {
    let kpi = require_kpi(state, &widget)?;

    let (date_dataset, ignored_filters) = match operation {
        FilterOperation::Replace {
            date_dataset,
            ignored_filters,
        } => {
            ensure_ignorable(state, &ignored_filters)?;
            (date_dataset, dedup(ignored_filters))
        }
        FilterOperation::EnableDateFilter { date_dataset } => {
            let dataset = match date_dataset {
                DateDatasetChoice::Default(_) => default_date_dataset(ctx, kpi).await?,
                DateDatasetChoice::Dataset(dataset) => dataset,
            };
            (Some(dataset), kpi.ignored_filters.clone())
        }
        FilterOperation::DisableDateFilter => (None, kpi.ignored_filters.clone()),
        FilterOperation::ReplaceAttributeIgnores { display_forms } => {
            ensure_ignorable(state, &display_forms)?;
            (kpi.date_dataset.clone(), dedup(display_forms))
        }
        FilterOperation::IgnoreAttributeFilter { display_forms } => {
            ensure_ignorable(state, &display_forms)?;
            let mut ignored = kpi.ignored_filters.clone();
            for display_form in display_forms {
                if !ignored.contains(&display_form) {
                    ignored.push(display_form);
                }
            }
            (kpi.date_dataset.clone(), ignored)
        }
        FilterOperation::UnignoreAttributeFilter { display_forms } => {
            let mut ignored = kpi.ignored_filters.clone();
            ignored.retain(|df| !display_forms.contains(df));
            (kpi.date_dataset.clone(), ignored)
        }
    };

    Ok((
        vec![
            Mutation::SetKpiDateDataset {
                widget: widget.clone(),
                date_dataset: date_dataset.clone(),
            },
            Mutation::SetKpiIgnoredFilters {
                widget: widget.clone(),
                ignored_filters: ignored_filters.clone(),
            },
        ],
        EventPayload::KpiWidgetFilterSettingsChanged {
            widget,
            date_dataset,
            ignored_filters,
        },
    ))
}

/// Only display forms of existing dashboard attribute filters can be ignored.
fn ensure_ignorable(state: &DashboardState, display_forms: &[ObjRef]) -> Result<(), CommandError> {
    match display_forms
        .iter()
        .find(|df| !state.filters.has_attribute_filter_for(df))
    {
        Some(missing) => Err(CommandError::ValidationFailed {
            reason: format!("no dashboard attribute filter uses display form {missing}"),
        }),
        None => Ok(()),
    }
}

fn dedup(display_forms: Vec<ObjRef>) -> Vec<ObjRef> {
    let mut out = Vec::with_capacity(display_forms.len());
    for df in display_forms {
        if !out.contains(&df) {
            out.push(df);
        }
    }
    out
}

async fn default_date_dataset(
    ctx: &DashboardContext,
    kpi: &KpiWidget,
) -> Result<ObjRef, CommandError> {
    let candidates = ctx.backend.date_datasets.date_datasets(&kpi.measure).await?;
    let primary = primary_date_dataset(candidates).ok_or_else(|| {
        BackendError::Other(format!("no date dataset available for measure {}", kpi.measure))
    })?;
    debug!(measure = %kpi.measure, dataset = %primary.dataset, "picked default date dataset");
    Ok(primary.dataset)
}

pub(super) fn change_comparison(
    state: &DashboardState,
    widget: ObjRef,
    comparison: KpiComparison,
) -> HandlerResult {
    require_kpi(state, &widget)?;
    Ok((
        vec![Mutation::SetKpiComparison {
            widget: widget.clone(),
            comparison,
        }],
        EventPayload::KpiWidgetComparisonChanged { widget, comparison },
    ))
}

/// Signal consumers to re-query the widget. The state is not touched.
pub(super) fn refresh(state: &DashboardState, widget: ObjRef) -> HandlerResult {
    require_kpi(state, &widget)?;
    Ok((Vec::new(), EventPayload::KpiWidgetRefreshed { widget }))
}

pub(super) fn set_drill(
    state: &DashboardState,
    widget: ObjRef,
    dashboard: ObjRef,
    tab: String,
) -> HandlerResult {
    require_kpi(state, &widget)?;
    let drill = LegacyDrill { dashboard, tab };
    Ok((
        vec![Mutation::SetKpiDrill {
            widget: widget.clone(),
            drill: Some(drill.clone()),
        }],
        EventPayload::KpiWidgetDrillSet { widget, drill },
    ))
}

pub(super) fn remove_drill(state: &DashboardState, widget: ObjRef) -> HandlerResult {
    require_kpi(state, &widget)?;
    Ok((
        vec![Mutation::SetKpiDrill {
            widget: widget.clone(),
            drill: None,
        }],
        EventPayload::KpiWidgetDrillRemoved { widget },
    ))
}
