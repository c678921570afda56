//! Widget definitions placed on a dashboard.
//!
//! A widget is addressed by a stable, opaque [`ObjRef`]. KPI widgets carry a
//! single measure plus comparison and legacy drill settings; insight widgets
//! reference a stored visualization and may carry any number of drills.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to a metadata object (widget, measure, dataset, ...).
///
/// Serialized as a bare string so it can key JSON maps.
///
/// # Examples
///
/// ```
/// use dashfold::ObjRef;
///
/// let r = ObjRef::new("kpi-revenue");
/// assert_eq!(r.as_str(), "kpi-revenue");
/// assert_eq!(serde_json::to_string(&r).unwrap(), "\"kpi-revenue\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjRef(String);

impl ObjRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Header shown above a widget. Replaced wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl WidgetHeader {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }
}

/// What the KPI compares the current period against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonType {
    PreviousPeriod,
    LastYear,
}

/// Whether growth of the measure is good or bad news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonDirection {
    GrowIsGood,
    GrowIsBad,
}

/// Comparison settings of a KPI. The empty value disables comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiComparison {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_type: Option<ComparisonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_direction: Option<ComparisonDirection>,
}

impl KpiComparison {
    pub fn is_disabled(&self) -> bool {
        self.comparison_type.is_none()
    }
}

/// Drill from a KPI to a tab of a legacy dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDrill {
    pub dashboard: ObjRef,
    pub tab: String,
}

/// Where a drill interaction navigates to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DrillTarget {
    Insight { target: ObjRef },
    Dashboard { target: ObjRef },
    LegacyDashboardTab { dashboard: ObjRef, tab: String },
}

impl From<&LegacyDrill> for DrillTarget {
    fn from(drill: &LegacyDrill) -> Self {
        Self::LegacyDashboardTab {
            dashboard: drill.dashboard.clone(),
            tab: drill.tab.clone(),
        }
    }
}

/// A drill attached to an insight widget.
///
/// `origin` is the measure or attribute the user clicks on; `intersection`
/// lists the display forms whose values are carried to the target as filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDefinition {
    pub origin: ObjRef,
    pub target: DrillTarget,
    #[serde(default)]
    pub intersection: Vec<ObjRef>,
}

/// A single-measure indicator widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiWidget {
    pub widget_ref: ObjRef,
    #[serde(default)]
    pub header: WidgetHeader,
    pub measure: ObjRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_dataset: Option<ObjRef>,
    /// Display forms of dashboard attribute filters this KPI ignores.
    #[serde(default)]
    pub ignored_filters: Vec<ObjRef>,
    #[serde(default)]
    pub comparison: KpiComparison,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drill: Option<LegacyDrill>,
}

impl KpiWidget {
    pub fn new(widget_ref: impl Into<ObjRef>, measure: impl Into<ObjRef>) -> Self {
        Self {
            widget_ref: widget_ref.into(),
            header: WidgetHeader::default(),
            measure: measure.into(),
            date_dataset: None,
            ignored_filters: Vec::new(),
            comparison: KpiComparison::default(),
            drill: None,
        }
    }
}

/// A widget that renders a stored insight (chart, table, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightWidget {
    pub widget_ref: ObjRef,
    #[serde(default)]
    pub header: WidgetHeader,
    pub insight: ObjRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_dataset: Option<ObjRef>,
    #[serde(default)]
    pub ignored_filters: Vec<ObjRef>,
    #[serde(default)]
    pub drills: Vec<DrillDefinition>,
}

impl InsightWidget {
    pub fn new(widget_ref: impl Into<ObjRef>, insight: impl Into<ObjRef>) -> Self {
        Self {
            widget_ref: widget_ref.into(),
            header: WidgetHeader::default(),
            insight: insight.into(),
            date_dataset: None,
            ignored_filters: Vec::new(),
            drills: Vec::new(),
        }
    }
}

/// Any widget that can occupy a layout slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Widget {
    Kpi(KpiWidget),
    Insight(InsightWidget),
}

impl Widget {
    pub fn widget_ref(&self) -> &ObjRef {
        match self {
            Widget::Kpi(kpi) => &kpi.widget_ref,
            Widget::Insight(insight) => &insight.widget_ref,
        }
    }

    pub fn as_kpi(&self) -> Option<&KpiWidget> {
        match self {
            Widget::Kpi(kpi) => Some(kpi),
            Widget::Insight(_) => None,
        }
    }

    /// Every drill target configured on this widget, in definition order.
    pub fn drill_targets(&self) -> Vec<DrillTarget> {
        match self {
            Widget::Kpi(kpi) => kpi.drill.iter().map(DrillTarget::from).collect(),
            Widget::Insight(insight) => insight.drills.iter().map(|d| d.target.clone()).collect(),
        }
    }
}

impl From<KpiWidget> for Widget {
    fn from(kpi: KpiWidget) -> Self {
        Widget::Kpi(kpi)
    }
}

impl From<InsightWidget> for Widget {
    fn from(insight: InsightWidget) -> Self {
        Widget::Insight(insight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn obj_ref_serializes_as_plain_string() {
        let value = serde_json::to_value(ObjRef::new("w1")).unwrap();
        assert_eq!(value, json!("w1"));
    }

    #[test]
    fn empty_comparison_is_disabled() {
        assert!(KpiComparison::default().is_disabled());
        let enabled = KpiComparison {
            comparison_type: Some(ComparisonType::PreviousPeriod),
            comparison_direction: None,
        };
        assert!(!enabled.is_disabled());
    }

    #[test]
    fn kpi_drill_targets_include_legacy_tab() {
        let mut kpi = KpiWidget::new("k1", "m1");
        assert!(Widget::Kpi(kpi.clone()).drill_targets().is_empty());

        kpi.drill = Some(LegacyDrill {
            dashboard: ObjRef::new("legacy-1"),
            tab: "tab-a".into(),
        });
        let targets = Widget::Kpi(kpi).drill_targets();
        assert_eq!(
            targets,
            vec![DrillTarget::LegacyDashboardTab {
                dashboard: ObjRef::new("legacy-1"),
                tab: "tab-a".into(),
            }]
        );
    }

    #[test]
    fn widget_is_internally_tagged() {
        let widget = Widget::Kpi(KpiWidget::new("k1", "m1"));
        let value = serde_json::to_value(&widget).unwrap();
        assert_eq!(value["type"], "kpi");
        assert_eq!(value["widgetRef"], "k1");
        assert_eq!(value["measure"], "m1");
    }
}
