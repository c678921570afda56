//! Dashboard-level filters.

use serde::{Deserialize, Serialize};

use crate::widget::ObjRef;

/// Granularity of a relative date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateGranularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// The single date filter of a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DateFilter {
    AllTime,
    Relative {
        granularity: DateGranularity,
        from: i32,
        to: i32,
    },
    Absolute {
        from: String,
        to: String,
    },
}

/// A dashboard attribute filter, identified for widgets by its display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    pub local_id: String,
    pub display_form: ObjRef,
    /// `true` when `values` lists excluded elements rather than selected ones.
    #[serde(default = "default_negative")]
    pub negative: bool,
    #[serde(default)]
    pub values: Vec<String>,
}

fn default_negative() -> bool {
    true
}

impl AttributeFilter {
    /// An "all values" filter on the given display form.
    pub fn all(local_id: impl Into<String>, display_form: impl Into<ObjRef>) -> Self {
        Self {
            local_id: local_id.into(),
            display_form: display_form.into(),
            negative: true,
            values: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_filter: Option<DateFilter>,
    #[serde(default)]
    pub attribute_filters: Vec<AttributeFilter>,
}

impl DashboardFilters {
    pub fn has_attribute_filter_for(&self, display_form: &ObjRef) -> bool {
        self.attribute_filters
            .iter()
            .any(|f| &f.display_form == display_form)
    }
}
