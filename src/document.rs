//! Persisted dashboard documents and their local file storage.
//!
//! Documents are stored as JSON at
//! `<base_dir>/dashboards/<dashboard_id>/dashboard.json`. Writes go through a
//! temp file followed by a rename so readers never observe a partial file.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::filter::DashboardFilters;
use crate::layout::Layout;
use crate::widget::{ObjRef, Widget};

/// The persisted part of a dashboard: layout, widgets and filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub widgets: BTreeMap<ObjRef, Widget>,
    #[serde(default)]
    pub filters: DashboardFilters,
}

impl DashboardDocument {
    /// Insert a widget keyed by its own reference.
    pub fn with_widget(mut self, widget: impl Into<Widget>) -> Self {
        let widget = widget.into();
        self.widgets.insert(widget.widget_ref().clone(), widget);
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_filters(mut self, filters: DashboardFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Layout references that have no widget definition.
    pub fn dangling_refs(&self) -> Vec<ObjRef> {
        self.layout
            .widget_refs()
            .filter(|r| !self.widgets.contains_key(*r))
            .cloned()
            .collect()
    }
}

/// `<base_dir>/dashboards/<dashboard_id>/dashboard.json`
pub fn document_path(base_dir: &Path, dashboard_id: &str) -> PathBuf {
    base_dir
        .join("dashboards")
        .join(dashboard_id)
        .join("dashboard.json")
}

/// Save a dashboard document atomically.
///
/// # Errors
///
/// Returns `io::Error` if directory creation, writing, or renaming fails.
pub fn save_document(
    base_dir: &Path,
    dashboard_id: &str,
    document: &DashboardDocument,
) -> io::Result<()> {
    let path = document_path(base_dir, dashboard_id);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(document)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, &path)?;

    tracing::debug!(dashboard_id, path = %path.display(), "dashboard document saved");
    Ok(())
}

/// Load a dashboard document.
///
/// Returns `Ok(None)` when the file is missing or cannot be parsed; a
/// corrupt file is logged and treated as absent.
///
/// # Errors
///
/// Returns `io::Error` for I/O failures other than file-not-found.
pub fn load_document(base_dir: &Path, dashboard_id: &str) -> io::Result<Option<DashboardDocument>> {
    let path = document_path(base_dir, dashboard_id);
    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    match serde_json::from_slice::<DashboardDocument>(&bytes) {
        Ok(doc) => Ok(Some(doc)),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to deserialize dashboard document; treating as missing"
            );
            Ok(None)
        }
    }
}
