//! Entry point that assembles a dashboard instance.
//!
//! A dashboard is opened via [`DashboardBuilder`], which takes the backend
//! collaborators, an initial document (given directly or loaded from a
//! base directory) and configuration, and spawns the runner.

use std::io;
use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::config::DashboardConfig;
use crate::document::{DashboardDocument, load_document};
use crate::handler::DashboardContext;
use crate::runner::{DashboardHandle, RunnerConfig, spawn_runner};
use crate::state::{DashboardState, RenderMode};

/// Builder for a [`DashboardHandle`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use dashfold::backend::memory::InMemoryBackend;
/// use dashfold::{Backend, DashboardBuilder, DashboardDocument};
///
/// # async fn example() -> std::io::Result<()> {
/// let backend = Backend::from_shared(Arc::new(InMemoryBackend::new()));
/// let dashboard = DashboardBuilder::new(backend)
///     .document(DashboardDocument::default())
///     .edit_mode_enabled(false)
///     .open()
///     .await?;
/// assert_eq!(dashboard.state().version, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DashboardBuilder {
    backend: Backend,
    config: DashboardConfig,
    document: Option<DashboardDocument>,
    source: Option<(PathBuf, String)>,
    initial_render_mode: RenderMode,
}

impl DashboardBuilder {
    /// A builder with default configuration, starting in view mode.
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            config: DashboardConfig::default(),
            document: None,
            source: None,
            initial_render_mode: RenderMode::View,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    /// See [`DashboardConfig::edit_mode_enabled`].
    pub fn edit_mode_enabled(mut self, enabled: bool) -> Self {
        self.config.edit_mode_enabled = enabled;
        self
    }

    /// See [`DashboardConfig::queue_capacity`].
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// See [`DashboardConfig::event_capacity`].
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Render mode to start in. Forced to view mode when edit mode is
    /// disabled.
    pub fn initial_render_mode(mut self, mode: RenderMode) -> Self {
        self.initial_render_mode = mode;
        self
    }

    /// Start from this document. Takes precedence over
    /// [`load_from`](Self::load_from).
    pub fn document(mut self, document: DashboardDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Load the document saved under `base_dir` for `dashboard_id`.
    pub fn load_from(
        mut self,
        base_dir: impl AsRef<Path>,
        dashboard_id: impl Into<String>,
    ) -> Self {
        self.source = Some((base_dir.as_ref().to_path_buf(), dashboard_id.into()));
        self
    }

    /// Spawn the runner on the current tokio runtime.
    ///
    /// Without a document or a source the dashboard starts empty. Edit mode
    /// is only honoured as the initial mode when it is enabled.
    ///
    /// # Errors
    ///
    /// * `NotFound` if a source was given but holds no readable document.
    /// * `InvalidData` if the document's layout references missing widgets.
    /// * Any I/O error from reading the document.
    pub async fn open(self) -> io::Result<DashboardHandle> {
        let document = match (self.document, self.source) {
            (Some(document), _) => document,
            (None, Some((base_dir, dashboard_id))) => load_document(&base_dir, &dashboard_id)?
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no dashboard document for '{dashboard_id}'"),
                    )
                })?,
            (None, None) => DashboardDocument::default(),
        };

        let dangling = document.dangling_refs();
        if !dangling.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("layout references missing widgets: {dangling:?}"),
            ));
        }

        let mode = if self.config.edit_mode_enabled {
            self.initial_render_mode
        } else {
            RenderMode::View
        };

        tracing::debug!(
            title = %document.title,
            widgets = document.widgets.len(),
            ?mode,
            "opening dashboard"
        );

        let runner_config = RunnerConfig {
            queue_capacity: self.config.queue_capacity,
            event_capacity: self.config.event_capacity,
        };
        let ctx = DashboardContext {
            backend: self.backend,
            config: self.config,
        };
        Ok(spawn_runner(ctx, DashboardState::new(document, mode), runner_config))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::document::save_document;
    use crate::handler::test_support::fixture_backend;
    use crate::layout::Layout;
    use crate::state::test_fixtures::sample_document;

    fn backend() -> Backend {
        Backend::from_shared(Arc::new(fixture_backend()))
    }

    #[tokio::test]
    async fn opens_from_saved_document() {
        let tmp = TempDir::new().unwrap();
        save_document(tmp.path(), "sales", &sample_document()).unwrap();

        let dashboard = DashboardBuilder::new(backend())
            .load_from(tmp.path(), "sales")
            .open()
            .await
            .unwrap();

        assert_eq!(dashboard.document(), sample_document());
        assert!(dashboard.is_alive());
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = DashboardBuilder::new(backend())
            .load_from(tmp.path(), "nope")
            .open()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn dangling_layout_is_rejected() {
        let doc =
            DashboardDocument::default().with_layout(Layout::from_widgets(vec![vec!["ghost"]]));
        let err = DashboardBuilder::new(backend())
            .document(doc)
            .open()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn disabled_edit_mode_forces_view_start() {
        let dashboard = DashboardBuilder::new(backend())
            .document(sample_document())
            .initial_render_mode(RenderMode::Edit)
            .edit_mode_enabled(false)
            .open()
            .await
            .unwrap();
        assert!(!dashboard.state().is_edit_mode());

        let dashboard = DashboardBuilder::new(backend())
            .document(sample_document())
            .initial_render_mode(RenderMode::Edit)
            .open()
            .await
            .unwrap();
        assert!(dashboard.state().is_edit_mode());
    }
}
