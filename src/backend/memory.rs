//! In-memory backend for tests and demos.
//!
//! Answers from fixed tables. Latency can be injected per measure so tests
//! can make one handler suspend longer than another, and the whole backend
//! can be switched offline to exercise rejection paths.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::backend::{
    BackendFuture, DateDataset, DateDatasetCatalog, DrillTargetValidator, MeasureResolver,
};
use crate::error::BackendError;
use crate::widget::{DrillTarget, ObjRef};

/// Table-driven implementation of every backend collaborator.
///
/// Built with the `with_*` methods, then shared through
/// [`Backend::from_shared`](crate::Backend::from_shared).
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    measure_titles: HashMap<ObjRef, String>,
    date_datasets: HashMap<ObjRef, Vec<DateDataset>>,
    drill_targets: HashSet<DrillTarget>,
    latency: HashMap<ObjRef, Duration>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryBackend {
    /// An empty, online backend. Every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `measure` with its display `title`.
    pub fn with_measure(mut self, measure: impl Into<ObjRef>, title: impl Into<String>) -> Self {
        self.measure_titles.insert(measure.into(), title.into());
        self
    }

    /// Candidate date datasets for `measure`, in catalog order.
    pub fn with_date_datasets(
        mut self,
        measure: impl Into<ObjRef>,
        datasets: Vec<DateDataset>,
    ) -> Self {
        self.date_datasets.insert(measure.into(), datasets);
        self
    }

    /// Mark `target` as an existing drill target.
    pub fn with_drill_target(mut self, target: DrillTarget) -> Self {
        self.drill_targets.insert(target);
        self
    }

    /// Delay every call that concerns `measure`.
    pub fn with_latency(mut self, measure: impl Into<ObjRef>, delay: Duration) -> Self {
        self.latency.insert(measure.into(), delay);
        self
    }

    /// Make every subsequent call fail with [`BackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    /// Number of collaborator calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    async fn enter(&self, subject: Option<&ObjRef>) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        if let Some(delay) = subject.and_then(|s| self.latency.get(s)) {
            tokio::time::sleep(*delay).await;
        }
        if self.offline.load(Ordering::Acquire) {
            return Err(BackendError::Unavailable("in-memory backend is offline".into()));
        }
        Ok(())
    }
}

impl MeasureResolver for InMemoryBackend {
    fn measure_title<'a>(&'a self, measure: &'a ObjRef) -> BackendFuture<'a, String> {
        Box::pin(async move {
            self.enter(Some(measure)).await?;
            self.measure_titles
                .get(measure)
                .cloned()
                .ok_or_else(|| BackendError::NotFound(measure.clone()))
        })
    }
}

impl DateDatasetCatalog for InMemoryBackend {
    fn date_datasets<'a>(&'a self, measure: &'a ObjRef) -> BackendFuture<'a, Vec<DateDataset>> {
        Box::pin(async move {
            self.enter(Some(measure)).await?;
            Ok(self.date_datasets.get(measure).cloned().unwrap_or_default())
        })
    }
}

impl DrillTargetValidator for InMemoryBackend {
    fn target_exists<'a>(&'a self, target: &'a DrillTarget) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.enter(None).await?;
            Ok(self.drill_targets.contains(target))
        })
    }
}
