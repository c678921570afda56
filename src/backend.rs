//! Narrow interfaces to the analytical backend.
//!
//! Handlers suspend on these calls; a failed call rejects the command with
//! `BackendResolutionFailed`. The traits return boxed futures so they can be
//! used as trait objects and shared across the runner task.

pub mod memory;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::widget::{DrillTarget, ObjRef};

/// Boxed future returned by every collaborator call.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Resolves measure metadata.
pub trait MeasureResolver: Send + Sync {
    /// Display title of the measure.
    fn measure_title<'a>(&'a self, measure: &'a ObjRef) -> BackendFuture<'a, String>;
}

/// A date dataset a widget can be filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDataset {
    pub dataset: ObjRef,
    pub title: String,
    /// Higher is a better default.
    pub relevance: u32,
}

/// Lists the date datasets applicable to a measure.
pub trait DateDatasetCatalog: Send + Sync {
    fn date_datasets<'a>(&'a self, measure: &'a ObjRef) -> BackendFuture<'a, Vec<DateDataset>>;
}

/// Confirms that drill targets still exist.
pub trait DrillTargetValidator: Send + Sync {
    fn target_exists<'a>(&'a self, target: &'a DrillTarget) -> BackendFuture<'a, bool>;
}

/// The collaborators available to command handlers.
///
/// `Clone` is cheap: every collaborator is `Arc`-shared.
#[derive(Clone)]
pub struct Backend {
    pub measures: Arc<dyn MeasureResolver>,
    pub date_datasets: Arc<dyn DateDatasetCatalog>,
    pub drills: Arc<dyn DrillTargetValidator>,
}

impl Backend {
    /// Use one object for all three collaborator roles.
    pub fn from_shared<B>(backend: Arc<B>) -> Self
    where
        B: MeasureResolver + DateDatasetCatalog + DrillTargetValidator + 'static,
    {
        Self {
            measures: backend.clone(),
            date_datasets: backend.clone(),
            drills: backend,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}

/// Pick the primary candidate: highest relevance, earliest on ties.
pub fn primary_date_dataset(candidates: Vec<DateDataset>) -> Option<DateDataset> {
    candidates
        .into_iter()
        .reduce(|best, next| if next.relevance > best.relevance { next } else { best })
}
