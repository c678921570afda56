//! Serialized command/event engine for analytical dashboards.
//!
//! Callers build commands with the constructors in [`command`], dispatch
//! them through a [`DashboardHandle`], and observe the outcome as one
//! [`DashboardEvent`] per command plus the committed [`DashboardState`].

pub mod backend;
pub use backend::{Backend, DateDataset, primary_date_dataset};
pub mod command;
pub use command::{
    CommandPayload, DashboardCommand, DateDatasetChoice, FilterOperation, MeasureHeader,
};
mod config;
pub use config::DashboardConfig;
mod document;
pub use document::{DashboardDocument, document_path, load_document, save_document};
mod error;
pub use error::{BackendError, CommandError, DispatchError, ErrorKind};
mod event;
pub use event::{DashboardEvent, EventPayload};
mod filter;
pub use filter::{AttributeFilter, DashboardFilters, DateFilter, DateGranularity};
mod handler;
pub use handler::{DashboardContext, HandlerOutput, handle};
mod layout;
pub use layout::{
    Layout, LayoutError, LayoutItem, LayoutSection, SectionHeader, add_section, move_item,
    move_item_to_new_section, move_section, remove_item, remove_section,
};
mod runner;
pub use runner::{CommandTicket, DashboardHandle};
mod state;
pub use state::{
    DashboardState, Mutation, RenderMode, RenderModeState, Toast, ToastSeverity, UiState,
};
mod store;
pub use store::DashboardBuilder;
mod widget;
pub use widget::{
    ComparisonDirection, ComparisonType, DrillDefinition, DrillTarget, InsightWidget,
    KpiComparison, KpiWidget, LegacyDrill, ObjRef, Widget, WidgetHeader,
};
