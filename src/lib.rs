//! Manifest validation and selection planning for declarative installers.
//!
//! A manifest declares installable modules, their dependencies, and the phase
//! each belongs to. This crate turns a manifest document into a typed
//! [`model::Manifest`], checks it for graph and naming defects, and computes
//! deterministic execution plans from user selection directives.
//!
//! The usual flow is [`load_manifest`] followed by [`plan::plan_selection`].

pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod module_id;
pub mod plan;
pub mod report;
pub mod schema;
pub mod validate;

pub use config::{ModplanConfig, OutputFormat};
pub use error::{LoadedManifest, ManifestError, check_document, load_manifest};
pub use model::{Manifest, Module, Phase};
pub use module_id::ModuleId;
pub use plan::{Plan, PlanError, Selection, plan_selection, render_plan};
pub use validate::{ValidationReport, validate_manifest};
