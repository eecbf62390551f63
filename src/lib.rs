//! Core update pipeline: version resolution and manifest rewriting across
//! heterogeneous dependency ecosystems, driven through a common
//! `Detect -> Plan -> Apply -> Validate` integration contract.

pub mod adapters;
pub mod cancel;
pub mod datasource;
pub mod dependency;
pub mod error;
pub mod integration;
pub mod manifest;
pub mod metadata;
pub mod pathsafe;
pub mod plugin;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod update;

pub use dependency::{Dependency, DependencyKind};
pub use error::{Error, Result};
pub use integration::Integration;
pub use manifest::Manifest;
pub use policy::{IntegrationPolicy, PlanContext};
pub use registry::{IntegrationRegistry, INTEGRATIONS};
pub use update::{ApplyResult, Update, UpdatePlan};
