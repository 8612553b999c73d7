//! Types for the stage diagram API.
//!
//! This module defines the request, response and stage model types. The
//! [`DiagramSpec`] is the structural description of a query's stages; the
//! [`DiagramResult`] bundles it with the rendered diagram and any issues.

mod common;
mod request;
mod response;

// Re-export all public types
pub use common::{issue_codes, CanonicalName, Issue, IssueCount, Severity, Summary};
pub use request::{DiagramRequest, Dialect, FlowDirection, RenderOptions};
pub use response::{
    DiagramResult, DiagramSpec, FromItem, GroupByItem, JoinItem, Stage, StageKind, WhereItem,
};
