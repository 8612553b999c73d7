pub mod ast;
pub mod error;
pub mod extractor;
pub mod naming;
pub mod parser;
pub mod pipeline;
pub mod rehydrate;
pub mod render;
pub mod types;

// Re-export main types and functions
pub use error::{ExtractError, ParseError};
pub use extractor::{extract_stages, FINAL_SELECT_NAME};
pub use naming::{canonicalize, extract_identifier};
pub use parser::{parse_sql_with_dialect, parse_statements};
pub use pipeline::{generate_diagram, generate_diagram_from_ast, render_diagram};
pub use rehydrate::{rehydrate, COMPLEX_EXPRESSION};

pub use types::{
    // Issue codes
    issue_codes,
    // Request types
    DiagramRequest,
    Dialect,
    FlowDirection,
    RenderOptions,
    // Response types
    CanonicalName,
    DiagramResult,
    DiagramSpec,
    FromItem,
    GroupByItem,
    Issue,
    IssueCount,
    JoinItem,
    Severity,
    Stage,
    StageKind,
    Summary,
    WhereItem,
};
