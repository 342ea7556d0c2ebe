//! Error types for mesh import/export, geometry and math operations
use std::fmt;

use thiserror::Error;

/// Failures of the linear-algebra layer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("cannot normalize a zero-length vector")]
    DegenerateVector,

    #[error("matrix is singular")]
    SingularMatrix,
}

/// Reasons a polygon cannot be constructed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolygonError {
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("vertex index {0} appears more than once")]
    DuplicateVertex(usize),

    #[error("{attribute} index count {found} does not match vertex count {expected}")]
    AttributeCountMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
}

/// What went wrong on a single line of OBJ input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("invalid number '{token}'")]
    InvalidNumber { token: String },

    #[error("'{record}' expects {expected} values, found {found}")]
    FieldCount {
        record: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("face needs at least 3 references, found {0}")]
    TooFewReferences(usize),

    #[error("malformed face reference '{token}'")]
    MalformedReference { token: String },

    #[error("{attribute} index 0 is invalid (indices are 1-based)")]
    ZeroIndex { attribute: &'static str },

    #[error("{attribute} index {index} is out of range ({len} defined so far)")]
    IndexOutOfRange {
        attribute: &'static str,
        index: i64,
        len: usize,
    },

    #[error("face mixes references with and without texture/normal indices")]
    InconsistentFaceFormat,

    #[error("face references vertex {index} more than once")]
    DuplicateVertex { index: i64 },
}

/// A single structural problem found while validating a mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NoVertices,
    NoPolygons,
    IndexOutOfRange {
        polygon: usize,
        attribute: &'static str,
        index: usize,
        len: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NoVertices => write!(f, "mesh has no vertices"),
            ValidationIssue::NoPolygons => write!(f, "mesh has no faces"),
            ValidationIssue::IndexOutOfRange {
                polygon,
                attribute,
                index,
                len,
            } => write!(
                f,
                "face {} references {} {} but only {} exist",
                polygon + 1,
                attribute,
                index + 1,
                len
            ),
        }
    }
}

/// Every problem found by a validation pass, reported at once
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mesh validation failed: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// OBJ import failure. No partial mesh is ever produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjError {
    #[error("line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ObjError {
    /// Line number of a parse error, if this is one
    pub fn line(&self) -> Option<usize> {
        match self {
            ObjError::Parse { line, .. } => Some(*line),
            ObjError::Validation(_) => None,
        }
    }
}

/// OBJ export failure. Nothing is written when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("{record} {index} has a NaN or infinite component")]
    NonFinite { record: &'static str, index: usize },
}

/// Umbrella error for the collaborator-facing API
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("import failed: {0}")]
    Import(#[from] ObjError),

    #[error("export failed: {0}")]
    Export(#[from] WriteError),
}

pub type Result<T> = std::result::Result<T, Error>;
