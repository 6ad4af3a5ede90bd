use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Request field that carries the program list. The two names are distinct
/// API contracts, not spellings of the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramField {
    #[default]
    Programs,
    Tests,
}

impl ProgramField {
    pub fn wire_name(&self) -> &'static str {
        match self {
            ProgramField::Programs => "programs",
            ProgramField::Tests => "tests",
        }
    }
}

/// Continuation protocol used by the results endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationProtocol {
    /// Opaque `next_pagination_data` echoed back as `pagination_data`.
    #[default]
    Token,
    /// `pit` + `search_after` cursor pair.
    PointInTime,
}

/// Wire contract of one endpoint configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiDialect {
    pub program_field: ProgramField,
    pub pagination: PaginationProtocol,
}

impl ApiDialect {
    pub fn new(program_field: ProgramField, pagination: PaginationProtocol) -> Self {
        Self {
            program_field,
            pagination,
        }
    }
}

impl fmt::Display for ApiDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.program_field.wire_name(), self.pagination)
    }
}

/// How the program field is chosen for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "field")]
pub enum ProgramFieldSelection {
    Fixed(ProgramField),
    /// Try `programs`, fall back to `tests` when it yields nothing, and
    /// remember whichever produced data.
    #[default]
    Auto,
}

impl ProgramFieldSelection {
    /// Fields to try, in order, given what the session already learned.
    pub fn candidates(&self, cached: Option<ProgramField>) -> Vec<ProgramField> {
        match (self, cached) {
            (ProgramFieldSelection::Fixed(field), _) => vec![*field],
            (ProgramFieldSelection::Auto, Some(field)) => vec![field],
            (ProgramFieldSelection::Auto, None) => vec![ProgramField::Programs, ProgramField::Tests],
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, ProgramFieldSelection::Auto)
    }
}

impl FromStr for ProgramFieldSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "programs" => Ok(Self::Fixed(ProgramField::Programs)),
            "tests" => Ok(Self::Fixed(ProgramField::Tests)),
            "auto" | "" => Ok(Self::Auto),
            other => Err(format!("unknown program field '{other}' (expected programs, tests or auto)")),
        }
    }
}

impl FromStr for PaginationProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" | "" => Ok(Self::Token),
            "pit" | "point_in_time" | "search_after" => Ok(Self::PointInTime),
            other => Err(format!("unknown pagination protocol '{other}' (expected token or pit)")),
        }
    }
}
