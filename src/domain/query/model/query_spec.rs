use serde::Serialize;
use tracing::warn;

use super::query_window::QueryWindow;
use crate::errors::PipelineError;

pub type ProgramName = String;

/// Program identifiers the results API is known to serve.
pub const KNOWN_PROGRAMS: [&str; 7] = [
    "confess-chrome",
    "youtube-test",
    "ping-test",
    "network",
    "voice-out",
    "cloud-download",
    "cloud-upload",
];

/// Everything one invocation asks the API for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySpec {
    pub window: QueryWindow,
    /// Ordered set: duplicates and blanks removed, first occurrence wins.
    pub programs: Vec<ProgramName>,
    pub probe_ids: Vec<String>,
}

impl QuerySpec {
    pub fn new<P, S>(window: QueryWindow, programs: P, probe_ids: Vec<String>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<ProgramName> = Vec::new();
        for program in programs {
            let program = program.into().trim().to_string();
            if !program.is_empty() && !unique.contains(&program) {
                unique.push(program);
            }
        }

        Self {
            window,
            programs: unique,
            probe_ids,
        }
    }

    /// Preconditions checked before any request is issued.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.programs.is_empty() {
            return Err(PipelineError::Config("at least one program must be selected".into()));
        }
        if self.probe_ids.is_empty() {
            return Err(PipelineError::Config("probe list is empty".into()));
        }

        for program in &self.programs {
            if !KNOWN_PROGRAMS.contains(&program.as_str()) {
                warn!(program = %program, "Requesting a program outside the known set");
            }
        }

        Ok(())
    }
}
