use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::MemberId;

/// Result of probing one wiki.
///
/// `Failure` is kept distinct from `Success(vec![])`: a wiki with no novel
/// groups is not the same as a wiki that could not be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Novel group names, unique and in first-seen order
    Success(Vec<String>),
    Failure,
}

impl ProbeOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeOutcome::Failure)
    }

    pub fn capabilities(&self) -> &[String] {
        match self {
            ProbeOutcome::Success(names) => names,
            ProbeOutcome::Failure => &[],
        }
    }
}

/// The persisted document: exactly `ignored`, `canonical` and `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateArtifact {
    pub ignored: Vec<String>,
    pub canonical: Vec<String>,
    /// One entry per eligible wiki, in enumeration order
    pub extra: IndexMap<MemberId, Vec<String>>,
}

/// Artifact plus the diagnostics printed at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyReport {
    pub artifact: AggregateArtifact,
    /// Union of every novel group, deduplicated, first-seen order
    pub global_novel: Vec<String>,
    /// Wikis whose probe failed, in enumeration order
    pub failed_members: Vec<MemberId>,
}

impl SurveyReport {
    pub fn member_count(&self) -> usize {
        self.artifact.extra.len()
    }
}
