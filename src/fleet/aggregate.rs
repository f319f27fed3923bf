use indexmap::{IndexMap, IndexSet};

use crate::domain::{AggregateArtifact, BaselineCapabilitySet, MemberId, ProbeOutcome, SurveyReport};
use crate::error::{GroupScanError, Result};

/// Merge index-aligned probe outcomes into the artifact and diagnostics.
///
/// Pure: the same inputs always produce the same report. Failed wikis get an
/// empty `extra` entry and are listed once in `failed_members`. Baseline
/// names are filtered again here so the artifact invariant holds for any
/// outcome list, not only those produced by [`super::probe_member`].
pub fn aggregate(
    member_ids: &[MemberId],
    outcomes: &[ProbeOutcome],
    baseline: &BaselineCapabilitySet,
) -> Result<SurveyReport> {
    if member_ids.len() != outcomes.len() {
        return Err(GroupScanError::Internal(format!(
            "{} members but {} probe outcomes",
            member_ids.len(),
            outcomes.len()
        )));
    }

    let mut extra: IndexMap<MemberId, Vec<String>> = IndexMap::with_capacity(member_ids.len());
    let mut global_novel: IndexSet<String> = IndexSet::new();
    let mut failed_members = Vec::new();

    for (id, outcome) in member_ids.iter().zip(outcomes) {
        if extra.contains_key(id) {
            return Err(GroupScanError::Internal(format!("member {} listed twice", id)));
        }

        let groups = match outcome {
            ProbeOutcome::Success(names) => baseline.novel(names.iter().cloned()),
            ProbeOutcome::Failure => {
                failed_members.push(id.clone());
                Vec::new()
            }
        };
        global_novel.extend(groups.iter().cloned());
        extra.insert(id.clone(), groups);
    }

    Ok(SurveyReport {
        artifact: AggregateArtifact {
            ignored: baseline.ignored().to_vec(),
            canonical: baseline.canonical().to_vec(),
            extra,
        },
        global_novel: global_novel.into_iter().collect(),
        failed_members,
    })
}
