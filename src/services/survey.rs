//! One enumeration-probe-aggregate pass over the wiki farm.

use std::io::Write;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{BaselineCapabilitySet, MemberId, SurveyReport};
use crate::error::{GroupScanError, Result};
use crate::fleet::{
    aggregate, cancelled, run_probes, FleetDirectory, MemberHandle, ThrottleOptions,
};
use crate::persistence::ArtifactWriter;

pub struct SurveyRunner {
    directory: FleetDirectory,
    baseline: BaselineCapabilitySet,
    options: ThrottleOptions,
}

impl SurveyRunner {
    pub fn new(
        directory: FleetDirectory,
        baseline: BaselineCapabilitySet,
        options: ThrottleOptions,
    ) -> Self {
        Self {
            directory,
            baseline,
            options,
        }
    }

    /// Enumerate, probe and aggregate. Nothing is written here.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) -> Result<SurveyReport> {
        // The sitematrix request has no timeout, so it must be interruptible too.
        let handles = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                warn!("Survey cancelled while listing wikis");
                return Err(GroupScanError::Cancelled);
            }
            handles = self.directory.list_eligible_members() => handles?,
        };
        let (ids, handles): (Vec<MemberId>, Vec<MemberHandle>) = handles.into_iter().unzip();

        let outcomes = run_probes(handles, &self.baseline, &self.options, cancel).await?;
        let report = aggregate(&ids, &outcomes, &self.baseline)?;

        info!(
            "Survey complete: {} wikis, {} novel groups, {} failed probes",
            report.member_count(),
            report.global_novel.len(),
            report.failed_members.len()
        );
        Ok(report)
    }

    /// Run the survey and hand the artifact to `writer`, if any.
    ///
    /// A directory failure or cancellation returns before the writer is
    /// touched, so no partial artifact is ever persisted.
    pub async fn run_and_persist(
        &self,
        writer: Option<&dyn ArtifactWriter>,
        cancel: watch::Receiver<bool>,
    ) -> Result<SurveyReport> {
        let report = self.run(cancel).await?;
        match writer {
            Some(writer) => writer.persist(&report.artifact).await?,
            None => info!("Dry run: artifact not written"),
        }
        Ok(report)
    }
}

/// Print the fleet-wide novel groups and the failed wikis, one line each.
pub fn write_diagnostics<W: Write>(report: &SurveyReport, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "allExtraGroups {}",
        serde_json::to_string(&report.global_novel)?
    )?;
    writeln!(
        out,
        "nullGroupDb {}",
        serde_json::to_string(&report.failed_members)?
    )?;
    Ok(())
}
