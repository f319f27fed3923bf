use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{probe_member, MemberHandle};
use crate::domain::{BaselineCapabilitySet, ProbeOutcome};
use crate::error::{GroupScanError, Result};

pub const DEFAULT_MAX_CONCURRENT: usize = 100;

/// Knobs for the fan-out driver
#[derive(Debug, Clone)]
pub struct ThrottleOptions {
    /// Hard ceiling on probes in flight at any instant
    pub max_concurrent: usize,
    /// Per-probe deadline. `None` waits forever.
    pub probe_timeout: Option<Duration>,
    /// Log progress every this many completed probes
    pub progress_every: usize,
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            probe_timeout: None,
            progress_every: 100,
        }
    }
}

/// Probe every handle with at most `max_concurrent` probes in flight.
///
/// The returned outcomes are index-aligned with `handles`. A single failed
/// probe never affects its siblings. When `cancel` flips to `true` the
/// remaining probes are dropped and `GroupScanError::Cancelled` is returned.
pub async fn run_probes(
    handles: Vec<MemberHandle>,
    baseline: &BaselineCapabilitySet,
    options: &ThrottleOptions,
    mut cancel: watch::Receiver<bool>,
) -> Result<Vec<ProbeOutcome>> {
    let total = handles.len();
    let limit = options.max_concurrent.max(1);
    let progress_every = options.progress_every.max(1);
    let timeout = options.probe_timeout;

    info!("Probing {} wikis, at most {} at a time", total, limit);

    let mut done = 0usize;
    // `buffer_unordered` frees a slot as soon as any probe settles; the index
    // tag puts each outcome back in enumeration order.
    let probes = stream::iter(handles.into_iter().enumerate())
        .map(|(index, handle)| async move {
            (index, probe_with_deadline(handle, baseline, timeout).await)
        })
        .buffer_unordered(limit)
        .inspect(|_| {
            done += 1;
            if done % progress_every == 0 || done == total {
                info!("Probed {}/{} wikis", done, total);
            }
        })
        .fold(vec![None::<ProbeOutcome>; total], |mut slots, (index, outcome)| async move {
            slots[index] = Some(outcome);
            slots
        });

    let slots = tokio::select! {
        biased;
        _ = cancelled(&mut cancel) => {
            warn!("Survey cancelled before all probes finished");
            return Err(GroupScanError::Cancelled);
        }
        slots = probes => slots,
    };

    slots
        .into_iter()
        .collect::<Option<Vec<ProbeOutcome>>>()
        .ok_or_else(|| GroupScanError::Internal("a probe produced no outcome".to_string()))
}

async fn probe_with_deadline(
    handle: MemberHandle,
    baseline: &BaselineCapabilitySet,
    timeout: Option<Duration>,
) -> ProbeOutcome {
    let Some(limit) = timeout else {
        return probe_member(handle, baseline).await;
    };

    let id = handle.id.clone();
    match tokio::time::timeout(limit, probe_member(handle, baseline)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!("Probe for {} timed out after {:?}", id, limit);
            ProbeOutcome::Failure
        }
    }
}

/// Resolves once the flag is `true`. A dropped sender never cancels.
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ApiClient, ApiParams};
    use crate::domain::MemberId;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    /// Tracks how many probes are in flight at once.
    #[derive(Default)]
    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
        starts: Mutex<Vec<Instant>>,
    }

    struct SlowClient {
        gauge: Arc<Gauge>,
        delay: Duration,
        groups: Option<Vec<&'static str>>,
    }

    #[async_trait]
    impl ApiClient for SlowClient {
        async fn query(&self, _params: &ApiParams) -> Result<Value> {
            self.gauge.starts.lock().unwrap().push(Instant::now());
            let now = self.gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.gauge.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.gauge.current.fetch_sub(1, Ordering::SeqCst);
            match &self.groups {
                Some(names) => {
                    let groups: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
                    Ok(json!({"query": {"usergroups": groups}}))
                }
                None => Err(GroupScanError::Internal("unreachable wiki".into())),
            }
        }
    }

    fn handle(
        id: &str,
        gauge: &Arc<Gauge>,
        delay_ms: u64,
        groups: Option<Vec<&'static str>>,
    ) -> MemberHandle {
        MemberHandle::new(
            MemberId::new(id),
            Box::new(SlowClient {
                gauge: gauge.clone(),
                delay: Duration::from_millis(delay_ms),
                groups,
            }),
        )
    }

    fn baseline() -> BaselineCapabilitySet {
        BaselineCapabilitySet::new(vec![], vec!["bot".to_string()]).unwrap()
    }

    fn options(max_concurrent: usize) -> ThrottleOptions {
        ThrottleOptions {
            max_concurrent,
            ..ThrottleOptions::default()
        }
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_ceiling() {
        let gauge = Arc::new(Gauge::default());
        let handles: Vec<_> = (0..25)
            .map(|i| handle(&format!("wiki{i}"), &gauge, 5, Some(vec!["x"])))
            .collect();
        let (_tx, rx) = watch::channel(false);

        let outcomes = run_probes(handles, &baseline(), &options(4), rx).await.unwrap();

        assert_eq!(outcomes.len(), 25);
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak concurrency {peak} exceeded ceiling");
        assert!(peak >= 2, "probes should overlap, peak was {peak}");
    }

    #[tokio::test]
    async fn outcomes_are_index_aligned_despite_uneven_latency() {
        let gauge = Arc::new(Gauge::default());
        let handles = vec![
            handle("slow", &gauge, 30, Some(vec!["first"])),
            handle("broken", &gauge, 1, None),
            handle("fast", &gauge, 1, Some(vec!["bot", "third"])),
        ];
        let (_tx, rx) = watch::channel(false);

        let outcomes = run_probes(handles, &baseline(), &options(3), rx).await.unwrap();

        assert_eq!(
            outcomes,
            vec![
                ProbeOutcome::Success(vec!["first".to_string()]),
                ProbeOutcome::Failure,
                ProbeOutcome::Success(vec!["third".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn slow_head_does_not_hold_other_slots() {
        let gauge = Arc::new(Gauge::default());
        let mut handles = vec![handle("w0", &gauge, 500, Some(vec!["slow"]))];
        handles.extend((1..21).map(|i| handle(&format!("w{i}"), &gauge, 5, Some(vec!["x"]))));
        let began = Instant::now();
        let (_tx, rx) = watch::channel(false);

        let outcomes = run_probes(handles, &baseline(), &options(4), rx).await.unwrap();

        let last_start = gauge
            .starts
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(began))
            .max()
            .unwrap();
        assert!(
            last_start < Duration::from_millis(250),
            "last launch waited for the slow head: {last_start:?}"
        );
        assert_eq!(outcomes.len(), 21);
        assert_eq!(outcomes[0], ProbeOutcome::Success(vec!["slow".to_string()]));
        assert!(gauge.peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn timed_out_probe_is_failure() {
        let gauge = Arc::new(Gauge::default());
        let handles = vec![
            handle("stuck", &gauge, 500, Some(vec!["late"])),
            handle("quick", &gauge, 1, Some(vec!["ok"])),
        ];
        let opts = ThrottleOptions {
            probe_timeout: Some(Duration::from_millis(50)),
            ..options(2)
        };
        let (_tx, rx) = watch::channel(false);

        let outcomes = run_probes(handles, &baseline(), &opts, rx).await.unwrap();

        assert_eq!(
            outcomes,
            vec![ProbeOutcome::Failure, ProbeOutcome::Success(vec!["ok".to_string()])]
        );
    }

    #[tokio::test]
    async fn cancellation_aborts_the_run() {
        let gauge = Arc::new(Gauge::default());
        let handles: Vec<_> = (0..4)
            .map(|i| handle(&format!("wiki{i}"), &gauge, 10_000, Some(vec!["x"])))
            .collect();
        let (tx, rx) = watch::channel(false);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(true).unwrap();
        });

        let err = run_probes(handles, &baseline(), &options(2), rx)
            .await
            .unwrap_err();
        assert!(matches!(err, GroupScanError::Cancelled));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn empty_fleet_yields_no_outcomes() {
        let (_tx, rx) = watch::channel(false);
        let outcomes = run_probes(vec![], &baseline(), &options(0), rx).await.unwrap();
        assert!(outcomes.is_empty());
    }
}
