//! Fan-out survey engine.
//!
//! [`FleetDirectory`] turns the hub's sitematrix into one [`MemberHandle`]
//! per eligible wiki, [`run_probes`] drives [`probe_member`] over those
//! handles under a hard concurrency ceiling, and [`aggregate`] merges the
//! index-aligned outcomes into the artifact and its diagnostics.

mod aggregate;
mod directory;
mod probe;
mod throttle;

pub use aggregate::aggregate;
pub use directory::{parse_sitematrix, FleetDirectory};
pub use probe::{parse_usergroups, probe_member};
pub(crate) use throttle::cancelled;
pub use throttle::{run_probes, ThrottleOptions, DEFAULT_MAX_CONCURRENT};

use crate::adapters::ApiClient;
use crate::domain::MemberId;

/// One-shot client binding for a single eligible wiki.
///
/// Consumed by value by its probe; never reused across runs.
pub struct MemberHandle {
    pub id: MemberId,
    client: Box<dyn ApiClient>,
}

impl MemberHandle {
    pub fn new(id: MemberId, client: Box<dyn ApiClient>) -> Self {
        Self { id, client }
    }

    pub(crate) fn client(&self) -> &dyn ApiClient {
        self.client.as_ref()
    }
}

impl std::fmt::Debug for MemberHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberHandle").field("id", &self.id).finish()
    }
}
