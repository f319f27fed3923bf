use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::MemberHandle;
use crate::adapters::api_params;
use crate::domain::{BaselineCapabilitySet, ProbeOutcome};
use crate::error::{GroupScanError, Result};

/// Only the name is kept; `rights` is ignored.
#[derive(Debug, Deserialize)]
struct UserGroup {
    name: String,
}

/// Probe one wiki for the user groups it defines beyond the baseline.
///
/// Never fails: transport errors, API errors and malformed payloads are
/// logged and reported as [`ProbeOutcome::Failure`]. No retries.
pub async fn probe_member(handle: MemberHandle, baseline: &BaselineCapabilitySet) -> ProbeOutcome {
    match fetch_group_names(&handle).await {
        Ok(names) => {
            let novel = baseline.novel(names);
            debug!("{}: {} novel groups", handle.id, novel.len());
            ProbeOutcome::Success(novel)
        }
        Err(e) => {
            warn!("{}", e);
            ProbeOutcome::Failure
        }
    }
}

async fn fetch_group_names(handle: &MemberHandle) -> Result<Vec<String>> {
    let probe_error = |reason: String| GroupScanError::Probe {
        member: handle.id.to_string(),
        reason,
    };

    let response = handle
        .client()
        .query(&api_params(&[
            ("action", "query"),
            ("meta", "siteinfo"),
            ("siprop", "usergroups"),
            ("formatversion", "2"),
        ]))
        .await
        .map_err(|e| probe_error(e.to_string()))?;

    parse_usergroups(&response).map_err(|e| probe_error(e.to_string()))
}

/// Extract group names from a `meta=siteinfo&siprop=usergroups` response.
pub fn parse_usergroups(response: &Value) -> Result<Vec<String>> {
    let groups = response
        .pointer("/query/usergroups")
        .ok_or_else(|| GroupScanError::Validation("response has no query.usergroups".into()))?;
    let groups: Vec<UserGroup> = serde_json::from_value(groups.clone())?;
    Ok(groups.into_iter().map(|g| g.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ApiParams, MockApiClient};
    use crate::domain::MemberId;
    use serde_json::json;

    fn baseline(canonical: &[&str]) -> BaselineCapabilitySet {
        BaselineCapabilitySet::new(
            vec!["*".to_string(), "user".to_string()],
            canonical.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    fn handle_with(client: MockApiClient) -> MemberHandle {
        MemberHandle::new(MemberId::new("a1"), Box::new(client))
    }

    fn usergroups(names: &[&str]) -> Value {
        let groups: Vec<Value> = names
            .iter()
            .map(|name| json!({"name": name, "rights": ["read"]}))
            .collect();
        json!({"batchcomplete": true, "query": {"usergroups": groups}})
    }

    #[tokio::test]
    async fn success_is_filtered_against_baseline() {
        let mut client = MockApiClient::new();
        client
            .expect_query()
            .withf(|params: &ApiParams| {
                params.contains(&("siprop".to_string(), "usergroups".to_string()))
            })
            .times(1)
            .returning(|_| Ok(usergroups(&["admin", "bot", "local-group"])));

        let outcome = probe_member(handle_with(client), &baseline(&["bot"])).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Success(vec!["admin".to_string(), "local-group".to_string()])
        );
    }

    #[tokio::test]
    async fn duplicates_within_one_wiki_are_collapsed() {
        let mut client = MockApiClient::new();
        client
            .expect_query()
            .returning(|_| Ok(usergroups(&["founder", "*", "founder", "flood", "user"])));

        let outcome = probe_member(handle_with(client), &baseline(&[])).await;
        assert_eq!(
            outcome,
            ProbeOutcome::Success(vec!["founder".to_string(), "flood".to_string()])
        );
    }

    #[tokio::test]
    async fn only_baseline_groups_is_empty_success() {
        let mut client = MockApiClient::new();
        client
            .expect_query()
            .returning(|_| Ok(usergroups(&["*", "user", "bot"])));

        let outcome = probe_member(handle_with(client), &baseline(&["bot"])).await;
        assert_eq!(outcome, ProbeOutcome::Success(vec![]));
    }

    #[tokio::test]
    async fn transport_error_is_failure() {
        let mut client = MockApiClient::new();
        client
            .expect_query()
            .times(1)
            .returning(|_| Err(GroupScanError::Internal("connection refused".into())));

        let outcome = probe_member(handle_with(client), &baseline(&["bot"])).await;
        assert_eq!(outcome, ProbeOutcome::Failure);
    }

    #[tokio::test]
    async fn malformed_payload_is_failure() {
        let mut client = MockApiClient::new();
        client
            .expect_query()
            .returning(|_| Ok(json!({"query": {"general": {}}})));

        let outcome = probe_member(handle_with(client), &baseline(&["bot"])).await;
        assert_eq!(outcome, ProbeOutcome::Failure);
    }

    #[test]
    fn group_without_name_is_rejected() {
        let err = parse_usergroups(&json!({"query": {"usergroups": [{"rights": []}]}}));
        assert!(err.is_err());
    }
}
