use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::MemberHandle;
use crate::adapters::{api_params, ApiClient, ClientFactory};
use crate::domain::{FleetMember, MemberId};
use crate::error::{GroupScanError, Result};

/// Resolves the eligible wikis of the farm from the hub's sitematrix.
pub struct FleetDirectory {
    hub: Arc<dyn ApiClient>,
    factory: Arc<dyn ClientFactory>,
}

impl FleetDirectory {
    pub fn new(hub: Arc<dyn ApiClient>, factory: Arc<dyn ClientFactory>) -> Self {
        Self { hub, factory }
    }

    /// Query the sitematrix and bind one handle per eligible wiki.
    ///
    /// Any failure here is a `Directory` error: no partial handle set is
    /// ever returned.
    pub async fn list_eligible_members(&self) -> Result<IndexMap<MemberId, MemberHandle>> {
        let response = self
            .hub
            .query(&api_params(&[
                ("action", "sitematrix"),
                ("smlimit", "max"),
                ("formatversion", "2"),
            ]))
            .await
            .map_err(|e| GroupScanError::Directory(format!("sitematrix request failed: {}", e)))?;

        let members = parse_sitematrix(&response)?;
        let total = members.len();

        let mut handles = IndexMap::new();
        for member in members.into_iter().filter(FleetMember::is_eligible) {
            if handles.contains_key(&member.id) {
                warn!("Duplicate sitematrix entry for {}, keeping the first", member.id);
                continue;
            }
            let client = self.factory.bind(&member.api_url()).map_err(|e| {
                GroupScanError::Directory(format!("cannot bind client for {}: {}", member.id, e))
            })?;
            debug!("Bound {} to {}", member.id, member.api_url());
            handles.insert(member.id.clone(), MemberHandle::new(member.id, client));
        }

        info!(
            "Sitematrix lists {} wikis, {} eligible for probing",
            total,
            handles.len()
        );
        Ok(handles)
    }
}

/// Flatten a sitematrix response into its site entries.
///
/// Numeric language-group keys come first in ascending numeric order, then
/// the flat `specials` list. Every other key (`count`) is ignored.
pub fn parse_sitematrix(response: &Value) -> Result<Vec<FleetMember>> {
    let matrix = response
        .get("sitematrix")
        .and_then(Value::as_object)
        .ok_or_else(|| GroupScanError::Directory("response has no sitematrix object".into()))?;

    let mut group_keys: Vec<(u64, &String)> = matrix
        .keys()
        .filter(|key| !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|key| key.parse::<u64>().ok().map(|n| (n, key)))
        .collect();
    group_keys.sort_by_key(|(n, _)| *n);

    let mut members = Vec::new();
    for (_, key) in group_keys {
        let sites = matrix[key.as_str()]
            .get("site")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                GroupScanError::Directory(format!("language group {} has no site list", key))
            })?;
        push_sites(&mut members, sites, key)?;
    }

    if let Some(specials) = specials_list(matrix)? {
        push_sites(&mut members, specials, "specials")?;
    }

    Ok(members)
}

fn specials_list(matrix: &Map<String, Value>) -> Result<Option<&Vec<Value>>> {
    match matrix.get("specials") {
        None => Ok(None),
        Some(value) => value
            .as_array()
            .map(Some)
            .ok_or_else(|| GroupScanError::Directory("specials is not a list".into())),
    }
}

fn push_sites(out: &mut Vec<FleetMember>, sites: &[Value], group: &str) -> Result<()> {
    for site in sites {
        let member: FleetMember = serde_json::from_value(site.clone()).map_err(|e| {
            GroupScanError::Directory(format!("malformed site entry in {}: {}", group, e))
        })?;
        out.push(member);
    }
    Ok(())
}
