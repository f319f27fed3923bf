use serde::{Deserialize, Serialize};

/// Stable identifier of a wiki in the farm (its database name, e.g. `enwiki`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One site entry of the sitematrix (`formatversion=2` shape)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetMember {
    #[serde(rename = "dbname")]
    pub id: MemberId,
    pub url: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub sitename: Option<String>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub nonglobal: bool,
    /// Parsed for completeness; fishbowl wikis are still surveyed.
    #[serde(default)]
    pub fishbowl: bool,
}

impl FleetMember {
    /// Open, public and attached to the global account system
    pub fn is_eligible(&self) -> bool {
        !self.closed && !self.private && !self.nonglobal
    }

    /// Action API endpoint of this wiki
    pub fn api_url(&self) -> String {
        format!("{}/w/api.php", self.url.trim_end_matches('/'))
    }
}
