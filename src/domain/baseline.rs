use std::collections::HashSet;

use crate::error::{GroupScanError, Result};

/// Groups that exist nearly everywhere or are deliberately uninteresting.
pub const DEFAULT_IGNORED: &[&str] = &[
    "*",
    "user",
    "autoconfirmed",
    "steward",
    "import",
    "transwiki",
    "ipblock-exempt",
    // Project-dependent groups
    "editor",
    "uploader",
    "autoreview",
    "autopatrolled",
    "extendedconfirmed",
    "autoeditor",
    "noratelimit",
    "autoreviewer",
    "upload-shared",
    "trusteduser",
    "trusted",
    "autoreviewed",
    "validator",
    "autoextendedconfirmed",
    "upwizcampeditors",
    "eventparticipant",
    "inactive",
    "machinevision-tester",
    "translator",
];

/// Groups expected on every wiki of the farm.
pub const DEFAULT_CANONICAL: &[&str] = &[
    "bot",
    "sysop",
    "interface-admin",
    "bureaucrat",
    "suppress",
    "accountcreator",
    "checkuser",
];

/// The fixed `ignored` and `canonical` lists, excluded from novelty detection.
///
/// Built once at startup and shared read-only by every probe and by the
/// aggregation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineCapabilitySet {
    ignored: Vec<String>,
    canonical: Vec<String>,
    excluded: HashSet<String>,
}

impl BaselineCapabilitySet {
    /// Build a baseline. The two lists must be disjoint.
    pub fn new(ignored: Vec<String>, canonical: Vec<String>) -> Result<Self> {
        let ignored_set: HashSet<&str> = ignored.iter().map(String::as_str).collect();
        let overlap: Vec<&str> = canonical
            .iter()
            .map(String::as_str)
            .filter(|name| ignored_set.contains(name))
            .collect();
        if !overlap.is_empty() {
            return Err(GroupScanError::Validation(format!(
                "baseline lists overlap: {}",
                overlap.join(", ")
            )));
        }

        let excluded = ignored.iter().chain(canonical.iter()).cloned().collect();
        Ok(Self {
            ignored,
            canonical,
            excluded,
        })
    }

    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn canonical(&self) -> &[String] {
        &self.canonical
    }

    /// True when `name` is in ignored ∪ canonical
    pub fn is_baseline(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    /// Drop baseline names and duplicates, keeping first-seen order.
    pub fn novel<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            let name = name.into();
            if self.is_baseline(&name) || !seen.insert(name.clone()) {
                continue;
            }
            out.push(name);
        }
        out
    }
}

impl Default for BaselineCapabilitySet {
    fn default() -> Self {
        // The built-in lists are disjoint (see `default_lists_are_disjoint`).
        let ignored: Vec<String> = DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect();
        let canonical: Vec<String> = DEFAULT_CANONICAL.iter().map(|s| s.to_string()).collect();
        let excluded = ignored.iter().chain(canonical.iter()).cloned().collect();
        Self {
            ignored,
            canonical,
            excluded,
        }
    }
}
