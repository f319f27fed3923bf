pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fleet;
pub mod persistence;
pub mod services;

pub use config::AppConfig;
pub use domain::{
    AggregateArtifact, BaselineCapabilitySet, FleetMember, MemberId, ProbeOutcome, SurveyReport,
};
pub use error::{GroupScanError, Result};
pub use fleet::{FleetDirectory, MemberHandle, ThrottleOptions};
pub use services::SurveyRunner;
