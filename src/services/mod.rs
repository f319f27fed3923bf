pub mod survey;

pub use survey::{write_diagnostics, SurveyRunner};
