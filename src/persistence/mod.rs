pub mod artifact;

pub use artifact::{render_artifact, ArtifactWriter, JsonFileWriter};
