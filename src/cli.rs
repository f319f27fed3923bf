use clap::Parser;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "groupscan")]
#[command(version)]
#[command(
    about = "Collect the user groups unique to each wiki of a farm",
    long_about = None
)]
pub struct Cli {
    /// Directory holding default.toml and per-environment overrides
    #[arg(short, long, default_value = "config", env = "GROUPSCAN_CONFIG_DIR")]
    pub config_dir: String,

    /// Artifact path (overrides output.path)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Maximum wikis probed at once (overrides survey.max_concurrent)
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Per-probe deadline in seconds (overrides survey.probe_timeout_secs)
    #[arg(long)]
    pub probe_timeout_secs: Option<u64>,

    /// Survey and print diagnostics without writing the artifact
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.output {
            config.output.path = path.clone();
        }
        if let Some(n) = self.max_concurrent {
            config.survey.max_concurrent = n;
        }
        if let Some(secs) = self.probe_timeout_secs {
            config.survey.probe_timeout_secs = Some(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "groupscan",
            "--output",
            "out/groups.json",
            "--max-concurrent",
            "8",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.output.as_deref(), Some("out/groups.json"));
        assert_eq!(cli.max_concurrent, Some(8));
        assert!(cli.dry_run);
        assert!(cli.probe_timeout_secs.is_none());
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::try_parse_from(["groupscan", "-o", "x.json", "--probe-timeout-secs", "90"])
            .unwrap();
        let mut config = AppConfig::load_from("/nonexistent/groupscan-config").unwrap();
        cli.apply(&mut config);
        assert_eq!(config.output.path, "x.json");
        assert_eq!(config.survey.probe_timeout_secs, Some(90));
        assert_eq!(config.survey.max_concurrent, 100);
    }
}
