use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use extract::{ExtractConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use session::SessionConfig;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "kgraph", author, version, about = "Turn free text into a knowledge graph", long_about = None)]
pub struct Cli {
    /// Base URL of the extraction service
    #[arg(long, env = "KGRAPH_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Config file path (YAML)
    #[arg(short, long, env = "KGRAPH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Write logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract triplets from one piece of text and exit
    Run(RunArgs),
    /// Edit and submit text interactively
    Repl(ReplArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Read the text from a .txt or .md file
    #[arg(short, long, conflicts_with = "text")]
    pub input: Option<PathBuf>,

    /// The text itself
    pub text: Vec<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct ReplArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Keep a Graphviz DOT rendering of the current graph at this path
    #[arg(long)]
    pub dot: Option<PathBuf>,

    /// Directory for knowledge_graph_triplets.json
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extract: ExtractConfig,
    pub scheduler: SchedulerConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Defaults, then the config file, then flags and environment.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(endpoint) = &cli.endpoint {
            config.extract.endpoint = endpoint.clone();
        }

        config
            .scheduler
            .validate()
            .context("Invalid scheduler configuration")?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        serde_yaml::from_str(&content).context(format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kgraph.yaml");
        std::fs::write(
            &path,
            r#"
extract:
  endpoint: http://extractor:9000
scheduler:
  submit:
    num_beams: 8
    max_length: 256
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.extract.endpoint, "http://extractor:9000");
        assert_eq!(config.extract.request_timeout_secs, None);
        assert_eq!(config.scheduler.submit.num_beams, 8);
        assert_eq!(config.scheduler.warm_up, SchedulerConfig::default().warm_up);
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_endpoint_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kgraph.yaml");
        std::fs::write(&path, "extract:\n  endpoint: http://from-file:1\n").unwrap();

        let cli = Cli::try_parse_from([
            "kgraph",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "http://from-flag:2",
            "run",
            "apple is red.",
        ])
        .unwrap();

        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.extract.endpoint, "http://from-flag:2");
    }

    #[test]
    fn test_invalid_scheduler_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kgraph.yaml");
        std::fs::write(
            &path,
            "scheduler:\n  length_penalty:\n    min_length: 10\n    max_length: 5\n    min_value: 1.0\n    max_value: 2.0\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["kgraph", "--config", path.to_str().unwrap(), "repl"]).unwrap();
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from([
            "kgraph", "run", "--dot", "out.dot", "--export", "out", "apple", "is", "red.",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.text.join(" "), "apple is red.");
        assert_eq!(args.output.dot, Some(PathBuf::from("out.dot")));
        assert_eq!(args.output.export, Some(PathBuf::from("out")));
    }
}
