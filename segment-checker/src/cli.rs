use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use config::Configuration;
use log::info;
use model::SegmentTask;

use crate::{
    checker::{Checker, SegmentChecker},
    snapshot::ClusterSnapshot,
};

#[derive(Debug, Parser, Clone)]
#[command(author, about, version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Path to the cluster snapshot in YAML format.
    #[arg(long, env = "SC_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Path to the configuration file in YAML format.
    ///
    /// Built-in defaults apply if absent.
    #[arg(long, env = "SC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the log4rs configuration file in YAML format.
    ///
    /// Logs go to stderr, filtered by `RUST_LOG`, if absent.
    #[arg(long, env = "SC_LOG_CONFIG")]
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run a single segment check pass against a cluster snapshot and print the tasks.
    Check(CheckArgs),
}

impl CheckArgs {
    pub fn init_log(&self) -> anyhow::Result<()> {
        match &self.log {
            Some(path) => ulog::init_log4rs(path),
            None => ulog::init_env_log(),
        }
    }

    pub fn create_config(&self) -> anyhow::Result<Configuration> {
        let mut configuration = match &self.config {
            Some(path) => Configuration::from_file(path)?,
            None => Configuration::default(),
        };
        configuration.check_and_apply()?;
        Ok(configuration)
    }

    pub fn run(&self) -> anyhow::Result<Vec<SegmentTask>> {
        let config = self.create_config()?;
        let snapshot = ClusterSnapshot::from_file(&self.snapshot)?;
        let checker = SegmentChecker::new(snapshot.install(config)?);
        info!("{}: {}", checker.id(), checker.description());
        Ok(checker.check())
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, io::Write};

    use clap::Parser;
    use model::{ActionType, TaskPriority, NIL_REPLICA_ID};

    use super::{Cli, Commands};

    fn sample(name: &str) -> Result<std::path::PathBuf, Box<dyn Error>> {
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")?;
        let root = std::path::Path::new(&manifest_dir)
            .parent()
            .ok_or("no workspace root")?;
        Ok(root.join("etc").join(name))
    }

    #[test]
    fn test_check_sample_snapshot() -> Result<(), Box<dyn Error>> {
        ulog::try_init_log();
        let snapshot = sample("cluster-snapshot.yaml")?;
        let config = sample("segment-checker.yaml")?;
        let cli = Cli::try_parse_from([
            "segment-checker",
            "check",
            "--snapshot",
            snapshot.to_str().ok_or("non-utf8 path")?,
            "--config",
            config.to_str().ok_or("non-utf8 path")?,
        ])?;
        let Commands::Check(args) = cli.command;
        assert!(args.log.is_none());

        let tasks = args.run()?;
        let summary: Vec<_> = tasks
            .iter()
            .map(|t| {
                (
                    t.replica_id(),
                    t.priority(),
                    t.actions()
                        .iter()
                        .map(|a| (a.ty(), a.segment_id(), a.node()))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        assert_eq!(
            vec![
                (
                    1,
                    TaskPriority::Normal,
                    vec![(ActionType::Grow, 101, 2), (ActionType::Grow, 102, 1)]
                ),
                (1, TaskPriority::Normal, vec![(ActionType::Reduce, 103, 1)]),
                (1, TaskPriority::Low, vec![(ActionType::Reduce, 100, 1)]),
                (1, TaskPriority::Normal, vec![(ActionType::Reduce, 104, 2)]),
                (
                    NIL_REPLICA_ID,
                    TaskPriority::Normal,
                    vec![(ActionType::Reduce, 700, 3)]
                ),
            ],
            summary
        );
        Ok(())
    }

    #[test]
    fn test_inactive_on_start() -> Result<(), Box<dyn Error>> {
        let mut config = tempfile::NamedTempFile::new()?;
        writeln!(config, "checker:\n  active-on-start: false")?;
        let snapshot = sample("cluster-snapshot.yaml")?;

        let cli = Cli::try_parse_from([
            "segment-checker",
            "check",
            "--snapshot",
            snapshot.to_str().ok_or("non-utf8 path")?,
            "--config",
            config.path().to_str().ok_or("non-utf8 path")?,
        ])?;
        let Commands::Check(args) = cli.command;
        assert!(args.run()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_config() -> Result<(), Box<dyn Error>> {
        let mut config = tempfile::NamedTempFile::new()?;
        writeln!(config, "checker:\n  segment-task-timeout-ms: 0")?;
        let mut snapshot = tempfile::NamedTempFile::new()?;
        writeln!(snapshot, "nodes: []")?;

        let cli = Cli::try_parse_from([
            "segment-checker",
            "check",
            "--snapshot",
            snapshot.path().to_str().ok_or("non-utf8 path")?,
            "--config",
            config.path().to_str().ok_or("non-utf8 path")?,
        ])?;
        let Commands::Check(args) = cli.command;
        assert!(args.run().is_err());
        Ok(())
    }

    #[test]
    fn test_missing_snapshot() {
        assert!(Cli::try_parse_from(["segment-checker", "check"]).is_err());
    }
}
