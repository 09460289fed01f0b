//! Logging bootstrap shared by the checker binary and tests.
//!
//! Every crate logs through the `log` facade; this crate only decides where records go.

#[cfg(feature = "env")]
use std::io::Write;

#[cfg(feature = "env")]
fn format(buf: &mut env_logger::fmt::Formatter, record: &log::Record) -> std::io::Result<()> {
    writeln!(
        buf,
        "{}:{} {} [{}] - {}",
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.level(),
        record.args()
    )
}

/// Install a test-friendly logger. Safe to call from every test.
#[cfg(feature = "env")]
pub fn try_init_log() {
    let _ = env_logger::builder()
        .is_test(true)
        .format(format)
        .try_init();
}

/// Install a logger writing to stderr, filtered by `RUST_LOG` and defaulting to `info`.
#[cfg(feature = "env")]
pub fn init_env_log() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(format)
        .try_init()?;
    Ok(())
}

/// Install log4rs from the given YAML configuration file.
#[cfg(feature = "file")]
pub fn init_log4rs<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Log configuration file {} does not exist", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("{} is not a file", path.display());
    }

    log4rs::init_file(path, Default::default())?;
    log::info!("Log initialized from {}", path.display());
    Ok(())
}
