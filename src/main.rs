//! `mpa-plan`: print or write the bundler configuration for a multi-page site.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use mpa_planner::{ConfigurationBuilder, Mode, ProjectConfig, write_configuration};

#[derive(Debug, Parser)]
#[command(name = "mpa-plan", version, about = "Derive the bundler configuration of a multi-page site")]
struct Cli {
  /// Build mode.
  #[arg(short, long, value_enum, default_value_t = Mode::Development)]
  mode: Mode,

  /// Project root directory.
  #[arg(short, long, default_value = ".")]
  root: PathBuf,

  /// Project configuration file; defaults to `mpa.config.{json,yaml,yml}` under the root.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Write the configuration here instead of printing it.
  #[arg(short, long)]
  out: Option<PathBuf>,

  /// Increase log verbosity (-v, -vv).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn init_logger(verbose: u8) {
  let level = match verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    _ => LevelFilter::Debug,
  };
  env_logger::Builder::new()
    .filter_level(level)
    .parse_default_env()
    .format_timestamp(None)
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logger(cli.verbose);

  let config = match &cli.config {
    Some(path) => ProjectConfig::from_path(path),
    None => ProjectConfig::discover(&cli.root),
  }
  .context("failed to load project configuration")?;

  let builder = ConfigurationBuilder::new(&cli.root, config);
  let lint = builder.configured_lint()?;
  let configuration = builder
    .build(cli.mode, &lint)
    .with_context(|| format!("failed to plan {} build", cli.mode))?;

  match &cli.out {
    Some(path) => write_configuration(&configuration, path)?,
    None => {
      let json = configuration
        .to_json()
        .context("failed to render build configuration")?;
      let mut stdout = std::io::stdout().lock();
      writeln!(stdout, "{json}").context("failed to write to stdout")?;
    }
  }

  Ok(())
}
