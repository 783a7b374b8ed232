//! flipwatch - Entry Point

use clap::Parser;
use flipwatch::config::{
    apply_cli_overrides, apply_env_overrides, load_config_with_precedence, merge_config,
    CliOverrides, ResolvedConfig,
};
use flipwatch::model::error::AppError;
use flipwatch::replay::{parse_script, run_replay};
use flipwatch::sink::JsonlSink;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// flipwatch - replay memory-match play scripts through the analytics hooks
#[derive(Parser, Debug)]
#[command(name = "flipwatch")]
#[command(version)]
#[command(about = "Replay a JSONL play script and emit every analytics sink call as JSON Lines")]
pub struct Args {
    /// Path to JSONL play script (`-` reads stdin)
    pub script: PathBuf,

    /// Write sink calls to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// App name announced to the sink
    #[arg(long)]
    pub app_name: Option<String>,

    /// Notification text that marks a level timeout
    #[arg(long)]
    pub timeout_marker: Option<String>,
}

impl Args {
    fn cli_overrides(&self) -> CliOverrides {
        CliOverrides {
            app_name: self.app_name.clone(),
            timeout_marker: self.timeout_marker.clone(),
        }
    }

    fn reads_stdin(&self) -> bool {
        self.script.as_os_str() == "-"
    }
}

/// Defaults → Config File → Env Vars → CLI Args
fn resolve_config(args: &Args) -> Result<ResolvedConfig, AppError> {
    let config_file = load_config_with_precedence(args.config.clone())?;
    let merged = merge_config(config_file);
    let with_env = apply_env_overrides(merged);
    Ok(apply_cli_overrides(with_env, args.cli_overrides()))
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    let config = resolve_config(&args)?;

    flipwatch::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let steps = if args.reads_stdin() {
        parse_script(io::stdin().lock())?
    } else {
        parse_script(BufReader::new(File::open(&args.script)?))?
    };

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let summary = run_replay(&steps, &config, Box::new(JsonlSink::new(writer)))?;

    info!(
        session_id = %summary.session_id,
        skipped_hooks = ?summary.hooks_skipped,
        "Replay complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["flipwatch", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["flipwatch", "--version"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_script_is_required() {
        let result = Args::try_parse_from(["flipwatch"]);
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_script_only_defaults() {
        let args = Args::parse_from(["flipwatch", "play.jsonl"]);
        assert_eq!(args.script, PathBuf::from("play.jsonl"));
        assert_eq!(args.output, None);
        assert_eq!(args.config, None);
        assert_eq!(args.cli_overrides(), CliOverrides::default());
        assert!(!args.reads_stdin());
    }

    #[test]
    fn test_dash_reads_stdin() {
        let args = Args::parse_from(["flipwatch", "-"]);
        assert!(args.reads_stdin());
    }

    #[test]
    fn test_output_short_and_long() {
        let short = Args::parse_from(["flipwatch", "s.jsonl", "-o", "out.jsonl"]);
        let long = Args::parse_from(["flipwatch", "s.jsonl", "--output", "out.jsonl"]);
        assert_eq!(short.output, Some(PathBuf::from("out.jsonl")));
        assert_eq!(long.output, short.output);
    }

    #[test]
    fn test_overrides_flow_through_precedence_chain() {
        use flipwatch::config::ConfigFile;

        let args = Args::parse_from([
            "flipwatch",
            "s.jsonl",
            "--timeout-marker",
            "Buzzer",
        ]);
        let merged = merge_config(Some(ConfigFile {
            app_name: Some("from-file".to_string()),
            timeout_marker: Some("Out of time".to_string()),
            ..ConfigFile::default()
        }));

        let resolved = apply_cli_overrides(merged, args.cli_overrides());

        assert_eq!(resolved.app_name, "from-file");
        assert_eq!(resolved.timeout_marker, "Buzzer");
    }
}
