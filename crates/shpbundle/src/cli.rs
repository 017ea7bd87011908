//! Command-line host reading a file list and printing bundles.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::bundle::bundle_shapefiles;
use crate::app::io::{InputFormat, OutputFormat, decode_files, render_output};
use crate::infra::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "shpbundle",
    author,
    version,
    about = "Group shapefile sidecars into per-dataset file objects",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// File list to read; stdin when omitted or `-`.
    pub input: Option<PathBuf>,

    /// Format of the incoming file list.
    #[arg(long, value_enum)]
    pub input_format: Option<InputFormat>,

    /// Format of the printed result.
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Indent JSON output.
    #[arg(long, conflicts_with = "compact")]
    pub pretty: bool,

    /// Print JSON output on a single line.
    #[arg(long)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings for one bundling run after flags and config are combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub input: Option<PathBuf>,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
    pub pretty: bool,
}

impl RunOptions {
    /// Flags win, then the input file's extension, then configuration.
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        let input = cli
            .input
            .clone()
            .filter(|path| path.as_os_str() != "-");
        let input_format = cli
            .input_format
            .or_else(|| input.as_deref().and_then(format_from_extension))
            .unwrap_or_else(|| config.defaults.input_format());
        let pretty = if cli.pretty {
            true
        } else if cli.compact {
            false
        } else {
            config.defaults.pretty()
        };

        Self {
            input,
            input_format,
            output_format: cli
                .output_format
                .unwrap_or_else(|| config.defaults.output_format()),
            pretty,
        }
    }
}

fn format_from_extension(path: &Path) -> Option<InputFormat> {
    path.extension()?.to_str()?.parse().ok()
}

/// Parse arguments and run.
pub fn run(config: Config) -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "shpbundle", &mut io::stdout());
        return Ok(());
    }

    let options = RunOptions::resolve(&cli, &config);
    let rendered = execute(&options)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end()).context("failed to write output")?;
    Ok(())
}

/// Read, bundle, and render according to `options`.
pub fn execute(options: &RunOptions) -> Result<String> {
    let source = read_source(options.input.as_deref())?;
    let files = decode_files(&source, options.input_format)?;
    let output = bundle_shapefiles(&files);
    tracing::info!(
        input_format = %options.input_format,
        output_format = %options.output_format,
        bundles = output.len(),
        "bundled file list"
    );
    render_output(&output, options.output_format, options.pretty)
}

fn read_source(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read file list from {}", path.display())),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read file list from stdin")?;
            Ok(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shpbundle").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&["--output-format", "yaml", "--compact", "files.json"]);
        let options = RunOptions::resolve(&cli, &Config::default());
        assert_eq!(options.input, Some(PathBuf::from("files.json")));
        assert_eq!(options.input_format, InputFormat::Json);
        assert_eq!(options.output_format, OutputFormat::Yaml);
        assert!(!options.pretty);
    }

    #[test]
    fn input_extension_picks_format() {
        let cli = parse(&["job.yml"]);
        let options = RunOptions::resolve(&cli, &Config::default());
        assert_eq!(options.input_format, InputFormat::Yaml);
        assert!(options.pretty);
    }

    #[test]
    fn dash_reads_stdin() {
        let cli = parse(&["-"]);
        assert_eq!(RunOptions::resolve(&cli, &Config::default()).input, None);
    }

    #[test]
    fn pretty_conflicts_with_compact() {
        let result = Cli::try_parse_from(["shpbundle", "--pretty", "--compact"]);
        assert!(result.is_err());
    }

    #[test]
    fn execute_reads_file_input() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("files.json");
        fs::write(&path, r#"[{"path": "/out/a.shp"}, {"path": "/out/a.dbf"}]"#)?;

        let options = RunOptions {
            input: Some(path),
            input_format: InputFormat::Json,
            output_format: OutputFormat::Json,
            pretty: false,
        };
        let rendered = execute(&options)?;
        assert!(rendered.starts_with(r#"{"file":{"class":"File""#));
        assert!(rendered.contains(r#""secondaryFiles":[{"path":"/out/a.dbf""#));
        Ok(())
    }

    #[test]
    fn execute_reports_missing_input() {
        let options = RunOptions {
            input: Some(PathBuf::from("/definitely/not/here.json")),
            input_format: InputFormat::Json,
            output_format: OutputFormat::Json,
            pretty: true,
        };
        let err = execute(&options).unwrap_err();
        assert!(err.to_string().contains("failed to read file list"));
    }
}
