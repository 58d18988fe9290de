use crate::cancel::CancelToken;
use crate::config::{resolve_jobs, RawConfig, DEFAULT_INPUT};
use crate::error::ContribError;
use crate::export::{preflight, write_output, OutputFormat};
use crate::remote::GitHubClient;
use crate::report::Reporter;
use crate::run::run_jobs;
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const TOKEN_VAR: &str = "GITHUB_AUTH_TOKEN";

#[derive(Parser)]
#[command(name = "contrib-stats")]
#[command(about = "Per-author changed-line totals across GitHub repositories")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, help = "Do not output verbose information")]
    pub silent: bool,

    #[arg(
        short,
        long,
        default_value = "-",
        help = "Input toml file (or the built-in default if '-')"
    )]
    pub input: PathBuf,

    #[arg(
        short,
        long,
        default_value = "-",
        help = "Output file, format chosen by extension (or stdout if '-')"
    )]
    pub output: PathBuf,
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    fn output_target(&self) -> Option<&Path> {
        (!is_stdio(&self.output)).then_some(self.output.as_path())
    }

    pub fn execute(self) -> Result<()> {
        let reporter = Reporter::new(self.silent);
        let started = Instant::now();

        let input = self.read_input(&reporter)?;
        let mut output = self.open_output()?;

        let raw = RawConfig::from_toml(&input).context("Failed to parse input document")?;
        let jobs = resolve_jobs(&raw).context("Failed to resolve stat groups")?;

        let target = self.output_target();
        for advisory in preflight(target, raw.job_count()) {
            reporter.warn(advisory);
        }

        if let Some(env_path) = &raw.env {
            if let Err(e) = dotenvy::from_path(env_path) {
                reporter.warn(format_args!("could not load env file {}: {e}", env_path.display()));
            }
        }

        let client = GitHubClient::new(std::env::var(TOKEN_VAR).ok());
        if !client.is_authenticated() {
            reporter.warn("using no api token is not recommended, you will get ratelimited!");
        }

        let cancel = CancelToken::new();
        if let Err(e) = cancel.install_interrupt_handler(move || reporter.interrupted()) {
            reporter.warn(format_args!("could not install interrupt handler: {e}"));
        }

        reporter.starting();
        let table = match run_jobs(&jobs, &client, &reporter, &cancel) {
            Ok(table) => table,
            Err(ContribError::Interrupted) => {
                reporter.interrupted();
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to collect contribution stats"),
        };
        reporter.done(&table, started.elapsed());

        write_output(&mut output, &table, OutputFormat::from_target(target))
            .context("Failed to write output")?;
        Ok(())
    }

    fn read_input(&self, reporter: &Reporter) -> Result<String> {
        if is_stdio(&self.input) {
            reporter.warn("no input file provided, using default!");
            return Ok(DEFAULT_INPUT.to_string());
        }
        std::fs::read_to_string(&self.input)
            .map_err(|source| ContribError::InputOpen {
                path: self.input.clone(),
                source,
            })
            .context("Failed to read input")
    }

    fn open_output(&self) -> Result<Box<dyn Write>> {
        if is_stdio(&self.output) {
            return Ok(Box::new(io::stdout().lock()));
        }
        let file = File::create(&self.output)
            .map_err(|source| ContribError::OutputOpen {
                path: self.output.clone(),
                source,
            })
            .context("Failed to open output")?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Exit status for a failed run, taken from the first [`ContribError`] in
/// the chain.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ContribError>())
        .map(ContribError::exit_code)
        .unwrap_or(1)
}
