use crate::error::{ContribError, Result};
use crate::model::AggregationTable;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Serialization chosen from the output target's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Toml,
    Json,
    /// Only the last committed tally survives.
    Csv,
    /// Debug dump, not meant for machines.
    Fallback,
}

impl OutputFormat {
    pub fn from_token(token: &str) -> Self {
        match token {
            "toml" => OutputFormat::Toml,
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Fallback,
        }
    }

    /// `None` is standard output.
    pub fn from_target(target: Option<&Path>) -> Self {
        match target {
            Some(path) => Self::from_token(&target_token(path)),
            None => OutputFormat::Fallback,
        }
    }
}

/// Text after the last `.` of the target path, or the whole path.
pub fn target_token(path: &Path) -> String {
    let text = path.to_string_lossy();
    text.rsplit('.').next().unwrap_or(&text).to_string()
}

/// Non-fatal warnings about the chosen output target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    CsvKeepsLastOnly,
    UnsupportedFormat(String),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::CsvKeepsLastOnly => {
                write!(f, "only the last 'stats' will make it to the output!")
            }
            Advisory::UnsupportedFormat(token) => write!(
                f,
                "unsupported filetype '{token}', you will get a debug dump output!"
            ),
        }
    }
}

/// Checks run before any data is collected. Writing to stdout never warns.
pub fn preflight(target: Option<&Path>, job_count: usize) -> Vec<Advisory> {
    let Some(path) = target else {
        return Vec::new();
    };

    let token = target_token(path);
    match OutputFormat::from_token(&token) {
        OutputFormat::Csv if job_count > 1 => vec![Advisory::CsvKeepsLastOnly],
        OutputFormat::Fallback => vec![Advisory::UnsupportedFormat(token)],
        _ => Vec::new(),
    }
}

pub fn encode(table: &AggregationTable, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Toml => Ok(toml::to_string(table)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(table)?),
        OutputFormat::Csv => encode_csv(table),
        OutputFormat::Fallback => Ok(format!("{table:?}")),
    }
}

fn encode_csv(table: &AggregationTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["user", "contrib"])?;

    if let Some(tally) = table.last_tally() {
        for (user, contrib) in tally.iter() {
            writer.write_record([user, contrib.to_string().as_str()])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ContribError::Encode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ContribError::Encode(e.to_string()))
}

pub fn write_output<W: Write>(out: &mut W, table: &AggregationTable, format: OutputFormat) -> Result<()> {
    let text = encode(table, format)?;
    out.write_all(text.as_bytes()).map_err(ContribError::OutputWrite)?;
    if !text.ends_with('\n') {
        writeln!(out).map_err(ContribError::OutputWrite)?;
    }
    out.flush().map_err(ContribError::OutputWrite)
}
