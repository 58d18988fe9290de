use crate::error::{ContribError, Result};
use crate::model::{StatJob, TimeWindow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

/// Document used when no input file is given.
pub const DEFAULT_INPUT: &str = r#"
env = ".env"

[default]

[[stats]]
label = "vencord"
repos = [ "Vendicated/Vencord" ]
filetypes = [ "ts" ]
start_date = 2024-01-01T00:00:00Z
end_date = 2024-02-01T00:00:00Z
"#;

/// Parsed input document, before any fallback is applied.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawConfig {
    pub env: Option<PathBuf>,
    #[serde(default)]
    pub default: StatSource,
    #[serde(default)]
    pub stats: Vec<StatSource>,
}

/// One raw stat table. Every field is optional; the same shape is used for
/// the shared `[default]` block.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StatSource {
    pub label: Option<String>,
    pub repos: Option<Vec<String>>,
    pub filetypes: Option<Vec<String>>,
    pub start_date: Option<toml::Value>,
    pub end_date: Option<toml::Value>,
}

impl RawConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn job_count(&self) -> usize {
        self.stats.len()
    }
}

/// Returns the first candidate that sets `field`.
pub fn try_get<'a, T: ?Sized>(
    candidates: &[&'a StatSource],
    field: impl Fn(&'a StatSource) -> Option<&'a T>,
) -> Option<&'a T> {
    candidates.iter().find_map(|source| field(*source))
}

/// Like [`try_get`], falling back to `default` when no candidate sets `field`.
pub fn try_get_or<'a, T: Clone + 'a>(
    candidates: &[&'a StatSource],
    field: impl Fn(&'a StatSource) -> Option<&'a T>,
    default: T,
) -> T {
    try_get(candidates, field).cloned().unwrap_or(default)
}

pub fn resolve_jobs(raw: &RawConfig) -> Result<Vec<StatJob>> {
    resolve_jobs_at(raw, Utc::now())
}

/// Resolves every stat table against the default block. `now` is the
/// fallback end of the time window.
pub fn resolve_jobs_at(raw: &RawConfig, now: DateTime<Utc>) -> Result<Vec<StatJob>> {
    raw.stats
        .iter()
        .map(|stat| resolve_job(&[stat, &raw.default], now))
        .collect()
}

fn resolve_job(candidates: &[&StatSource], now: DateTime<Utc>) -> Result<StatJob> {
    let label = try_get_or(candidates, |s| s.label.as_ref(), String::new());
    let repositories = try_get_or(candidates, |s| s.repos.as_ref(), Vec::new());
    let filetypes = try_get_or(candidates, |s| s.filetypes.as_ref(), Vec::new());

    let start = match try_get(candidates, |s| s.start_date.as_ref()) {
        Some(value) => parse_timestamp("start_date", value)?,
        // unix epoch
        None => DateTime::<Utc>::default(),
    };
    let end = match try_get(candidates, |s| s.end_date.as_ref()) {
        Some(value) => parse_timestamp("end_date", value)?,
        None => now,
    };

    Ok(StatJob {
        label,
        repositories,
        extensions: filetypes.into_iter().collect(),
        window: TimeWindow::new(start, end),
    })
}

fn parse_timestamp(field: &'static str, value: &toml::Value) -> Result<DateTime<Utc>> {
    let invalid = |reason: String| ContribError::ConfigValue { field, reason };

    match value {
        toml::Value::Datetime(dt) => {
            let text = dt.to_string();
            match (dt.date.is_some(), dt.time.is_some(), dt.offset.is_some()) {
                (true, true, true) => DateTime::parse_from_rfc3339(&text)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| invalid(format!("'{text}': {e}"))),
                (true, true, false) => NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|d| d.and_utc())
                    .map_err(|e| invalid(format!("'{text}': {e}"))),
                (true, false, _) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map_err(|e| invalid(format!("'{text}': {e}")))?
                    .and_hms_opt(0, 0, 0)
                    .map(|d| d.and_utc())
                    .ok_or_else(|| invalid(format!("'{text}' is out of range"))),
                _ => Err(invalid(format!("'{text}' has no date"))),
            }
        }
        toml::Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| invalid(format!("'{text}': {e}"))),
        other => Err(invalid(format!("expected a date-time, found {}", other.type_str()))),
    }
}
