use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::time::Duration;
use timezone_core::{Config, Coordinates, LookupOptions, TimezoneResponse, lookup};
use tracing::{info, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "timezone", version, about = "Time zone lookup CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key and a default language.
    Configure,

    /// Show the time zone for a location.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Coordinates as "lat,lng", e.g. "43.7182713,-79.3777061".
    #[arg(allow_hyphen_values = true)]
    pub location: Coordinates,

    /// Seconds since the Unix epoch; if absent, means "now".
    #[arg(long, conflicts_with = "date")]
    pub timestamp: Option<i64>,

    /// Date/time instead of a timestamp: RFC 3339, "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DD" (UTC).
    #[arg(long)]
    pub date: Option<String>,

    /// Language of the returned names; overrides the configured default.
    #[arg(long)]
    pub language: Option<String>,

    /// API key; overrides the configured key.
    #[arg(long)]
    pub key: Option<String>,

    /// Print the raw JSON response.
    #[arg(long)]
    pub json: bool,

    /// Give up after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show(args) => show(args).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Google API key (leave empty to keep the current one):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let mut language_prompt = Text::new("Default language (e.g. en, empty for none):");
    if let Some(current) = config.language.as_deref() {
        language_prompt = language_prompt.with_initial_value(current);
    }
    let language = language_prompt.prompt().context("Failed to read language")?;

    if !api_key.trim().is_empty() {
        config.set_api_key(&api_key);
    }
    config.set_language(&language);

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

async fn show(args: ShowArgs) -> Result<()> {
    let timestamp = match (args.timestamp, args.date.as_deref()) {
        (Some(ts), _) => ts,
        (None, Some(date)) => parse_when(date)?.timestamp(),
        (None, None) => Utc::now().timestamp(),
    };

    let config = Config::load()?;
    let options = config.apply_defaults(LookupOptions {
        key: args.key,
        language: args.language,
        ..LookupOptions::at(args.location).timestamp(timestamp)
    });

    if options.key.is_none() {
        warn!("No API key configured; run `timezone configure` or pass --key");
    }

    info!(location = %args.location, timestamp, "Looking up time zone");
    let request = lookup(&options, None);
    let res = match args.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), request)
            .await
            .map_err(|_| anyhow!("Time zone lookup timed out after {secs}s"))?,
        None => request.await,
    }
    .context("Time zone lookup failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(res.as_json())?);
        return Ok(());
    }

    if !res.is_ok() {
        return Err(anyhow!(
            "Time zone service returned {}: {}",
            res.status().unwrap_or("no status"),
            res.error_message().unwrap_or("no error message"),
        ));
    }

    println!("{}", format_summary(&args.location, &res, timestamp));
    Ok(())
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DD`; naive values are UTC.
fn parse_when(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(ndt.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
        .ok_or_else(|| {
            anyhow!(
                "Unrecognized date '{input}'. Use RFC 3339, 'YYYY-MM-DD HH:MM[:SS]' or 'YYYY-MM-DD'."
            )
        })
}

fn format_summary(location: &Coordinates, res: &TimezoneResponse, timestamp: i64) -> String {
    let mut lines = vec![format!("Location:   {location}")];

    lines.push(format!(
        "Time zone:  {} ({})",
        res.time_zone_id().unwrap_or("unknown"),
        res.time_zone_name().unwrap_or("unnamed"),
    ));

    if let Some(offset) = res.utc_offset() {
        lines.push(format!(
            "UTC offset: {offset} (raw {}, DST {})",
            format_offset(res.raw_offset().unwrap_or(0)),
            format_offset(res.dst_offset().unwrap_or(0)),
        ));
    }

    if let Some(local) = res.local_time(timestamp) {
        lines.push(format!("Local time: {}", local.format("%Y-%m-%d %H:%M:%S %:z")));
    }

    lines.join("\n")
}

fn format_offset(seconds: i64) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}
