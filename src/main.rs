use chrono::NaiveDate;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use skycast::services::validator::parse_canonical_date;
use skycast::{
    init_tracing, AppMetrics, FetchError, ForecastService, ProviderSettings,
    ResilientClientConfig, SystemClock, TelemetryConfig, WeatherCodeMappings,
};

/// Print Open-Meteo forecasts for a city
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Resilient Open-Meteo forecast lookup")]
struct Cli {
    /// City name, in any language Open-Meteo geocoding understands
    city: String,

    /// `yyyy-MM-dd` for a daily mean, `week` for seven days, `now` for current conditions
    #[arg(default_value = "week")]
    when: String,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Daily(NaiveDate),
    Weekly,
    Current,
}

impl Query {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Query::Weekly),
            "now" => Ok(Query::Current),
            other => parse_canonical_date(other)
                .map(Query::Daily)
                .ok_or_else(|| format!("Expected yyyy-MM-dd, 'week' or 'now', got '{raw}'")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    init_tracing(&TelemetryConfig::from_env())?;

    let query = Query::parse(&cli.when)?;

    let settings = ProviderSettings::from_env();
    let metrics = AppMetrics::new().map_err(|e| e.to_string())?;
    let service = ForecastService::from_settings(
        &settings,
        ResilientClientConfig::from_env(),
        &WeatherCodeMappings::from_env(),
        Arc::new(SystemClock),
        Some(&metrics),
    )?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling request");
            ctrl_c.cancel();
        }
    });

    let result = match query {
        Query::Daily(date) => service
            .daily_forecast(&cli.city, date, &cancel)
            .await
            .map(|report| render(&report, cli.json, || {
                format!(
                    "{} {}: {}, mean {:.1} °C (fetched {}{})",
                    report.city,
                    report.date,
                    report.condition,
                    report.temperature_mean,
                    report.fetched_at_local.format("%Y-%m-%d %H:%M %:z"),
                    if report.cache_hit { ", cached" } else { "" },
                )
            })),
        Query::Weekly => service
            .weekly_forecast(&cli.city, &cancel)
            .await
            .map(|report| render(&report, cli.json, || {
                let mut out = format!(
                    "{} (fetched {}{})",
                    report.city,
                    report.fetched_at_local.format("%Y-%m-%d %H:%M %:z"),
                    if report.cache_hit { ", cached" } else { "" },
                );
                for day in &report.days {
                    out.push_str(&format!(
                        "\n  {}  {:<13} {:>6.1} °C",
                        day.date,
                        day.condition.to_string(),
                        day.temperature_mean
                    ));
                }
                out
            })),
        Query::Current => service
            .current_forecast(&cli.city, &cancel)
            .await
            .map(|report| render(&report, cli.json, || {
                format!(
                    "{} now: {}, {:.1} °C (observed {})",
                    report.city,
                    report.condition,
                    report.temperature,
                    report.observed_at_local.format("%Y-%m-%d %H:%M %:z"),
                )
            })),
    };

    if let Ok(text) = metrics.render() {
        debug!(metrics = %text, "Final metrics");
    }

    match result {
        Ok(output) => {
            println!("{}", output?);
            Ok(())
        }
        Err(FetchError::Cancelled) => {
            eprintln!("Cancelled");
            std::process::exit(130);
        }
        Err(FetchError::Provider(e)) => {
            error!(code = %e.code, kind = %e.kind, error = %e, "Forecast request failed");
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}

fn render<T: serde::Serialize>(
    report: &T,
    json: bool,
    text: impl FnOnce() -> String,
) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(report)
    } else {
        Ok(text())
    }
}
