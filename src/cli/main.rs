use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;

#[derive(Parser)]
#[command(name = "wip-cli")]
#[command(about = "Waste Incident Platform CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "WIP_ENDPOINT", default_value = "http://localhost:8000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a waste incident
    Report {
        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        location: String,

        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<f64>,
    },

    /// List incidents
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short = 's', long, default_value = "20")]
        page_size: u32,

        #[arg(short, long)]
        waste_type: Option<String>,

        #[arg(short, long)]
        location: Option<String>,
    },

    /// Get incident details
    Get {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },

    /// Delete an incident
    Delete {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },

    /// Semantic search over incident descriptions
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(short, long, default_value = "0.7")]
        threshold: f32,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Dashboard summary or the generated admin summary
    Summary {
        /// Print the natural-language admin summary instead
        #[arg(short, long)]
        admin: bool,

        /// Window in days; the admin summary defaults to 7, the plain
        /// summary to all incidents
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Classify a description without storing it
    Classify {
        #[arg(value_name = "DESCRIPTION")]
        description: String,
    },

    /// Check server health
    Health,
}

/// Print a JSON body, or fail with the server's error message
async fn print_json(response: Response) -> Result<()> {
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("server returned a non-JSON body")?;

    if !status.is_success() {
        let message = body["error"]["message"].as_str().unwrap_or("request failed");
        bail!("{} ({})", message, status);
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// Endpoint and query for the summary command
fn summary_request(
    admin: bool,
    days: Option<u32>,
    now: DateTime<Utc>,
) -> (&'static str, Vec<(&'static str, String)>) {
    if admin {
        let days = days.unwrap_or(7);
        return ("/api/analytics/admin-summary", vec![("days", days.to_string())]);
    }

    let query = days
        .map(|days| {
            let start = now - Duration::days(i64::from(days));
            vec![("start_date", start.to_rfc3339_opts(SecondsFormat::Secs, true))]
        })
        .unwrap_or_default();
    ("/api/analytics/summary", query)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base = cli.endpoint.trim_end_matches('/');

    match cli.command {
        Commands::Report {
            description,
            location,
            latitude,
            longitude,
        } => {
            let response = client
                .post(format!("{}/api/incidents", base))
                .json(&json!({
                    "description": description,
                    "location": location,
                    "latitude": latitude,
                    "longitude": longitude,
                }))
                .send()
                .await
                .context("failed to reach server")?;

            print_json(response).await?;
        }

        Commands::List {
            page,
            page_size,
            waste_type,
            location,
        } => {
            let mut query = vec![
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
            ];
            if let Some(waste_type) = waste_type {
                query.push(("waste_type", waste_type));
            }
            if let Some(location) = location {
                query.push(("location", location));
            }

            let response = client
                .get(format!("{}/api/incidents", base))
                .query(&query)
                .send()
                .await
                .context("failed to reach server")?;

            print_json(response).await?;
        }

        Commands::Get { id } => {
            let response = client
                .get(format!("{}/api/incidents/{}", base, id))
                .send()
                .await
                .context("failed to reach server")?;

            print_json(response).await?;
        }

        Commands::Delete { id } => {
            let response = client
                .delete(format!("{}/api/incidents/{}", base, id))
                .send()
                .await
                .context("failed to reach server")?;

            if response.status() == StatusCode::NO_CONTENT {
                println!("Deleted incident {}", id);
            } else {
                print_json(response).await?;
            }
        }

        Commands::Search {
            query,
            threshold,
            limit,
        } => {
            let response = client
                .get(format!("{}/api/incidents/search/semantic", base))
                .query(&[
                    ("query", query),
                    ("threshold", threshold.to_string()),
                    ("limit", limit.to_string()),
                ])
                .send()
                .await
                .context("failed to reach server")?;

            print_json(response).await?;
        }

        Commands::Summary { admin, days } => {
            let (path, query) = summary_request(admin, days, Utc::now());
            let response = client
                .get(format!("{}{}", base, path))
                .query(&query)
                .send()
                .await
                .context("failed to reach server")?;
            print_json(response).await?;
        }

        Commands::Classify { description } => {
            let response = client
                .post(format!("{}/api/ai/classify", base))
                .json(&json!({ "description": description }))
                .send()
                .await
                .context("failed to reach server")?;

            print_json(response).await?;
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", base))
                .send()
                .await
                .context("failed to reach server")?;

            print_json(response).await?;
        }
    }

    Ok(())
}
