use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the Pillar Gateway", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, env = "GATEWAY_ADMIN_KEY", default_value = "")]
    key: String,

    /// Gateway base URL, used by `call`.
    #[arg(short, long, default_value = "http://localhost:8080")]
    gateway: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List registered routes
    Routes {
        #[arg(long)]
        pillar: Option<String>,
        /// active, deprecated or maintenance
        #[arg(long)]
        status: Option<String>,
    },
    /// View per-route request statistics
    Stats,
    /// Clear all request statistics
    ResetStats,
    /// Per-pillar health summary
    Health,
    /// Send one request through the gateway, e.g. `call POST /api/content/upload-file`
    Call {
        method: String,
        endpoint: String,
        /// JSON object sent as the request body
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let admin = |path: &str| {
        client
            .get(format!("{}{}", cli.url, path))
            .headers(headers.clone())
    };

    match cli.command {
        Commands::Status => print_response(admin("/admin/status").send().await?).await?,
        Commands::Routes { pillar, status } => {
            let mut query = Vec::new();
            if let Some(p) = pillar {
                query.push(("pillar", p));
            }
            if let Some(s) = status {
                query.push(("status", s));
            }
            print_response(admin("/admin/routes").query(&query).send().await?).await?
        }
        Commands::Stats => print_response(admin("/admin/stats").send().await?).await?,
        Commands::ResetStats => {
            let res = client
                .post(format!("{}/admin/stats/reset", cli.url))
                .headers(headers.clone())
                .send()
                .await?;
            print_response(res).await?
        }
        Commands::Health => print_response(admin("/admin/health").send().await?).await?,
        Commands::Call {
            method,
            endpoint,
            data,
        } => {
            let method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let body: Value = match data {
                Some(text) => serde_json::from_str(&text)?,
                None => Value::Object(Default::default()),
            };
            let res = client
                .request(method, format!("{}{}", cli.gateway, endpoint))
                .json(&body)
                .send()
                .await?;
            // Envelopes are printed whatever the status.
            let status = res.status();
            let text = res.text().await?;
            eprintln!("HTTP {}", status);
            println!("{}", render_body(&text));
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Pretty-print JSON bodies; anything else is shown as received.
fn render_body(text: &str) -> String {
    if text.trim().is_empty() {
        return "(empty body)".to_string();
    }
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_body() {
        assert_eq!(render_body(""), "(empty body)");
        assert_eq!(render_body("Bad Gateway"), "Bad Gateway");
        assert_eq!(render_body(r#"{"success":false}"#), "{\n  \"success\": false\n}");
    }
}
