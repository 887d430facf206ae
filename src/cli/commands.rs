use crate::app::Bounce;
use crate::config::AppConfig;
use crate::controllers::build_app;
use crate::server::RawRequest;
use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use http::{HeaderName, HeaderValue, Method};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bounce")]
#[command(about = "Inspect and call the bounce demo application", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every registered route in evaluation order
    Routes {
        /// Configuration file (YAML, or JSON by extension)
        #[arg(short, long, env = "BOUNCE_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Dispatch one request through the application
    Call {
        /// HTTP method, e.g. GET
        method: String,
        /// Request target, path plus optional query string
        uri: String,
        /// Request body
        #[arg(short, long)]
        body: Option<String>,
        /// Extra header as `name:value`, repeatable
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(HeaderName, HeaderValue)>,
        /// Configuration file (YAML, or JSON by extension)
        #[arg(short, long, env = "BOUNCE_CONFIG")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    /// Configuration file named on the command line, if any.
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Routes { config } | Commands::Call { config, .. } => config.as_deref(),
        }
    }
}

/// Parse a `name:value` header argument.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got '{raw}'"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| format!("invalid header name '{}': {e}", name.trim()))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| format!("invalid header value for '{name}': {e}"))?;
    Ok((name, value))
}

pub async fn run_cli(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let app = build_app(config).await?;
    match cli.command {
        Commands::Routes { .. } => {
            print_routes(&app);
        }
        Commands::Call {
            method,
            uri,
            body,
            headers,
            ..
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method '{method}'"))?;
            let body = body.map(Bytes::from).unwrap_or_default();
            let request = headers
                .into_iter()
                .fold(RawRequest::new(method, &uri, body), |req, (name, value)| {
                    req.with_header(name, value)
                });
            let response = app.dispatch(request).await;
            println!("{}", response.status());
            for (name, value) in response.headers() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            let body = response.body();
            if !body.is_empty() {
                println!();
                println!("{}", String::from_utf8_lossy(body));
            }
        }
    }
    Ok(())
}

fn print_routes(app: &Bounce) {
    let router = app.router();
    println!("{} routes", router.len());
    for entry in router.entries() {
        println!("  {entry}");
    }
}
