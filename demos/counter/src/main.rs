//! expose counter demo
//!
//! Commands:
//! - `expose-counter spec` - Print the OpenAPI document
//! - `expose-counter routes` - List the mounted endpoints
//! - `expose-counter call` - Invoke an endpoint with a JSON body

use std::sync::Arc;
use std::sync::atomic::AtomicI32;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use expose::prelude::*;
use expose::{ErrorBody, JSON_CONTENT_TYPE, logging};

mod app;

#[derive(Parser)]
#[command(name = "expose-counter")]
#[command(author, version, about = "Counter endpoints exposed with expose", long_about = None)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level, overrides the config
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the OpenAPI document
    Spec {
        /// Pretty print the document
        #[arg(short, long)]
        pretty: bool,
    },

    /// List the mounted endpoints
    Routes,

    /// Invoke an endpoint
    Call {
        /// Endpoint path, with or without the configured prefix
        path: String,

        /// JSON request body
        #[arg(short, long, default_value = "null")]
        body: String,

        /// Counter value before the call
        #[arg(long, default_value_t = 0)]
        start: i32,
    },
}

fn load_config(path: Option<&str>) -> anyhow::Result<ExposeConfig> {
    let Some(path) = path else {
        return Ok(ExposeConfig {
            path_prefix: "/rpc".to_string(),
            ..ExposeConfig::default()
        });
    };
    let bytes = std::fs::read(path).with_context(|| format!("failed to read config {path}"))?;
    ExposeConfig::from_json(&bytes).with_context(|| format!("invalid config {path}"))
}

fn build_handler(config: ExposeConfig, start: i32) -> anyhow::Result<Handler> {
    let counter = Arc::new(AtomicI32::new(start));

    let mut functions = app::functions(&counter);
    functions.extend(discover(
        "/app",
        Arc::new(app::Application::new(&counter)),
        FunctionSettings::new(),
    )?);

    let template = OpenApi::new("Counter Example", env!("CARGO_PKG_VERSION"));
    let options = HandlerOptions::new()
        .with_config(config)
        .with_template(template);
    Ok(Handler::new(functions, options)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    logging::init_logging_from_config(&config);

    match cli.command {
        Commands::Spec { pretty } => {
            let handler = build_handler(config, 0)?;
            let spec = handler.spec();
            let json = if pretty {
                serde_json::to_string_pretty(spec)?
            } else {
                serde_json::to_string(spec)?
            };
            println!("{json}");
        }
        Commands::Routes => {
            let handler = build_handler(config, 0)?;
            println!("{}", handler.spec_path());
            for function in handler.functions() {
                println!(
                    "{}\t{}",
                    handler.config().mount(function.path()),
                    function.operation_id()
                );
            }
        }
        Commands::Call { path, body, start } => {
            let handler = build_handler(config, start)?;
            let ctx = Context::new(1, path.as_str());
            match handler
                .call(&path, ctx, Some(JSON_CONTENT_TYPE), None, body.as_bytes())
                .await
            {
                Ok(reply) if reply.body.is_empty() => println!("ok"),
                Ok(reply) => println!("{}", String::from_utf8_lossy(&reply.body)),
                Err(err) => {
                    let reply = handler.error_reply(&err, None);
                    anyhow::bail!(
                        "{} {}",
                        ErrorBody::status(&err),
                        String::from_utf8_lossy(&reply.body)
                    );
                }
            }
        }
    }

    Ok(())
}
