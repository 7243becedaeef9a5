use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use indietoken::cli::{self, EndpointCommands, TokenCommands};
use indietoken::config::{self, Config};
use indietoken::indieauth::fetch::HttpFetcher;
use indietoken::indieauth::markup::HtmlLinkExtractor;
use indietoken::indieauth::trust::TRUSTED_ENDPOINT_KEY;
use indietoken::indieauth::validate::is_valid_url;
use indietoken::store::postgres::PgStore;
use indietoken::store::{tokens, SettingsRepository};
use indietoken::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    // Export spans over OTLP only when a collector is configured
    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "indietoken"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "indietoken=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Endpoint { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_endpoint_command(&db, command).await
        }
        Some(cli::Commands::Token { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_token_command(&db, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let trusted = db.list_settings(TRUSTED_ENDPOINT_KEY).await?;
    if trusted.is_empty() {
        tracing::warn!("No trusted authorization endpoints configured; every token request will be rejected");
    } else {
        tracing::info!(count = trusted.len(), "Loaded trusted authorization endpoints");
    }

    let fetcher = HttpFetcher::new(&cfg)?;
    let db = Arc::new(db);
    let state = Arc::new(AppState {
        tokens: db.clone(),
        settings: db,
        fetcher: Arc::new(fetcher),
        markup: Arc::new(HtmlLinkExtractor),
        config: cfg,
    });

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("indietoken listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_endpoint_command(db: &PgStore, cmd: EndpointCommands) -> anyhow::Result<()> {
    match cmd {
        EndpointCommands::Add { url } => {
            if !is_valid_url(&url) {
                anyhow::bail!("not an absolute URL: {}", url);
            }
            if db.add_setting(TRUSTED_ENDPOINT_KEY, &url).await? {
                println!("✅ Trusted {}", url);
            } else {
                println!("{} is already trusted", url);
            }
        }
        EndpointCommands::List => {
            let endpoints = db.list_settings(TRUSTED_ENDPOINT_KEY).await?;
            if endpoints.is_empty() {
                println!("No trusted endpoints.");
            }
            for url in endpoints {
                println!("{}", url);
            }
        }
        EndpointCommands::Remove { url } => {
            if db.remove_setting(TRUSTED_ENDPOINT_KEY, &url).await? {
                println!("Removed {}", url);
            } else {
                println!("{} was not trusted", url);
            }
        }
    }
    Ok(())
}

async fn handle_token_command(db: &PgStore, cmd: TokenCommands) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Show { value } => match tokens::lookup(db, &value).await? {
            Some(token) => {
                println!("me:        {}", token.me);
                println!("client_id: {}", token.client_id);
                println!("scope:     {}", token.scope);
                println!("issued:    {}", token.created_at.to_rfc3339());
                match token.revoked_at {
                    Some(at) => println!("revoked:   {}", at.to_rfc3339()),
                    None => println!("revoked:   no"),
                }
            }
            None => anyhow::bail!("no such token"),
        },
        TokenCommands::Revoke { value } => {
            tokens::revoke(db, &value).await?;
            println!("Revoked (if it existed)");
        }
    }
    Ok(())
}
