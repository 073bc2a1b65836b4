use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use crudgate::{
    application::{
        error::AppError,
        query::{FilterCompiler, OperatorTable, PagingPolicy, QueryParams, explain},
        reads::ReadService,
        repos::StorageRepo,
        serializer::{JsonEnvelopeSerializer, ResponseSerializer},
    },
    cache::{CacheConfig, FailOpenCache},
    config,
    domain::catalog,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Explain(args) => run_explain(settings, args),
    }
}

fn build_compiler(settings: &config::Settings) -> FilterCompiler {
    FilterCompiler::new(
        OperatorTable::standard(),
        PagingPolicy::from(&settings.query),
    )
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(InfraError::from)?;
    let storage: Arc<dyn StorageRepo> = Arc::new(PostgresRepositories::new(pool));

    let catalog = Arc::new(catalog::builtin()?);
    let cache_config = CacheConfig::from(&settings.cache);
    let serializer: Arc<dyn ResponseSerializer> = Arc::new(JsonEnvelopeSerializer);

    info!(
        target = "crudgate::serve",
        tables = ?catalog.tables(),
        cache_enabled = cache_config.enabled,
        cache_capacity = cache_config.capacity,
        "Starting read gateway"
    );

    let reads = ReadService::new(
        catalog,
        build_compiler(&settings),
        storage,
        FailOpenCache::new(cache_config.build_store()),
        serializer,
    );

    serve_http(&settings.server, HttpState::new(reads)).await
}

fn run_explain(settings: config::Settings, args: config::ExplainArgs) -> Result<(), AppError> {
    let catalog = catalog::builtin()?;
    let entity = catalog
        .get(&args.table)
        .ok_or_else(|| AppError::validation(format!("unknown table `{}`", args.table)))?;

    let explanation = explain(
        &build_compiler(&settings),
        &entity,
        &QueryParams::parse(&args.query),
    )?;

    let rendered = serde_json::to_string_pretty(&explanation)
        .map_err(|err| AppError::unexpected(format!("failed to render explanation: {err}")))?;
    println!("{rendered}");
    Ok(())
}

async fn serve_http(server: &config::ServerSettings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .map_err(|err| InfraError::bind(server.addr, err))?;

    info!(target = "crudgate::serve", addr = %server.addr, "Listening");

    let serve = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => {
            result.map_err(InfraError::from)?;
        }
        _ = shutdown_deadline(server.graceful_shutdown) => {
            warn!(
                target = "crudgate::serve",
                grace_seconds = server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "crudgate::serve", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn shutdown_deadline(grace: Duration) {
    shutdown_signal().await;
    tokio::time::sleep(grace).await;
}
