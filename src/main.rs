use std::{process, sync::Arc, time::Duration};

use todo_api::{
    application::{
        error::AppError,
        repos::{HealthRepo, TodoItemsRepo, UsersRepo},
        todos::TodoItemService,
    },
    config,
    infra::{
        cache::build_view_cache,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState, TokenVerifier},
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
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let secret = settings
        .auth
        .jwt_secret
        .as_deref()
        .ok_or_else(|| InfraError::configuration("auth.jwt_secret is not configured"))?;

    let repositories = init_repositories(&settings).await?;
    let cache = build_view_cache(&settings.cache).await?;

    let todos_repo: Arc<dyn TodoItemsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let state = HttpState {
        todos: Arc::new(TodoItemService::new(todos_repo, users_repo, cache)),
        tokens: Arc::new(TokenVerifier::new(secret, &settings.auth)),
        health: health_repo,
    };

    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = database_url(&settings)?;
    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "todo_api::migrate", "migrations applied");
    Ok(())
}

fn database_url(settings: &config::Settings) -> Result<&str, AppError> {
    settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = database_url(settings)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "todo_api::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "todo_api::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "todo_api::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        target = "todo_api::serve",
        grace_seconds = grace.as_secs(),
        "shutdown signal received, draining connections"
    );

    // Force exit if draining exceeds the configured grace period.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "todo_api::serve", "graceful shutdown timed out");
        process::exit(1);
    });
}
