//! tiffin-server

use anyhow::{anyhow, Result};
use axum::{headers::HeaderName, routing::get, Router};
use axum_server::Handle;
use clap::{Parser, ValueEnum};
use http::header;
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;
use retry_policies::policies::ExponentialBackoffBuilder;
use std::{
    future::ready,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    process::exit,
    time::Duration,
};
use tiffin_core::VerificationFlow;
use tiffin_server::{
    app_state::{AppState, AppStateBuilder},
    credentials::CredentialIssuer,
    db,
    docs::ApiDoc,
    metrics::setup_metrics_recorder,
    middleware::{request_ulid::MakeRequestUlid, runtime},
    router,
    routes::fallback::notfound_404,
    settings::{AppEnvironment, LogFormat, Settings},
    setups::{
        local::{InMemoryAccountStore, LocalSetup, LogCodeSender},
        prod::{EmailVerificationCodeSender, PgAccountStore, ProdSetup},
        ServerSetup,
    },
};
use tokio::signal::{
    self,
    unix::{signal, SignalKind},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, sensitive_headers::SetSensitiveHeadersLayer,
    timeout::TimeoutLayer, ServiceBuilderExt,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Request identifier field.
const REQUEST_ID: &str = "request_id";

/// Which collaborators to run the server with
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SetupKind {
    /// In-memory accounts, passcodes written to the log
    Local,
    /// Postgres accounts, passcodes sent with mailgun
    Prod,
}

/// tiffin-server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the settings file. Defaults to the bundled `config/settings.toml`.
    #[arg(long)]
    config_path: Option<PathBuf>,
    /// Override the setup picked from `server.environment`
    #[arg(long, value_enum)]
    setup: Option<SetupKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config_path)?;

    let (stdout_writer, _stdout_guard) = tracing_appender::non_blocking(io::stdout());
    setup_tracing(stdout_writer, settings.server.log_format);

    info!(
        subject = "app_settings",
        category = "init",
        "starting with settings: {:?}",
        settings,
    );

    let recorder_handle = setup_metrics_recorder()?;
    let cancellation_token = CancellationToken::new();

    let metrics_server = tokio::spawn(serve_metrics(
        recorder_handle,
        settings.server.metrics_port,
        cancellation_token.clone(),
    ));

    let setup = args
        .setup
        .unwrap_or(match settings.server.environment {
            AppEnvironment::Local => SetupKind::Local,
            _ => SetupKind::Prod,
        });

    info!(subject = "app_start", category = "init", ?setup, "Selected server setup");

    let app_server = match setup {
        SetupKind::Local => {
            let app_state = AppStateBuilder::<LocalSetup>::default()
                .with_accounts(InMemoryAccountStore::default())
                .with_verification_code_sender(LogCodeSender);

            tokio::spawn(serve_app(
                settings.clone(),
                app_state,
                cancellation_token.clone(),
            ))
        }
        SetupKind::Prod => {
            db::run_migrations(&settings.database.url).await?;
            let db_pool = db::pool(&settings.database.url, settings.database.connect_timeout).await?;

            let app_state = AppStateBuilder::<ProdSetup>::default()
                .with_accounts(PgAccountStore::new(db_pool))
                .with_verification_code_sender(EmailVerificationCodeSender::new(
                    settings.mailgun.clone(),
                ));

            tokio::spawn(serve_app(
                settings.clone(),
                app_state,
                cancellation_token.clone(),
            ))
        }
    };

    tokio::spawn(async move {
        capture_sigterm().await;

        cancellation_token.cancel();
        println!("\nCtrl+C received, shutting down. Press Ctrl+C again to force shutdown.");

        capture_sigterm().await;

        exit(130)
    });

    let (metrics, app) = tokio::try_join!(metrics_server, app_server)?;

    if let Err(e) = metrics {
        tracing::error!("metrics server crashed: {}", e);
    }

    if let Err(e) = app {
        tracing::error!("app server crashed: {}", e);
    }

    Ok(())
}

async fn serve_metrics(
    recorder_handle: PrometheusHandle,
    port: u16,
    token: CancellationToken,
) -> Result<()> {
    let metrics_router = Router::new()
        .route("/metrics", get(move || ready(recorder_handle.render())))
        .fallback(notfound_404);

    let router = metrics_router.layer(CatchPanicLayer::custom(runtime::catch_panic));

    let (server, _) = serve("Metrics", router, port).await?;

    token.cancelled().await;
    server.graceful_shutdown(None);

    Ok(())
}

async fn serve_app<S: ServerSetup>(
    settings: Settings,
    app_state: AppStateBuilder<S>,
    token: CancellationToken,
) -> Result<()> {
    let req_id = HeaderName::from_static(REQUEST_ID);

    let app_state: AppState<S> = app_state
        .with_verification(VerificationFlow::new(settings.otp.ttl()))
        .with_credentials(CredentialIssuer::from_settings(&settings.auth))
        .finalize()?;

    let router = router::setup_app_router(app_state)
        // Set and propagate "request_id" (as a ulid) per request.
        .layer(
            ServiceBuilder::new()
                .set_request_id(req_id.clone(), MakeRequestUlid)
                .propagate_request_id(req_id),
        )
        .layer(TimeoutLayer::new(Duration::from_millis(
            settings.server.timeout_ms,
        )))
        .layer(CatchPanicLayer::custom(runtime::catch_panic))
        // Mark headers as sensitive on both requests and responses.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION]))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let (server, addr) = serve("Application", router, settings.server.port).await?;

    if settings.healthcheck.is_enabled {
        tokio::spawn({
            let cancellation_token = token.clone();
            let settings = settings.healthcheck.clone();

            async move {
                let mut interval =
                    tokio::time::interval(Duration::from_millis(settings.interval_ms));

                let client = ClientBuilder::new(reqwest::Client::new())
                    .with(RetryTransientMiddleware::new_with_policy(
                        ExponentialBackoffBuilder::default()
                            .build_with_max_retries(settings.max_retries),
                    ))
                    .build();

                loop {
                    interval.tick().await;

                    match client
                        .get(format!("http://{addr}/healthcheck"))
                        .send()
                        .await
                    {
                        Ok(response) if response.status().is_success() => {}
                        _ => break,
                    }
                }

                cancellation_token.cancel();

                tracing::error!("Healthcheck failed, shutting down");
            }
        });
    }

    token.cancelled().await;
    server.graceful_shutdown(None);

    Ok(())
}

async fn serve(name: &str, app: Router, port: u16) -> Result<(Handle, SocketAddr)> {
    let bind_addr: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    info!(
        subject = "app_start",
        category = "init",
        "{} server listening on {}",
        name,
        bind_addr
    );

    let handle = Handle::new();

    tokio::spawn({
        let handle = handle.clone();
        let name = name.to_string();
        async move {
            if let Err(e) = axum_server::bind(bind_addr)
                .handle(handle)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await
            {
                tracing::error!(server = name, ?e, "Server stopped with an error");
            }
        }
    });

    let addr = handle
        .listening()
        .await
        .ok_or_else(|| anyhow!("{name} server failed to bind {bind_addr}"))?;

    Ok((handle, addr))
}

/// Captures and waits for system signals.
async fn capture_sigterm() {
    let term = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(?e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = term => {}
    };
}

/// Install the stdout logging subscriber.
///
/// `RUST_LOG` overrides the default filter.
fn setup_tracing(writer: tracing_appender::non_blocking::NonBlocking, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("tiffin_server=info,tiffin_core=info,tower_http=info,reqwest_retry=info")
    });

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(true),
            )
            .init(),
    }
}
