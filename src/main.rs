use issues_dashboard::application::use_cases::fetch_repository_issues::{
    FetchRepositoryIssuesInteractor, FetchRepositoryIssuesUseCase,
    FetchRepositoryIssuesUseCaseInput,
};
use issues_dashboard::infrastructures::adapters::primary::web::{
    AppState, DEFAULT_PATH, DashboardState, create_router,
};
use issues_dashboard::infrastructures::adapters::secondary::external_apis::github::GitHubGraphqlAdapter;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create OTLP exporter: {e}"))?;
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .build();
    let tracer = provider.tracer("issues-dashboard");

    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(fmt_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let initialize_span = info_span!("initialize");
    let _enter = initialize_span.enter();
    info!("Application starting");

    // Token validity is never checked locally; a bad token surfaces as an
    // HTTP or GraphQL error from the API.
    let github_token = env::var("GITHUB_TOKEN")
        .map_err(|e| anyhow::anyhow!("Failed to read GITHUB_TOKEN: {}", e))?;

    // Build dependencies
    let github_api_adapter = Arc::new(GitHubGraphqlAdapter::new(
        "https://api.github.com/graphql".to_string(),
        github_token,
    ));
    let fetch_use_case = Arc::new(FetchRepositoryIssuesInteractor::new(github_api_adapter));
    let app_state = Arc::new(AppState {
        use_case: fetch_use_case,
        dashboard: RwLock::new(DashboardState::new(DEFAULT_PATH.to_string())),
    });

    // Mount-time fetch for the default path; the page shows the placeholder
    // until this lands.
    let mount_state = app_state.clone();
    tokio::spawn(async move {
        let input = FetchRepositoryIssuesUseCaseInput {
            path: DEFAULT_PATH.to_string(),
        };
        match mount_state.use_case.execute(input).await {
            Ok(output) => {
                let mut dashboard = mount_state.dashboard.write().await;
                dashboard.apply(DEFAULT_PATH.to_string(), output);
                info!("Initial fetch applied for {}", DEFAULT_PATH);
            }
            Err(e) => tracing::error!("Initial fetch for {} failed: {:?}", DEFAULT_PATH, e),
        }
    });

    // Create router
    let app = create_router(app_state);

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
