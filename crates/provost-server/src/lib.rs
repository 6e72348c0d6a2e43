pub mod error;
pub mod routes;
pub mod state;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use provost_core::audit::AuditLog;
use provost_core::config::ProvostConfig;
use provost_core::processor::Processor;
use provost_core::queue::JobQueue;
use provost_core::store::CourseStore;
use provost_core::vendor::{HttpChatClient, HttpRepoClient};
use provost_core::worker::Worker;

use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Courses
        .route("/api/courses", post(routes::courses::create_course))
        .route("/api/courses", get(routes::courses::list_courses))
        .route("/api/courses/{id}", get(routes::courses::get_course))
        .route("/api/courses/{id}", delete(routes::courses::delete_course))
        .route(
            "/api/courses/{id}/provision",
            post(routes::courses::start_provisioning),
        )
        .route("/api/courses/{id}/retry", post(routes::courses::retry_course))
        .route("/api/courses/{id}/status", get(routes::courses::get_status))
        .route("/api/courses/{id}/audit", get(routes::courses::get_audit))
        // Seed templates
        .route("/api/templates", get(routes::templates::list_templates))
        .route("/api/templates", post(routes::templates::upsert_template))
        .route("/api/templates/{id}", get(routes::templates::get_template))
        .layer(cors)
        .with_state(app_state)
}

/// Start the management API and the provisioning worker.
///
/// The worker runs on a dedicated blocking thread: it requeues jobs an
/// earlier process left running, then polls the queue, executing one job
/// at a time against the vendor clients built from `config`.
pub async fn serve(config: ProvostConfig) -> anyhow::Result<()> {
    for warning in config.validate() {
        tracing::warn!(level = ?warning.level, "{}", warning.message);
    }
    // Fail at startup rather than on the first job.
    if config.chat.token().is_none() {
        anyhow::bail!("missing required configuration: chat.token");
    }
    if config.repos.token().is_none() {
        anyhow::bail!("missing required configuration: repos.token");
    }
    if config.repos.org.is_none() {
        anyhow::bail!("missing required configuration: repos.org");
    }

    let store = Arc::new(CourseStore::open(&config.database_path)?);
    let queue = Arc::new(JobQueue::open(&config.queue_path, config.queue.clone())?);

    // The worker owns the blocking vendor clients, so they are built and
    // used on its dedicated OS thread, never inside the async runtime.
    // Runs until the process exits.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let store = store.clone();
        let queue = queue.clone();
        let config = config.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            let audit = AuditLog::new(store.clone());
            let chat = match HttpChatClient::new(&config.chat, audit.clone()) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    tracing::error!(error = %e, "cannot start worker");
                    return;
                }
            };
            let repos = match HttpRepoClient::new(&config.repos, audit) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    tracing::error!(error = %e, "cannot start worker");
                    return;
                }
            };
            let processor = Arc::new(Processor::new(store, chat, repos));
            let worker = Worker::new(queue, processor, &config.queue);
            if let Err(e) = worker.recover() {
                tracing::error!(error = %e, "queue recovery failed");
            }
            worker.run_loop(&stop);
        });
    }

    let app = build_router(AppState::new(store, queue));
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("provost management API listening on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
