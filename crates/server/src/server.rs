use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use project_automator::{is_remote, Config, Fetcher, GitFetcher, RunRequest};
use serde::Deserialize;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower_http::services::ServeDir;

use crate::bridge::{done_line, error_line, event_for, run_job, EXIT_FAILURE, WAITING_LINE};

pub const DEFAULT_MAX_JOBS: usize = 4;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: Config, max_jobs: usize) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(GitFetcher),
            permits: Arc::new(Semaphore::new(max_jobs.max(1))),
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + Send + Sync + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Local,
    Github,
}

impl SourceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "github" => Some(Self::Github),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeRequest {
    pub source_type: String,
    pub source: String,
}

impl OrganizeRequest {
    /// Returns the source to hand to the organizer, or the 400 message.
    pub fn validate(&self) -> Result<&str, &'static str> {
        let source = self.source.trim();
        let source_type = SourceType::parse(&self.source_type).ok_or("Invalid source type")?;

        match source_type {
            _ if source.is_empty() => Err("Invalid source"),
            SourceType::Github if !is_remote(source) => Err("Invalid source"),
            _ => Ok(source),
        }
    }
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/organize", post(organize))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

async fn organize(State(state): State<AppState>, Json(body): Json<OrganizeRequest>) -> Response {
    let source = match body.validate() {
        Ok(source) => source.to_string(),
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    tracing::info!(source_type = %body.source_type, %source, "organize requested");

    let request = RunRequest::new(source, state.config.output_dir.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(drive_job(state, request, tx));

    let stream = UnboundedReceiverStream::new(rx).map(|line| Ok::<_, Infallible>(event_for(line)));
    Sse::new(stream).into_response()
}

/// Queues for a worker slot, runs the job on the blocking pool and closes
/// the stream with a `[DONE]` line carrying the exit code.
async fn drive_job(state: AppState, request: RunRequest, tx: mpsc::UnboundedSender<String>) {
    let permit = match state.permits().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            let _ = tx.send(WAITING_LINE.to_string());
            match state.permits().acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    let _ = tx.send(error_line(&format!("worker pool closed: {}", err)));
                    let _ = tx.send(done_line(EXIT_FAILURE));
                    return;
                }
            }
        }
    };

    let config = Arc::clone(&state.config);
    let fetcher = Arc::clone(&state.fetcher);
    let worker_tx = tx.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        run_job(&request, &config, fetcher.as_ref(), &worker_tx)
    })
    .await;

    let code = joined.unwrap_or_else(|err| {
        tracing::error!(error = %err, "organize worker aborted");
        let _ = tx.send(error_line(&format!("worker aborted: {}", err)));
        EXIT_FAILURE
    });
    let _ = tx.send(done_line(code));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(source_type: &str, source: &str) -> OrganizeRequest {
        OrganizeRequest {
            source_type: source_type.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn parses_source_types() {
        assert_eq!(SourceType::parse("local"), Some(SourceType::Local));
        assert_eq!(SourceType::parse("github"), Some(SourceType::Github));
        assert_eq!(SourceType::parse("ftp"), None);
    }

    #[test]
    fn validate_rejects_unknown_type() {
        assert_eq!(body("svn", "/x").validate(), Err("Invalid source type"));
    }

    #[test]
    fn validate_requires_url_for_github() {
        assert_eq!(body("github", "./repo").validate(), Err("Invalid source"));
        assert_eq!(
            body("github", " https://github.com/u/r ").validate(),
            Ok("https://github.com/u/r")
        );
    }

    #[test]
    fn validate_rejects_blank_source() {
        assert_eq!(body("local", "  ").validate(), Err("Invalid source"));
        assert_eq!(body("local", "./project").validate(), Ok("./project"));
    }

    #[test]
    fn camel_case_body() {
        let parsed: OrganizeRequest =
            serde_json::from_str(r#"{"sourceType": "local", "source": "/tmp/site"}"#).unwrap();
        assert_eq!(parsed.source_type, "local");
        assert_eq!(parsed.source, "/tmp/site");
    }

    #[test]
    fn zero_max_jobs_still_allows_one() {
        let state = AppState::new(Config::default(), 0);
        assert_eq!(state.permits().available_permits(), 1);
    }
}
