use crate::columns::ColumnIds;
use crate::config::Config;
use crate::errors::IntakeError;
use crate::extract::CallEvent;
use crate::metrics_defs::REQUEST_DURATION;
use crate::params::{Params, aliases};
use crate::response::{ColumnsReply, ConfigErrorReply, ErrorReply, PingReply, SyncReply};
use crate::routing::DepartmentRouter;
use crate::sync::SyncOrchestrator;
use chrono::{SecondsFormat, Utc};
use http::{Method, StatusCode};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use shared::histogram;
use shared::http::{into_boxed, make_empty_response, make_json_response};
use std::any::Any;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use tracker::{TrackerClient, TrackerError};
use uuid::Uuid;

const PING_MESSAGE: &str = "Service reachable & authorized";

/// Everything needed to answer a request. Shared by all connections.
pub struct Intake {
    shared_secret: Option<String>,
    board_id: Option<String>,
    client: Option<Arc<dyn TrackerClient>>,
    columns: ColumnIds,
    router: DepartmentRouter,
}

impl Intake {
    pub fn new(config: &Config) -> Result<Self, TrackerError> {
        let client = config
            .tracker
            .client()
            .transpose()?
            .map(|client| Arc::new(client) as Arc<dyn TrackerClient>);
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &Config, client: Option<Arc<dyn TrackerClient>>) -> Self {
        Intake {
            shared_secret: config.shared_secret.clone(),
            board_id: config.tracker.board_id().map(String::from),
            client,
            columns: config.columns.clone(),
            router: config.router(),
        }
    }

    /// Answers one request. The body is never read.
    pub async fn handle<B>(self: Arc<Self>, request: Request<B>) -> Response<Bytes> {
        let (parts, _) = request.into_parts();
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("request", request_id = %request_id);

        async move {
            let mut guard = AbortGuard { armed: true };
            let start = Instant::now();
            let params = Params::from_query(parts.uri.query());

            let (mode, response) = self
                .dispatch(&parts.method, parts.uri.path(), &params)
                .await;

            let elapsed = start.elapsed();
            histogram!(REQUEST_DURATION, "mode" => mode).record(elapsed.as_secs_f64());
            tracing::info!(
                mode,
                status = response.status().as_u16(),
                duration_ms = elapsed.as_millis() as u64,
                "Request finished"
            );
            guard.armed = false;
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        self: &Arc<Self>,
        method: &Method,
        path: &str,
        params: &Params,
    ) -> (&'static str, Response<Bytes>) {
        if method == Method::OPTIONS {
            return ("preflight", make_empty_response(StatusCode::NO_CONTENT));
        }
        if method != Method::GET {
            return (
                "rejected",
                make_json_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    &ErrorReply::new("Only GET requests allowed"),
                ),
            );
        }

        tracing::info!(%method, path, params = ?params.scrubbed(), "Request received");

        if !self.authorized(params) {
            tracing::warn!("Rejecting request with missing or wrong secret");
            return (
                "rejected",
                make_json_response(StatusCode::UNAUTHORIZED, &ErrorReply::new("Unauthorized")),
            );
        }

        let mode = params.get(aliases::MODE);
        if mode == Some("ping") {
            let reply = PingReply {
                success: true,
                message: PING_MESSAGE,
                method: method.as_str(),
                now: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            };
            return ("ping", make_json_response(StatusCode::OK, &reply));
        }

        let (Some(client), Some(board_id)) = (&self.client, &self.board_id) else {
            let reply = ConfigErrorReply::new(self.client.is_some(), self.board_id.is_some());
            tracing::error!(
                has_api_key = reply.details.has_api_key,
                has_board_id = reply.details.has_board_id,
                "Tracker settings are missing"
            );
            return ("config_error", make_json_response(StatusCode::OK, &reply));
        };

        if mode == Some("columns") {
            let result = client.list_columns(board_id).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "Listing columns failed");
            }
            return (
                "columns",
                make_json_response(StatusCode::OK, &ColumnsReply::from(result)),
            );
        }

        let event = CallEvent::from_params(params);
        if params.get(aliases::DEBUG) == Some("1") {
            log_event(&event);
        }
        ("sync", self.sync(client.clone(), board_id.clone(), event).await)
    }

    /// Runs the pipeline on its own task so a dropped connection does not abandon remote
    /// writes halfway.
    async fn sync(
        self: &Arc<Self>,
        client: Arc<dyn TrackerClient>,
        board_id: String,
        event: CallEvent,
    ) -> Response<Bytes> {
        let intake = Arc::clone(self);
        let task = tokio::spawn(
            async move {
                SyncOrchestrator::new(client.as_ref(), &board_id, &intake.columns, &intake.router)
                    .run(&event)
                    .await
            }
            .in_current_span(),
        );

        match task.await {
            Ok(result) => {
                tracing::info!(outcome = result.outcome(), "Sync finished");
                make_json_response(StatusCode::OK, &SyncReply::from(&result))
            }
            Err(e) => {
                let message = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                let error = IntakeError::Pipeline(message);
                tracing::error!(error = %error, "Unhandled failure");
                make_json_response(StatusCode::OK, &ErrorReply::unhandled(error.to_string()))
            }
        }
    }

    fn authorized(&self, params: &Params) -> bool {
        match (self.shared_secret.as_deref(), params.get(aliases::SECRET)) {
            (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
            _ => false,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .unwrap_or_else(|| "pipeline panicked".to_string()),
    }
}

fn log_event(event: &CallEvent) {
    tracing::info!(
        name = %event.name,
        division = %event.division,
        department = %event.department,
        site = %event.site,
        issue = %event.issue,
        start = ?event.start_time,
        end = ?event.end_time,
        in_out = ?event.in_out,
        phone = %redacted(&event.phone),
        email = %redacted(&event.email),
        "Extracted call event"
    );
}

fn redacted(value: &str) -> String {
    if value.is_empty() {
        "none".to_string()
    } else {
        format!("len:{}", value.chars().count())
    }
}

/// Logs when the request future is dropped before a response was produced.
struct AbortGuard {
    armed: bool,
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Client aborted before a response was produced");
        }
    }
}

pub struct IntakeService {
    intake: Arc<Intake>,
}

impl IntakeService {
    pub fn new(intake: Arc<Intake>) -> Self {
        IntakeService { intake }
    }
}

impl Service<Request<Incoming>> for IntakeService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = IntakeError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let intake = self.intake.clone();
        Box::pin(async move { Ok(into_boxed(intake.handle(req).await)) })
    }
}
