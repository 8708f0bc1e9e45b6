use std::time::Instant;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::domain::caller::CallerContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const TARGET: &str = "todo_api::http::response";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Assigns a request id, honouring one supplied by an upstream proxy, and
/// echoes it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Logs every 4xx at warn and every 5xx at error, with the attached
/// [`ErrorReport`] and the authenticated caller when there is one.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let failure = FailedResponse {
        status,
        method,
        uri,
        request_id,
        elapsed_ms: start.elapsed().as_millis(),
        // The auth layer runs inside this one, so the caller is only visible on the response.
        caller: response.extensions().get::<CallerContext>().cloned(),
        report: response.extensions_mut().remove::<ErrorReport>(),
    };
    failure.emit();

    response
}

struct FailedResponse {
    status: StatusCode,
    method: Method,
    uri: Uri,
    request_id: String,
    elapsed_ms: u128,
    caller: Option<CallerContext>,
    report: Option<ErrorReport>,
}

impl FailedResponse {
    fn emit(self) {
        let (caller, roles) = match &self.caller {
            Some(caller) => (caller.email().to_string(), caller.roles().label()),
            None => (String::new(), String::new()),
        };
        let (source, chain) = match self.report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = chain
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available");

        if self.status.is_server_error() {
            error!(
                target = TARGET,
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.uri.path(),
                elapsed_ms = self.elapsed_ms,
                source,
                detail,
                chain = ?chain,
                request_id = self.request_id,
                caller,
                roles,
                "request failed",
            );
        } else {
            warn!(
                target = TARGET,
                status = self.status.as_u16(),
                method = %self.method,
                path = %self.uri.path(),
                elapsed_ms = self.elapsed_ms,
                source,
                detail,
                chain = ?chain,
                request_id = self.request_id,
                caller,
                roles,
                "client request error",
            );
        }
    }
}
