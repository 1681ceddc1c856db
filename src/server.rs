//! HTTP ingress for GitHub webhooks

use crate::automerge::PushHandler;
use crate::webhook::WebhookEvent;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{Instrument, debug, info, info_span, warn};

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

/// Shared state of the webhook endpoint
#[derive(Clone)]
pub struct AppState {
    /// Handler every accepted notification is passed to
    pub handler: PushHandler,
}

/// Build the webhook router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(receive_webhook))
        .with_state(state)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handle one webhook delivery.
///
/// Pushes are processed before responding. The response only reflects
/// whether the notification could be understood.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let event_name = header(&headers, EVENT_HEADER).unwrap_or_default().to_string();
    let delivery = header(&headers, DELIVERY_HEADER).unwrap_or("-").to_string();
    let span = info_span!("webhook", delivery = %delivery, event = %event_name);

    async move {
        let event = match WebhookEvent::parse(&event_name, &body) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "rejecting webhook payload");
                return (StatusCode::BAD_REQUEST, "BAD");
            }
        };

        match event {
            WebhookEvent::Push(push) => {
                state.handler.handle_push(&push).await;
            }
            WebhookEvent::PullRequest(pr) => {
                state.handler.handle_pull_request(&pr).await;
            }
            WebhookEvent::Ping => debug!("ping received"),
            WebhookEvent::Unsupported(name) => {
                warn!(event = %name, "unsupported webhook event");
                return (StatusCode::BAD_REQUEST, "BAD");
            }
        }
        (StatusCode::OK, "OK")
    }
    .instrument(span)
    .await
}

/// Serve `router` on `listener` until `shutdown` completes
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening for webhooks");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
