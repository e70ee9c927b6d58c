//! Server-sent event streams over the live registry.

use std::convert::Infallible;
use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse, http::header, web::Bytes};
use futures::stream;
use tokio::time::{self, Instant};

use murmur_core::domain::{FeedFilter, UserId};
use murmur_infra::Subscription;

use crate::state::AppState;

/// Also bounds how long a dropped client stays registered: a disconnect is only seen
/// when the next frame fails to write.
const KEEP_ALIVE: Duration = Duration::from_secs(15);
const KEEP_ALIVE_FRAME: &[u8] = b": keep-alive\n\n";

/// Whether the client asked for `text/event-stream` instead of a JSON page.
pub fn wants_event_stream(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}

fn frame(data: &str) -> Bytes {
    Bytes::from(format!("data: {data}\n\n"))
}

/// Register a subscriber and stream its events until the client goes away.
pub fn subscribe(state: &AppState, user_id: UserId, filter: FeedFilter) -> HttpResponse {
    let subscription = state.live.subscribe(user_id, filter);
    tracing::debug!(
        user_id,
        connection_id = subscription.connection_id(),
        ?filter,
        "Live stream opened"
    );
    event_stream(subscription)
}

/// One `data:` frame per event. Dropping the body drops the subscription.
pub fn event_stream(subscription: Subscription) -> HttpResponse {
    event_stream_with_keep_alive(subscription, KEEP_ALIVE)
}

fn event_stream_with_keep_alive(subscription: Subscription, keep_alive: Duration) -> HttpResponse {
    let ticker = time::interval_at(Instant::now() + keep_alive, keep_alive);

    let body = stream::unfold(
        (subscription, ticker),
        |(mut subscription, mut ticker)| async move {
            loop {
                tokio::select! {
                    event = subscription.recv() => {
                        let event = event?;
                        match event.payload_json() {
                            Ok(json) => {
                                return Some((Ok::<_, Infallible>(frame(&json)), (subscription, ticker)));
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    user_id = subscription.user_id(),
                                    "Skipping live event that failed to encode"
                                );
                            }
                        }
                    }
                    _ = ticker.tick() => {
                        return Some((Ok(Bytes::from_static(KEEP_ALIVE_FRAME)), (subscription, ticker)));
                    }
                }
            }
        },
    );

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use futures::future::poll_fn;
    use murmur_core::domain::{LiveEvent, Notification, NotificationKind};
    use murmur_infra::LiveRegistry;
    use std::sync::Arc;

    fn notification() -> LiveEvent {
        LiveEvent::Notification(Notification {
            id: 1,
            user_id: 7,
            actors: vec!["bob".to_string()],
            kind: NotificationKind::Follow,
            post_id: None,
            read: false,
            issued_at: chrono::Utc::now(),
        })
    }

    #[test]
    fn test_frame_format() {
        assert_eq!(frame(r#"{"id":1}"#), Bytes::from_static(b"data: {\"id\":1}\n\n"));
    }

    #[test]
    fn test_accept_negotiation() {
        let sse = actix_web::test::TestRequest::default()
            .insert_header((header::ACCEPT, "text/event-stream"))
            .to_http_request();
        let json = actix_web::test::TestRequest::default()
            .insert_header((header::ACCEPT, "application/json"))
            .to_http_request();

        assert!(wants_event_stream(&sse));
        assert!(!wants_event_stream(&json));
    }

    #[actix_web::test]
    async fn test_stream_frames_events_and_unregisters_on_drop() {
        let registry = Arc::new(LiveRegistry::new(4));
        let response = event_stream(registry.subscribe(7, FeedFilter::All));
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        assert_eq!(registry.publish_local(7, &notification()), 1);

        let mut body = Box::pin(response.into_body());
        let chunk = poll_fn(|cx| body.as_mut().poll_next(cx))
            .await
            .unwrap()
            .unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();
        assert!(text.starts_with("data: {"));
        assert!(text.contains(r#""type":"follow""#));
        assert!(text.ends_with("\n\n"));

        drop(body);
        assert_eq!(registry.connections(7), 0);
    }

    #[actix_web::test]
    async fn test_idle_stream_writes_keep_alive() {
        let registry = Arc::new(LiveRegistry::new(4));
        let response = event_stream_with_keep_alive(
            registry.subscribe(7, FeedFilter::All),
            Duration::from_millis(20),
        );

        let mut body = Box::pin(response.into_body());
        let chunk = poll_fn(|cx| body.as_mut().poll_next(cx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chunk, Bytes::from_static(KEEP_ALIVE_FRAME));
        assert_eq!(registry.connections(7), 1);

        drop(body);
        assert_eq!(registry.connections(7), 0);
    }
}
