use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Echoes the caller's `x-request-id`, or assigns a fresh UUID, on both the
/// request and the response, and records it on the enclosing `http_request`
/// span.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });

    if let Ok(id) = request_id.to_str() {
        tracing::Span::current().record("request_id", id);
    }

    req.headers_mut()
        .insert(X_REQUEST_ID.clone(), request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(X_REQUEST_ID.clone(), request_id);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    async fn echo_request_id(req: Request) -> String {
        req.headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo_request_id))
            .layer(from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_generated_id_reaches_handler_and_response() {
        use http_body_util::BodyExt;

        let response = app()
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response.headers()[&X_REQUEST_ID].to_str().unwrap().to_string();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(body, header.as_bytes());
    }

    #[tokio::test]
    async fn test_generated_id_is_recorded_on_span() {
        use std::sync::{Arc, Mutex};
        use tracing::Instrument;
        use tracing::field::{Field, Visit};
        use tracing::span::{Id, Record};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        struct RequestIdVisitor<'a>(&'a Mutex<Vec<String>>);

        impl Visit for RequestIdVisitor<'_> {
            fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                if field.name() == "request_id" {
                    self.0.lock().unwrap().push(format!("{:?}", value));
                }
            }

            fn record_str(&mut self, field: &Field, value: &str) {
                if field.name() == "request_id" {
                    self.0.lock().unwrap().push(value.to_string());
                }
            }
        }

        struct CaptureRecords(Arc<Mutex<Vec<String>>>);

        impl<S: tracing::Subscriber> Layer<S> for CaptureRecords {
            fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
                values.record(&mut RequestIdVisitor(&self.0));
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(CaptureRecords(seen.clone())),
        );

        let span = tracing::info_span!("http_request", request_id = tracing::field::Empty);
        let response = app()
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .instrument(span)
            .await
            .unwrap();

        let header = response.headers()[&X_REQUEST_ID].to_str().unwrap().to_string();
        assert_eq!(*seen.lock().unwrap(), vec![header]);
    }
}
