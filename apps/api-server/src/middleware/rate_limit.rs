//! Rate limiting middleware for mutating requests.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{
        Method,
        header::{HeaderName, HeaderValue},
    },
};
use murmur_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use murmur_core::ports::RateLimiter;

use super::auth;

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
}

/// Reads and event streams are never limited.
fn is_limited(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Authenticated callers are limited per user, anonymous ones per peer address.
fn client_key(req: &ServiceRequest) -> String {
    match auth::resolve(req.request()) {
        Ok(Some(identity)) => format!("user:{}", identity.user_id),
        _ => format!(
            "ip:{}",
            req.connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
        ),
    }
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if !is_limited(req.method()) {
            return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
        }

        let limiter = self.limiter.clone();
        let key = client_key(&req);

        Box::pin(async move {
            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    let retry_after = result.retry_after_secs();
                    tracing::warn!(key = %key, retry_after, "Rate limit exceeded");

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("Retry-After", retry_after.to_string()))
                        .json(ErrorResponse::too_many_requests(retry_after));

                    Ok(req.into_response(response).map_into_right_body())
                }
                Ok(result) => {
                    let mut res = service.call(req).await?;
                    res.headers_mut().insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from(result.remaining),
                    );
                    Ok(res.map_into_left_body())
                }
                Err(e) => {
                    // Fail open
                    tracing::error!(error = %e, "Rate limiter error");
                    Ok(service.call(req).await?.map_into_left_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test, web};
    use murmur_infra::{InMemoryRateLimiter, RateLimitConfig};
    use std::time::Duration;

    fn limiter(max_requests: u32) -> Arc<dyn RateLimiter> {
        Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        }))
    }

    #[actix_web::test]
    async fn test_mutations_are_limited() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(1)))
                .route("/posts", web::post().to(|| async { HttpResponse::Created().finish() })),
        )
        .await;

        let first = test::call_service(&app, test::TestRequest::post().uri("/posts").to_request()).await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = test::call_service(&app, test::TestRequest::post().uri("/posts").to_request()).await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));
    }

    #[actix_web::test]
    async fn test_reads_pass_through() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(1)))
                .route("/timeline", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for _ in 0..3 {
            let res = test::call_service(&app, test::TestRequest::get().uri("/timeline").to_request()).await;
            assert_eq!(res.status(), StatusCode::OK);
        }
    }
}
