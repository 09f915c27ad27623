//! Tower middleware that gates a service behind a [`RateLimiter`].

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture};
use http::{Request, Response, StatusCode};
use tower::{Layer, Service};

use crate::ratelimit::{Clock, RateLimiter, SystemClock};

/// Layer that puts every wrapped service behind the same limiter.
pub struct RateLimitLayer<C = SystemClock> {
    limiter: Arc<RateLimiter<C>>,
}

impl<C> RateLimitLayer<C> {
    /// Create a layer sharing `limiter`.
    pub fn new(limiter: Arc<RateLimiter<C>>) -> Self {
        Self { limiter }
    }
}

impl<C> Clone for RateLimitLayer<C> {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<S, C> Layer<S> for RateLimitLayer<C> {
    type Service = RateLimit<S, C>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit {
            inner,
            limiter: Arc::clone(&self.limiter),
        }
    }
}

/// Service produced by [`RateLimitLayer`].
///
/// Every response carries the `x-ratelimit-*` headers. Admitted requests get
/// the inner service's response otherwise untouched; rejected ones get an
/// empty `429 Too Many Requests` and never reach the inner service.
pub struct RateLimit<S, C = SystemClock> {
    inner: S,
    limiter: Arc<RateLimiter<C>>,
}

impl<S: Clone, C> Clone for RateLimit<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<S, C, ReqBody, ResBody> Service<Request<ReqBody>> for RateLimit<S, C>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Default + Send + 'static,
    C: Clock,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // Decide before the inner future exists; the lock is never held across it.
        let decision = self.limiter.check();
        let quota = decision.quota;

        if decision.is_admitted() {
            let response = self.inner.call(req);
            Box::pin(async move {
                let mut response = response.await?;
                quota.apply_to(response.headers_mut());
                Ok(response)
            })
        } else {
            let mut response = Response::new(ResBody::default());
            *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
            quota.apply_to(response.headers_mut());
            Box::pin(future::ready(Ok(response)))
        }
    }
}
