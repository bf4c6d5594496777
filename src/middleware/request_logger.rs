//! Request logging middleware: one line when a request starts, one when it ends.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use actix_web::http::header;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::time::Instant;
use tracing::{error, info, warn};

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let content_type = header_str(&req, header::CONTENT_TYPE).unwrap_or("none").to_string();
        // Uploads are the large requests; log the declared size up front
        let content_length = header_str(&req, header::CONTENT_LENGTH)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        info!(
            target: "api",
            method = %method,
            path = %path,
            remote_addr = %remote_addr,
            content_type = %content_type,
            content_length = content_length,
            "→ Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let duration_ms = start.elapsed().as_millis() as u64;
            let status = res.status().as_u16();

            match res.status() {
                s if s.is_server_error() => error!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status,
                    duration_ms = duration_ms,
                    "← Server error"
                ),
                s if s.is_client_error() => warn!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status,
                    duration_ms = duration_ms,
                    "← Client error"
                ),
                _ => info!(
                    target: "api",
                    method = %method,
                    path = %path,
                    status = status,
                    duration_ms = duration_ms,
                    "← Request completed"
                ),
            }

            Ok(res)
        })
    }
}

fn header_str(req: &ServiceRequest, name: header::HeaderName) -> Option<&str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}
