/// HTTP middleware for blog-service
///
/// Records request counts and latency per matched route and emits a debug
/// log line for every completed request.
use crate::metrics::record_http_request;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

const UNMATCHED_ROUTE: &str = "unmatched";

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();

            let (route, status) = match &res {
                Ok(response) => (
                    response
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string()),
                    response.status().as_u16(),
                ),
                Err(err) => (
                    UNMATCHED_ROUTE.to_string(),
                    err.as_response_error().status_code().as_u16(),
                ),
            };

            record_http_request(&method, &route, status, elapsed.as_secs_f64());
            tracing::debug!(
                %method,
                %path,
                %route,
                status,
                elapsed_ms = elapsed.as_millis() as u64,
                "request completed"
            );
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::HTTP_REQUESTS_TOTAL;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn records_matched_route_pattern() {
        let app = test::init_service(
            App::new()
                .wrap(MetricsMiddleware)
                .route(
                    "/probe/{id}",
                    web::get().to(|| async { HttpResponse::Ok().finish() }),
                ),
        )
        .await;

        let counter = HTTP_REQUESTS_TOTAL.with_label_values(&["GET", "/probe/{id}", "200"]);
        let before = counter.get();

        let req = test::TestRequest::get().uri("/probe/42").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert_eq!(counter.get() - before, 1);
    }
}
