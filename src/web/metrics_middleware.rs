use crate::metrics::WEB_REQUEST_HISTOGRAM;
use actix_service::{forward_ready, Service, Transform};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::Error;
use futures::future::{ok, LocalBoxFuture, Ready};

#[derive(Clone, Default)]
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = DefaultMetricsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(DefaultMetricsMiddleware { service })
    }
}

pub struct DefaultMetricsMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for DefaultMetricsMiddleware<S>
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
        let pattern = req.match_pattern().unwrap_or_else(|| "unmatched".to_string());
        let timer = WEB_REQUEST_HISTOGRAM
            .with_label_values(&[&pattern])
            .start_timer();
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await;
            timer.observe_duration();
            res
        })
    }
}
