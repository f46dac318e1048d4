use crate::TenantApiError;
use crate::errors::{ApiError, ErrorBody, log_error, map_error};
use crate::handlers::{Operation, Reply, TenantApi};
use crate::identity::{RequestContext, RequestHeaders};
use crate::metrics_defs::REQUESTS_INFLIGHT;
use crate::reporter::{Reporter, instrument};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::http::request::Parts;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use routing::{Resolution, Route, RouteActions};
use shared::gauge;
use shared::http::{empty_response, full_body, json_response};
use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::Instrument;

pub type ApiResponse = Response<BoxBody<Bytes, TenantApiError>>;

const ROUTE_NOT_FOUND: &str = "error_route_not_found";
const METHOD_NOT_ALLOWED: &str = "error_method_not_allowed";

fn routes() -> RouteActions<Operation> {
    RouteActions::new(vec![
        Route::new(Method::POST, "/v1/tenants", Operation::CreateTenant),
        Route::new(Method::PUT, "/v1/tenants", Operation::UpdateTenant),
        Route::new(Method::GET, "/v1/tenants", Operation::ReadTenant),
        Route::new(Method::DELETE, "/v1/tenants", Operation::DeleteTenant),
        Route::new(Method::PUT, "/v1/versions/{service}", Operation::SetVersion),
        Route::new(Method::GET, "/v1/versions/{service}", Operation::GetVersion),
        Route::new(Method::DELETE, "/v1/versions/{service}", Operation::DeleteVersion),
    ])
}

/// Unescapes a path parameter the way query strings are unescaped, so `+` is a space.
fn decode_path_param(raw: &str) -> Result<String, ApiError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| ApiError::InvalidInput("path parameter is not valid UTF-8"))
}

/// Holds one unit of the in-flight gauge until dropped, including when the
/// connection goes away mid-request.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

struct Inner {
    api: TenantApi,
    reporter: Arc<dyn Reporter>,
    routes: RouteActions<Operation>,
    headers: RequestHeaders,
}

/// Serves the tenant and version API.
#[derive(Clone)]
pub struct TenantApiService {
    inner: Arc<Inner>,
}

impl TenantApiService {
    pub fn new(api: TenantApi, reporter: Arc<dyn Reporter>, headers: RequestHeaders) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                reporter,
                routes: routes(),
                headers,
            }),
        }
    }

    /// Handles a request whose body has already been read.
    pub async fn handle(&self, request: Request<Bytes>) -> ApiResponse {
        let (parts, body) = request.into_parts();
        self.respond(&parts, Ok(&body[..])).await
    }

    /// Routes and answers a request. `body` is the read error when the body could
    /// not be received; it only fails operations that decode a payload.
    async fn respond(&self, parts: &Parts, body: Result<&[u8], &str>) -> ApiResponse {
        let ctx = RequestContext::from_headers(&parts.headers, &self.inner.headers);

        let matched = match self.inner.routes.resolve_parts(&parts.method, parts.uri.path()) {
            Resolution::Matched(route) => Ok((
                *route.action,
                route.param("service").map(str::to_owned),
            )),
            Resolution::MethodNotAllowed => {
                Err((StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED))
            }
            Resolution::NotFound => Err((StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)),
        };

        let mut response = match matched {
            Ok((operation, service)) => {
                self.run(operation, &ctx, service.as_deref(), body).await
            }
            Err((status, token)) => {
                tracing::debug!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    "No route matched"
                );
                json_response(status, &ErrorBody::new(token, &ctx))
            }
        };

        if let Some(value) = ctx
            .request_id()
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            response
                .headers_mut()
                .insert(self.inner.headers.request_id.clone(), value);
        }
        response
    }

    async fn run(
        &self,
        operation: Operation,
        ctx: &RequestContext,
        service: Option<&str>,
        body: Result<&[u8], &str>,
    ) -> ApiResponse {
        let span = tracing::info_span!(
            "request",
            operation = operation.metric_name(),
            tenant_id = ctx.tenant_id(),
            request_id = ctx.request_id(),
            service = tracing::field::Empty
        );

        let _inflight = InflightGuard::new();
        let result = instrument(
            self.inner.reporter.as_ref(),
            operation.metric_name(),
            async {
                let result = self.dispatch(operation, ctx, service, body).await;
                if let Err(err) = &result {
                    log_error(err, ctx);
                }
                result
            },
        )
        .instrument(span)
        .await;

        match result {
            Ok(reply) => reply_response(reply),
            Err(err) => {
                let (status, token) = map_error(&err);
                json_response(status, &ErrorBody::new(token, ctx))
            }
        }
    }

    /// Resolves identity for tenant-scoped operations before calling the handler.
    /// The path parameter and the body are only looked at once identity is known.
    async fn dispatch(
        &self,
        operation: Operation,
        ctx: &RequestContext,
        service: Option<&str>,
        body: Result<&[u8], &str>,
    ) -> Result<Reply, ApiError> {
        let api = &self.inner.api;
        let require_service = || -> Result<String, ApiError> {
            let raw = service.ok_or(ApiError::InvalidInput("missing service name"))?;
            let service = decode_path_param(raw)?;
            tracing::Span::current().record("service", service.as_str());
            Ok(service)
        };
        let payload = || body.map_err(|err| ApiError::MalformedPayload(err.to_string()));

        match operation {
            Operation::CreateTenant => api.create_tenant(payload()?).await,
            Operation::UpdateTenant => {
                let tenant = ctx.require_tenant()?;
                api.update_tenant(tenant, payload()?).await
            }
            Operation::ReadTenant => api.read_tenant(ctx.require_tenant()?).await,
            Operation::DeleteTenant => api.delete_tenant(ctx.require_tenant()?).await,
            Operation::SetVersion => {
                let tenant = ctx.require_tenant()?;
                let service = require_service()?;
                api.set_version(tenant, &service, payload()?).await
            }
            Operation::GetVersion => {
                let tenant = ctx.require_tenant()?;
                let service = require_service()?;
                api.get_version(tenant, &service).await
            }
            Operation::DeleteVersion => {
                let tenant = ctx.require_tenant()?;
                let service = require_service()?;
                api.delete_version(tenant, &service).await
            }
        }
    }
}

fn reply_response(reply: Reply) -> ApiResponse {
    match reply.body {
        Some(body) => {
            let mut response = Response::new(full_body(body));
            *response.status_mut() = reply.status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        None => empty_response(reply.status),
    }
}

impl Service<Request<Incoming>> for TenantApiService {
    type Response = ApiResponse;
    type Error = TenantApiError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let response = match body.collect().await {
                Ok(collected) => {
                    let bytes = collected.to_bytes();
                    service.respond(&parts, Ok(&bytes[..])).await
                }
                Err(err) => {
                    let reason = err.to_string();
                    service.respond(&parts, Err(reason.as_str())).await
                }
            };
            Ok(response)
        })
    }
}
