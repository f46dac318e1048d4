use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run_http_service<S, E>(host: &str, port: u16, service: S) -> Result<(), E>
where
    S: Service<Request<Incoming>, Response = Response<BoxBody<Bytes, E>>, Error = E>
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    E: From<std::io::Error> + std::error::Error + Send + Sync + 'static,
{
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!(host, port, "Listening");
    serve(listener, service).await
}

/// Serves connections accepted on an already bound listener until accepting fails.
pub async fn serve<S, E>(listener: TcpListener, service: S) -> Result<(), E>
where
    S: Service<Request<Incoming>, Response = Response<BoxBody<Bytes, E>>, Error = E>
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    E: From<std::io::Error> + std::error::Error + Send + Sync + 'static,
{
    let service_arc = Arc::new(service);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let io = TokioIo::new(stream);
        let svc = service_arc.clone();

        // Hand the connection to hyper; auto-detect h1/h2 on this socket
        tokio::spawn(async move {
            if let Err(err) = Builder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                tracing::debug!(peer = %peer_addr, error = %err, "Connection closed with error");
            }
        });
    }
}

pub fn full_body<E: 'static>(bytes: impl Into<Bytes>) -> BoxBody<Bytes, E> {
    Full::new(bytes.into()).map_err(|e| match e {}).boxed()
}

pub fn empty_response<E: 'static>(status: StatusCode) -> Response<BoxBody<Bytes, E>> {
    let mut response = Response::new(full_body(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Builds a JSON response. Falls back to a bare 500 if `value` cannot be serialized.
pub fn json_response<T: Serialize, E: 'static>(
    status: StatusCode,
    value: &T,
) -> Response<BoxBody<Bytes, E>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut response = Response::new(full_body(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => {
            tracing::error!(error = %err, "Could not serialize response body");
            make_boxed_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn make_boxed_error_response<E: 'static>(status_code: StatusCode) -> Response<BoxBody<Bytes, E>> {
    let message = status_code
        .canonical_reason()
        .unwrap_or("an error occurred");

    let mut response = Response::new(full_body(message));
    *response.status_mut() = status_code;
    response
}
