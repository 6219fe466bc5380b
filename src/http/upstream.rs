//! Forwarding to the upstream service.
//!
//! This is the "next handler" behind the maintenance layer: every request
//! that is not answered with a maintenance response ends up here.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{uri::Scheme, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

/// HTTP/1.1 client bound to one upstream authority.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    address: String,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            address: config.address.clone(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Forward `request` upstream, mapping failures to 502.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let request_id = request_id(&request).to_string();
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        parts.uri = match Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.address.as_str())
            .path_and_query(path_and_query)
            .build()
        {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, upstream = %self.address, error = %e, "Invalid upstream URI");
                metrics::record_upstream(StatusCode::BAD_GATEWAY.as_u16());
                return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
            }
        };
        // The upstream connection is always HTTP/1.1, whatever the client spoke.
        parts.version = Version::HTTP_11;

        tracing::debug!(request_id = %request_id, uri = %parts.uri, "Forwarding request upstream");

        let result: Result<hyper::Response<hyper::body::Incoming>, _> =
            self.client.request(Request::from_parts(parts, body)).await;
        match result {
            Ok(response) => {
                metrics::record_upstream(response.status().as_u16());
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, upstream = %self.address, error = %e, "Upstream error");
                metrics::record_upstream(StatusCode::BAD_GATEWAY.as_u16());
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

/// Fallback route handler forwarding everything upstream.
pub async fn upstream_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.upstream.forward(request).await
}
