//! Browser-facing bridge for the RPC services.
//!
//! Browsers cannot speak HTTP/2 gRPC with trailers, so the bridge listener
//! serves the same `Routes` translated from grpc-web over HTTP/1.1 or HTTP/2.

use axum::Router;
use tonic::service::Routes;
use tonic_web::GrpcWebLayer;
use tower::Layer;

/// Router answering grpc-web calls with the given RPC services.
pub fn router(routes: Routes) -> Router {
    Router::new().fallback_service(GrpcWebLayer::new().layer(routes))
}
