//! HTTP 요청 metrics middleware.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 수집에서 제외할 경로 (Prometheus 스크레이프 자체)
const SKIPPED_PATHS: &[&str] = &["/metrics"];

/// 메트릭 라벨용 경로.
///
/// 라우팅이 끝난 요청은 route 템플릿(`/api/colleges/{college_id}`)을,
/// 그렇지 않으면 동적 세그먼트를 치환한 경로를 사용합니다.
fn metric_path(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| normalize_path(request.uri().path()))
}

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// 각 요청에 대해 다음 메트릭을 기록합니다:
/// - `http_requests_total`: 총 요청 수 (method, path 라벨)
/// - `http_responses_total`: 총 응답 수 (method, path, status 라벨)
/// - `http_request_duration_seconds`: 요청 처리 시간 히스토그램
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    if SKIPPED_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().to_string();
    let path = metric_path(&request);

    record_http_request(&method, &path);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    record_http_response(&method, &path, status);
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "OK"
    }

    fn request(uri: &str) -> Request {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_metric_path_falls_back_to_normalized() {
        let req = request("/api/colleges/123e4567-e89b-12d3-a456-426614174000");
        assert_eq!(metric_path(&req), "/api/colleges/:id");
    }

    #[tokio::test]
    async fn test_metrics_middleware_with_params() {
        let app = Router::new()
            .route("/api/colleges/{college_id}", get(test_handler))
            .route_layer(middleware::from_fn(metrics_layer));

        let response = app
            .oneshot(request("/api/colleges/123e4567-e89b-12d3-a456-426614174000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_passes_through() {
        let app = Router::new()
            .route("/metrics", get(test_handler))
            .layer(middleware::from_fn(metrics_layer));

        let response = app.oneshot(request("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
