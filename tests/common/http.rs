use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::util::ServiceExt;

pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
    headers: &[(&str, String)],
) -> Response {
    let mut builder = Request::builder().method(method).uri(path);

    for (k, v) in headers {
        builder = builder.header(*k, v.as_str());
    }

    let req = if let Some(payload) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("empty body")
    };

    app.clone().oneshot(req).await.expect("oneshot response")
}

pub async fn raw_request(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("oneshot response")
}

pub async fn response_json(resp: Response) -> (StatusCode, HeaderMap, Value) {
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body bytes");

    let json = if bytes.is_empty() {
        serde_json::json!({})
    } else {
        serde_json::from_slice::<Value>(&bytes).expect("parse json body")
    };

    (status, headers, json)
}

pub async fn response_text(resp: Response) -> (StatusCode, String) {
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body bytes");
    (status, String::from_utf8_lossy(&bytes).to_string())
}

pub fn assert_json_error(body: &Value, code: &str) {
    assert_eq!(body["code"], code, "unexpected error body: {body}");
    assert!(body["error"].is_string());
    assert!(body["traceId"].is_string());
}

pub async fn post_frame(app: &Router, body: Value, session: Option<&str>) -> (StatusCode, Value) {
    let headers: Vec<(&str, String)> = session
        .map(|id| vec![("x-session-id", id.to_string())])
        .unwrap_or_default();
    let resp = request(app, Method::POST, "/process_frame", Some(body), &headers).await;
    let (status, _, json) = response_json(resp).await;
    (status, json)
}
