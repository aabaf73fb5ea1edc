use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use metrics::counter;

use crate::metrics::HTTP_REQUESTS;

/// Count every request by method and final status
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = method_label(request.method());
    let response = next.run(request).await;

    counter!(
        HTTP_REQUESTS,
        "method" => method,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}

/// Extension methods collapse into one label value
fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::PATCH => "PATCH",
        Method::DELETE => "DELETE",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}
