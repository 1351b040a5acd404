//! Body-parser middleware.
//!
//! Decodes urlencoded-form and JSON request bodies into the context's
//! parsed-body slot before the chain runs. Other content types pass
//! through untouched. A body that declares JSON but fails to parse
//! short-circuits with 400.

use crate::http::context::{Context, ParsedBody};
use crate::http::request::HttpRequest;
use crate::http::{parse_urlencoded, response, HttpResponse};
use crate::middleware::{BoxFuture, Middleware, Next};

/// Fills `Context::body` for form and JSON payloads.
pub struct BodyParser;

impl Middleware for BodyParser {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            if !req.body().is_empty() {
                let content_type = req.header("content-type").unwrap_or("");
                // Parameters like "; charset=utf-8" may trail the media type.
                let media_type = content_type
                    .split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_ascii_lowercase();

                match media_type.as_str() {
                    "application/x-www-form-urlencoded" => {
                        let raw = String::from_utf8_lossy(req.body());
                        ctx.body = Some(ParsedBody::Form(parse_urlencoded(&raw)));
                    }
                    "application/json" => match serde_json::from_slice(req.body()) {
                        Ok(value) => ctx.body = Some(ParsedBody::Json(value)),
                        Err(_) => return response::bad_request("Invalid JSON body"),
                    },
                    _ => {}
                }
            }

            next.run(req, ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Handler, Middleware as _};
    use hyper::body::Bytes;
    use hyper::{HeaderMap, Method, StatusCode, Version};
    use std::sync::Arc;

    fn post_request(content_type: &str, body: &'static [u8]) -> HttpRequest {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", content_type.parse().expect("valid value"));
        HttpRequest::new(
            Method::POST,
            "/notify".parse().expect("valid uri"),
            Version::HTTP_11,
            headers,
            Bytes::from_static(body),
            "127.0.0.1:4000".parse().expect("valid addr"),
        )
    }

    struct BodyEcho;

    impl Handler for BodyEcho {
        fn call<'a>(
            &'a self,
            _req: &'a HttpRequest,
            ctx: &'a mut Context,
        ) -> BoxFuture<'a, HttpResponse> {
            Box::pin(async move {
                match &ctx.body {
                    Some(ParsedBody::Form(fields)) => {
                        response::text(fields.get("email").cloned().unwrap_or_default())
                    }
                    Some(ParsedBody::Json(value)) => response::text(value.to_string()),
                    None => response::text("no body"),
                }
            })
        }
    }

    async fn run(req: &HttpRequest) -> (HttpResponse, Context) {
        let mut ctx = Context::new(req.remote_addr());
        let chain: Vec<Arc<dyn crate::middleware::Middleware>> = Vec::new();
        let handler = BodyEcho;
        let response = BodyParser
            .handle(req, &mut ctx, Next::new(&chain, &handler))
            .await;
        (response, ctx)
    }

    #[tokio::test]
    async fn test_form_body() {
        let req = post_request(
            "application/x-www-form-urlencoded",
            b"email=a%40example.com&plan=free",
        );
        let (response, ctx) = run(&req).await;
        assert_eq!(response.status(), StatusCode::OK);
        match ctx.body {
            Some(ParsedBody::Form(fields)) => {
                assert_eq!(fields.get("email"), Some(&"a@example.com".to_string()));
                assert_eq!(fields.get("plan"), Some(&"free".to_string()));
            }
            other => panic!("expected form body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_json_body() {
        let req = post_request("application/json; charset=utf-8", b"{\"email\":\"a@b.c\"}");
        let (response, ctx) = run(&req).await;
        assert_eq!(response.status(), StatusCode::OK);
        match ctx.body {
            Some(ParsedBody::Json(value)) => assert_eq!(value["email"], "a@b.c"),
            other => panic!("expected json body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let req = post_request("application/json", b"{not json");
        let (response, ctx) = run(&req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(ctx.body.is_none());
    }

    #[tokio::test]
    async fn test_unknown_content_type_passes_through() {
        let req = post_request("text/csv", b"a,b,c");
        let (response, ctx) = run(&req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(ctx.body.is_none());
    }
}
