//! Body decoding middleware.
//!
//! Both parsers read the body the transport already buffered and store the
//! result with [`Request::set_body`](crate::http::Request::set_body).

use crate::dispatch::{handler_fn, Handler, HttpError};
use crate::http::request::Body;

const APPLICATION_JSON: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Decode JSON bodies; other non-empty bodies are kept as text.
///
/// Requests without a body continue immediately. Malformed JSON fails with `400`.
pub fn json() -> impl Handler {
    handler_fn(|req, _res, next| {
        Box::pin(async move {
            if req.content_length().unwrap_or(0) == 0 || !req.body().is_empty() {
                return Ok(next.pass());
            }

            let text = String::from_utf8_lossy(req.raw_body()).into_owned();
            let body = if req.content_type() == Some(APPLICATION_JSON) {
                match serde_json::from_str(&text) {
                    Ok(value) => Body::Json(value),
                    Err(err) => {
                        return Ok(next.fail(HttpError::bad_request(format!(
                            "malformed JSON body: {err}"
                        ))))
                    }
                }
            } else {
                Body::Text(text)
            };

            req.set_body(body);
            Ok(next.pass())
        })
    })
}

/// Decode form bodies. Without one, a non-empty query string becomes the form.
pub fn urlencoded() -> impl Handler {
    handler_fn(|req, _res, next| {
        Box::pin(async move {
            if req.content_type() == Some(FORM_URLENCODED) {
                let form = url::form_urlencoded::parse(req.raw_body())
                    .into_owned()
                    .collect();
                req.set_body(Body::Form(form));
            } else if req.body().is_empty() && !req.query().is_empty() {
                let form = req.query().clone();
                req.set_body(Body::Form(form));
            }
            Ok(next.pass())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Completion, Router};
    use crate::http::{Request, Response};
    use axum::http::{Method, StatusCode};

    async fn run(handler: impl Handler, mut req: Request) -> (Request, Option<HttpError>) {
        let mut router = Router::new();
        router.use_handler(handler);
        let mut res = Response::for_request(&req);
        let outcome = router.dispatch(&mut req, &mut res).await;
        match outcome {
            Completion::Done(err) => (req, err),
            Completion::Halted => panic!("parser must call next"),
        }
    }

    #[tokio::test]
    async fn test_json_parses_json_bodies() {
        let req = Request::new(Method::POST, "/").with_body(APPLICATION_JSON, r#"{"name":"pen"}"#);
        let (req, err) = run(json(), req).await;
        assert!(err.is_none());
        assert_eq!(req.body().field("name"), Some("pen"));
    }

    #[tokio::test]
    async fn test_json_skips_empty_bodies_and_keeps_text() {
        let (req, err) = run(json(), Request::new(Method::GET, "/")).await;
        assert!(err.is_none());
        assert!(req.body().is_empty());

        let req = Request::new(Method::POST, "/").with_body("text/plain", "hello");
        let (req, _) = run(json(), req).await;
        assert_eq!(req.body(), &Body::Text("hello".into()));
    }

    #[tokio::test]
    async fn test_json_rejects_malformed() {
        let req = Request::new(Method::POST, "/").with_body(APPLICATION_JSON, "{nope");
        let (_, err) = run(json(), req).await;
        assert_eq!(err.unwrap().status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_urlencoded_form_and_query() {
        let req = Request::new(Method::POST, "/").with_body(FORM_URLENCODED, "name=big+cup&category=1");
        let (req, _) = run(urlencoded(), req).await;
        assert_eq!(req.body().field("name"), Some("big cup"));

        let (req, _) = run(urlencoded(), Request::new(Method::GET, "/items?name=pen")).await;
        assert_eq!(req.body().field("name"), Some("pen"));
        assert_eq!(req.path(), "/items");

        let (req, _) = run(urlencoded(), Request::new(Method::GET, "/items")).await;
        assert!(req.body().is_empty());
    }
}
