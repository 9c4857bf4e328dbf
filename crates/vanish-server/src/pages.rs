//! HTML pages. Values interpolated into templates are auto-escaped, so
//! plaintext renders safely.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

/// Create form.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub max_times: i64,
}

/// Share link shown after a successful save.
#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultPage {
    pub url: String,
}

/// Password prompt for an existing record.
#[derive(Template)]
#[template(path = "read.html")]
pub struct ReadPage {
    /// Set after a verifier mismatch to mark the retry.
    pub failed: bool,
}

/// Decrypted plaintext, shown once.
#[derive(Template)]
#[template(path = "content.html")]
pub struct ContentPage {
    pub content: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub title: &'static str,
    pub msg: &'static str,
}

impl ErrorPage {
    pub fn not_found() -> Self {
        Self {
            title: "Not found",
            msg: "Page not found",
        }
    }

    pub fn bad_request() -> Self {
        Self {
            title: "Error",
            msg: "Bad request",
        }
    }

    pub fn internal() -> Self {
        Self {
            title: "Error",
            msg: "Sorry, it is an error",
        }
    }
}

/// Render a template with the given status code. A render failure is a
/// programming error; it is logged and collapsed to an empty 500.
pub fn render<T: Template>(code: StatusCode, tpl: T) -> Response {
    match tpl.render() {
        Ok(body) => (code, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "template render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
