use axum::extract::{Form, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use crate::error::Error;
use crate::pages::{self, ContentPage, ErrorPage, IndexPage, ReadPage, ResultPage};
use crate::store::{keys, model::Item, repository, ConsumeForm, CreateForm};
use crate::{version_text, AppState};

/// Length of a record key in the URL path; anything else is a 404
/// before the store is ever queried.
const KEY_HEX_LEN: usize = 2 * keys::KEY_BYTES;

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn index(State(state): State<AppState>) -> Response {
    pages::render(
        StatusCode::OK,
        IndexPage {
            max_times: state.limits.max_times,
        },
    )
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CreateForm>,
) -> Response {
    let item = match form.into_item(state.limits) {
        Ok(item) => item,
        Err(e) => return error_response(e),
    };

    let mut conn = match state.pool.get().await {
        Ok(conn) => conn,
        Err(e) => return error_response(e.into()),
    };
    match repository::save(&mut conn, item, state.key.as_bytes()).await {
        Ok(item) => {
            info!(key = %item.key, ttl = item.ttl, times = item.times, "secret created");
            let url = share_url(&headers, &item.key, state.secure);
            pages::render(StatusCode::OK, ResultPage { url })
        }
        Err(e) => error_response(e),
    }
}

// ── Fetch / consume ───────────────────────────────────────────────────────────

pub async fn prompt(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    if key.len() != KEY_HEX_LEN {
        return error_response(Error::NotFound);
    }
    let mut conn = match state.pool.get().await {
        Ok(conn) => conn,
        Err(e) => return error_response(e.into()),
    };
    match repository::exists(&mut conn, &key).await {
        Ok(true) => pages::render(StatusCode::OK, ReadPage { failed: false }),
        Ok(false) => error_response(Error::NotFound),
        Err(e) => error_response(e),
    }
}

pub async fn consume(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Form(form): Form<ConsumeForm>,
) -> Response {
    if key.len() != KEY_HEX_LEN {
        return error_response(Error::NotFound);
    }
    let mut conn = match state.pool.get().await {
        Ok(conn) => conn,
        Err(e) => return error_response(e.into()),
    };

    let password = form.password.unwrap_or_default();
    match read_secret(&mut conn, &state, &key, password).await {
        Ok(item) => {
            info!(key = %item.key, remaining = item.times, "secret delivered");
            pages::render(
                StatusCode::OK,
                ContentPage {
                    content: item.content.clone(),
                },
            )
        }
        Err(Error::WrongPassword) => {
            info!(key = %key, "failed password");
            pages::render(StatusCode::BAD_REQUEST, ReadPage { failed: true })
        }
        Err(e) => error_response(e),
    }
}

/// Verifier gate followed by the quota-claiming read.
async fn read_secret(
    conn: &mut deadpool_redis::Connection,
    state: &AppState,
    key: &str,
    password: String,
) -> Result<Item, Error> {
    if !repository::exists(conn, key).await? {
        return Err(Error::NotFound);
    }
    if !repository::check_password(conn, key, &password).await? {
        return Err(Error::WrongPassword);
    }
    let item = Item::for_read(key.to_owned(), password);
    match repository::read(conn, &item, state.key.as_bytes()).await? {
        Some(item) => Ok(item),
        // A concurrent reader claimed the last quota between our checks.
        None => Err(Error::NotFound),
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

pub async fn version(State(state): State<AppState>) -> Response {
    let db_ok = match state.pool.get().await {
        Ok(mut conn) => repository::is_ok(&mut conn).await,
        Err(_) => false,
    };
    (
        StatusCode::OK,
        format!("{}\nDb is OK: {db_ok}\n", version_text()),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    error_response(Error::NotFound)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Absolute URL for a saved record, built from the request's Host header
/// and the configured scheme hint.
fn share_url(headers: &HeaderMap, key: &str, secure: bool) -> String {
    let scheme = if secure { "https" } else { "http" };
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}/{key}")
}

/// Map a service error onto an HTML response. Internal details never
/// reach the page.
fn error_response(e: Error) -> Response {
    match e {
        Error::Validation(msg) => {
            info!(error = %msg, "rejected create request");
            pages::render(StatusCode::BAD_REQUEST, ErrorPage::bad_request())
        }
        Error::NotFound => pages::render(StatusCode::NOT_FOUND, ErrorPage::not_found()),
        Error::WrongPassword => pages::render(StatusCode::BAD_REQUEST, ErrorPage::bad_request()),
        e => {
            error!(error = %e, "internal error");
            pages::render(StatusCode::INTERNAL_SERVER_ERROR, ErrorPage::internal())
        }
    }
}
