use axum::headers::{ContentType, HeaderMapExt};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoostError {
    #[error("Upstream API Error: {0}")]
    Model(#[from] roost_models::RoostModelError),
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Serde: JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Envy Error: {0}")]
    Envy(#[from] envy::Error),
    #[error("Could not parse URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Ring: Unspecified: {0}")]
    RingUnspec(#[from] ring::error::Unspecified),
    #[error("Ring: Key Rejected: {0}")]
    RingKR(#[from] ring::error::KeyRejected),
    #[error("Could not join thread: {0}")]
    JoinError(#[from] tokio::task::JoinError),
    #[error("Access has been denied")]
    AccessDenied,
    #[error("The page located under {0:?} could not be found")]
    PageNotFound(String),
    #[error("Configuration Variable Unset: {0}")]
    ConfigurationUnset(String),
    #[error("Other Error: {0:?}")]
    Other(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type RoostResult<T> = std::result::Result<T, RoostError>;

impl RoostError {
    /// A stale or missing credential; the only sane answer is the login page.
    fn wants_login(&self) -> bool {
        matches!(
            self,
            RoostError::AccessDenied
                | RoostError::Model(roost_models::RoostModelError::Unauthorized)
        )
    }
}

fn html_error(status: StatusCode, title: &str, detail: &str) -> Response {
    let c = maud::html! {
        (maud::DOCTYPE)
        html {
            body {
                div.error.wrapper {
                    h1.error.title { (title) }
                    main { (detail) }
                    p { a href="/" { "Back to the dashboard" } }
                }
            }
        }
    };
    let mut hm = HeaderMap::new();
    hm.typed_insert(ContentType::html());
    (status, hm, c.into_string()).into_response()
}

impl IntoResponse for RoostError {
    fn into_response(self) -> Response {
        if self.wants_login() {
            trace!("rejecting request towards login page: {}", self);
            return Redirect::to("/sessions/login").into_response();
        }
        match self {
            RoostError::PageNotFound(_) | RoostError::Model(roost_models::RoostModelError::NotFound { .. }) => html_error(
                StatusCode::NOT_FOUND,
                "Page not found",
                &self.to_string(),
            ),
            _ => {
                error!("Error presented to user: {:?}", self);
                html_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occured while processing your request",
                    &self.to_string(),
                )
            }
        }
    }
}
