use axum::headers::{ContentType, HeaderMapExt};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};

use crate::error::RoostError;

pub enum RoostResponse<T: IntoResponse> {
    Html(HtmlResponse),
    Redirect(Redirect),
    Error(RoostError),
    Other(T),
}

impl<T> IntoResponse for RoostResponse<T>
where
    T: IntoResponse,
{
    fn into_response(self) -> axum::response::Response {
        match self {
            RoostResponse::Html(h) => h.into_response(),
            RoostResponse::Redirect(r) => r.into_response(),
            RoostResponse::Error(e) => e.into_response(),
            RoostResponse::Other(v) => v.into_response(),
        }
    }
}

pub struct HtmlResponse {
    pub content: String,
}

impl IntoResponse for HtmlResponse {
    fn into_response(self) -> axum::response::Response {
        let mut hm = HeaderMap::new();
        hm.typed_insert(ContentType::html());
        (hm, self.content).into_response()
    }
}

impl From<String> for HtmlResponse {
    fn from(s: String) -> Self {
        Self { content: s }
    }
}

impl From<maud::PreEscaped<String>> for HtmlResponse {
    fn from(s: maud::PreEscaped<String>) -> Self {
        Self { content: s.0 }
    }
}

pub struct RedirectResponse {
    pub redirect: Redirect,
}

impl RedirectResponse {
    pub fn new(uri: axum::http::Uri) -> Self {
        Self {
            redirect: Redirect::to(uri.to_string().as_str()),
        }
    }
}

impl IntoResponse for RedirectResponse {
    fn into_response(self) -> axum::response::Response {
        self.redirect.into_response()
    }
}
