use axum::http::{StatusCode, Uri};
use maud::{html, Markup};
use roost_core::error::RoostError;
use roost_core::request_helper::HtmlResponse;

pub mod common;
pub mod dashboard;
pub mod leases;
pub mod maintenance;
pub mod messages;
pub mod payments;
pub mod properties;
pub mod session;

pub async fn error_page(err: &RoostError) -> Markup {
    let error = err.to_string();
    html! {
        (maud::DOCTYPE)
        html {
            body {
                div.error.wrapper {
                    h1.error.title { "An error occured while processing your request" }
                    main {
                        (error)
                    }
                    p { a href="/" { "Back to the dashboard" } }
                }
            }
        }
    }
}

pub async fn not_found_page(uri: Uri) -> (StatusCode, HtmlResponse) {
    debug!("no route for {:?}", uri.path());
    let page = error_page(&RoostError::PageNotFound(uri.path().to_string())).await;
    (StatusCode::NOT_FOUND, page.into_string().into())
}
