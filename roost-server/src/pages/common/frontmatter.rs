use axum::headers::{HeaderMapExt, UserAgent};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use roost_core::error::RoostResult;
use roost_core::package_full;
use roost_core::session::SessionMode;
use roost_core::state::{Flash, RoostRequestState};
use roost_models::UserRole;

const STYLESHEET: &str = r#"
body { font-family: sans-serif; margin: 0; color: #222; }
nav#header { background: #2b4162; padding: 0.5em 1em; }
nav#header a { color: #fff; margin-right: 1em; text-decoration: none; }
nav#header span.user { color: #cdd7e4; margin-right: 1em; }
main#content { padding: 1em; }
.flash { padding: 0.5em 1em; margin: 0; }
.flash--info { background: #dbe9f6; }
.flash--alert { background: #e7f6db; }
.flash--warning { background: #f6eedb; }
.flash--error { background: #f6dbdb; }
.unread-banner { background: #f6eedb; padding: 0.5em 1em; margin-bottom: 1em; }
table.listing { border-collapse: collapse; }
table.listing th, table.listing td { border: 1px solid #ccc; padding: 0.3em 0.6em; }
.message--self { text-align: right; background: #e8f0e8; margin: 0.2em 0; padding: 0.3em; }
.message--other { text-align: left; background: #eee; margin: 0.2em 0; padding: 0.3em; }
.badge { background: #2b4162; color: #fff; border-radius: 0.6em; padding: 0 0.5em; font-size: 0.8em; }
nav.pagination a, nav.pagination span { margin-right: 0.4em; }
footer { color: #888; font-size: 0.8em; padding: 1em; }
"#;

pub fn viewport_meta_tags<T: SessionMode>(rstate: &RoostRequestState<T>) -> Markup {
    let mobile_uas = ["Mobile", "webOS"];
    if let Some(value) = rstate.headers.typed_get::<UserAgent>() {
        for mobile_ua in &mobile_uas {
            if value.to_string().contains(mobile_ua) {
                return html! { meta name="viewport" content="width=device-width, initial-scale=1"; };
            }
        }
    }
    html! { meta name="viewport" content="width=1024, initial-scale=1"; }
}

pub fn flash_banners(flashes: &[Flash]) -> Markup {
    html! {
        @for flash in flashes {
            @if !matches!(flash, Flash::None) {
                div class=(format!("flash flash--{}", flash.kind())) { (flash.message()) }
            }
        }
    }
}

fn navigation<T: SessionMode>(rstate: &RoostRequestState<T>) -> Markup {
    html! {
        nav #header {
            a.brand href="/" { "Roost" }
            @if let Some(session) = rstate.session() {
                a href="/properties" { "Properties" }
                a href="/leases" { "Leases" }
                a href="/maintenance" { "Maintenance" }
                a href="/payments" { "Payments" }
                a href="/messages" { "Messages" }
                @if session.role() == UserRole::Admin {
                    a href="/messages/broadcast" { "Announce" }
                }
                span.user { (session.display_name()) " (" (session.role()) ")" }
                a href="/sessions/logout" { "Logout" }
            } @else {
                a href="/sessions/login" { "Sign in" }
            }
        }
    }
}

/// The shared application frame around every page body.
pub async fn app<T: SessionMode>(
    rstate: &RoostRequestState<T>,
    page_title: Option<String>,
    body: Markup,
) -> RoostResult<Markup> {
    let title = match page_title {
        Some(title) => format!("{} - Roost", title),
        None => "Roost".to_string(),
    };
    Ok(html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                (viewport_meta_tags(rstate))
                title { (title) }
                style { (PreEscaped(STYLESHEET)) }
            }
            body {
                (navigation(rstate))
                (flash_banners(&rstate.flash))
                main #content {
                    (body)
                }
                footer {
                    (package_full())
                    " · rendered in "
                    (format!("{:.1?}", rstate.started_at.elapsed()))
                }
            }
        }
    })
}
