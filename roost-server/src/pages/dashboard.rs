use std::collections::BTreeSet;

use axum::extract::State;
use axum::Router;
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::routing::{RouterExt, TypedPath};
use chrono_humanize::HumanTime;
use maud::{html, Markup};
use roost_core::error::{RoostError, RoostResult};
use roost_core::request_helper::HtmlResponse;
use roost_core::session::Authenticated;
use roost_core::state::{RoostRequestState, RoostState};
use roost_models::{
    ApiContext, Client, ConversationView, Lease, LeaseStatus, MaintenanceTicket, Message, Payment,
    Property, PropertyStatus, TicketStatus, UserRole,
};

use crate::pages::common::flash::clear_flash;
use crate::pages::common::frontmatter::app;

pub fn dashboard_pages(r: Router<RoostState>) -> Router<RoostState> {
    r.typed_get(dashboard)
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/")]
pub struct PathDashboard;

#[instrument(skip_all)]
pub async fn dashboard(
    _: PathDashboard,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let role = rstate.role().ok_or(RoostError::AccessDenied)?;
    let body = match role {
        UserRole::Admin => admin_dashboard(state.client(), &ctx).await?,
        UserRole::Manager => manager_dashboard(state.client(), &ctx).await?,
        UserRole::Tenant => tenant_dashboard(state.client(), &ctx).await?,
    };
    let page = app(&rstate, None, body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

fn unread_banner(view: &ConversationView) -> Markup {
    html! {
        @if view.has_unread {
            .unread-banner {
                a href="/messages" { "You have unread messages" }
            }
        }
    }
}

/// Broadcast messages surface as announcements; they are excluded from the
/// conversation list by design.
fn announcement_list(inbox: &[Message]) -> Markup {
    let mut announcements: Vec<&Message> = inbox.iter().filter(|m| m.broadcast).collect();
    announcements.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    html! {
        h2 { "Announcements" }
        @if announcements.is_empty() {
            p { "Nothing new." }
        }
        ul.announcements {
            @for message in announcements.iter().take(5) {
                li {
                    (message.body)
                    " — "
                    em { (HumanTime::from(message.sent_at)) }
                }
            }
        }
    }
}

async fn admin_dashboard(client: &Client, ctx: &ApiContext) -> RoostResult<Markup> {
    let properties = Property::all(client, ctx).await?;
    let tickets = MaintenanceTicket::all(client, ctx).await?;
    let view = ConversationView::load(client, ctx).await;
    let inbox = Message::inbox(client, ctx).await.unwrap_or_default();

    let vacant = properties
        .iter()
        .filter(|p| p.status == PropertyStatus::Vacant)
        .count();
    let occupied = properties
        .iter()
        .filter(|p| p.status == PropertyStatus::Occupied)
        .count();
    let open_tickets = tickets
        .iter()
        .filter(|t| t.status != TicketStatus::Resolved)
        .count();

    Ok(html! {
        h1 { "Portfolio overview" }
        (unread_banner(&view))
        ul.stats {
            li { b { (properties.len()) } " properties, " (vacant) " vacant, " (occupied) " occupied" }
            li { b { (open_tickets) } " open maintenance tickets" }
            li { b { (view.conversations.len()) } " active conversations" }
        }
        p {
            a href="/properties" { "Manage properties" }
            " · "
            a href="/messages/broadcast" { "Send an announcement" }
        }
        (announcement_list(&inbox))
    })
}

async fn manager_dashboard(client: &Client, ctx: &ApiContext) -> RoostResult<Markup> {
    let properties = Property::all(client, ctx).await?;
    let tickets = MaintenanceTicket::all(client, ctx).await?;
    let view = ConversationView::load(client, ctx).await;

    let managed: Vec<&Property> = properties
        .iter()
        .filter(|p| p.manager_id == ctx.viewer)
        .collect();
    let managed_ids: BTreeSet<i64> = managed.iter().map(|p| p.id).collect();
    let open_tickets: Vec<&MaintenanceTicket> = tickets
        .iter()
        .filter(|t| t.status != TicketStatus::Resolved && managed_ids.contains(&t.property_id))
        .collect();

    Ok(html! {
        h1 { "Your portfolio" }
        (unread_banner(&view))
        ul.stats {
            li { b { (managed.len()) } " properties under management" }
            li { b { (open_tickets.len()) } " open maintenance tickets" }
        }
        h2 { "Open maintenance" }
        @if open_tickets.is_empty() {
            p { "No open tickets. Enjoy the quiet." }
        }
        ul {
            @for ticket in open_tickets.iter().take(10) {
                li {
                    b { (ticket.title) }
                    " (property " (ticket.property_id) ", "
                    (ticket.status) ", opened "
                    (HumanTime::from(ticket.opened_at)) ")"
                }
            }
        }
        p { a href="/maintenance" { "All maintenance" } }
    })
}

async fn tenant_dashboard(client: &Client, ctx: &ApiContext) -> RoostResult<Markup> {
    let leases = Lease::all(client, ctx).await?;
    let payments = Payment::all(client, ctx).await?;
    let view = ConversationView::load(client, ctx).await;
    let inbox = Message::inbox(client, ctx).await.unwrap_or_default();

    let active_lease = leases.iter().find(|l| l.status == LeaseStatus::Active);
    let next_due = Payment::next_due(&payments);

    Ok(html! {
        h1 { "Welcome home" }
        (unread_banner(&view))
        @match active_lease {
            Some(lease) => {
                p {
                    "Your lease on property " (lease.property_id)
                    " runs until " (lease.ends_on)
                    " at " (lease.rent_display()) " per month."
                }
            },
            None => {
                p { "You have no active lease on file. If that seems wrong, message your property manager." }
            }
        }
        @if let Some(payment) = next_due {
            p.payment-due {
                "Next payment of " (payment.amount_display())
                " due on " (payment.due_on)
                " (" (payment.status) ")"
            }
        }
        p {
            a href="/maintenance/new" { "Report a problem" }
            " · "
            a href="/messages" { "Message your manager" }
        }
        (announcement_list(&inbox))
    })
}
