use axum::extract::State;
use axum::response::Redirect;
use axum::{Form, Router};
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::routing::{RouterExt, TypedPath};
use chrono_humanize::HumanTime;
use maud::html;
use roost_core::error::{RoostError, RoostResult};
use roost_core::request_helper::HtmlResponse;
use roost_core::session::Authenticated;
use roost_core::state::{Flash, RoostRequestState, RoostState};
use roost_models::api::v1::TicketParamsV1;
use roost_models::{MaintenanceTicket, Property, TicketStatus, UserRole};

use crate::pages::common::flash::{clear_flash, put_flash};
use crate::pages::common::frontmatter::app;

const MANAGING_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

pub fn maintenance_pages(r: Router<RoostState>) -> Router<RoostState> {
    r.typed_get(list_tickets)
        .typed_post(create_ticket)
        .typed_get(new_ticket)
        .typed_post(set_ticket_status)
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/maintenance")]
pub struct PathMaintenance;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/maintenance/new")]
pub struct PathNewTicket;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/maintenance/:id/status")]
pub struct PathTicketStatus {
    pub id: i64,
}

#[instrument(skip_all)]
pub async fn list_tickets(
    _: PathMaintenance,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let mut tickets = MaintenanceTicket::all(state.client(), &ctx).await?;
    tickets.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
    let can_manage = rstate
        .role()
        .map(|r| r.manages_portfolio())
        .unwrap_or(false);

    let body = html! {
        h1 { "Maintenance" }
        table.listing {
            thead {
                tr {
                    th { "Ticket" }
                    th { "Property" }
                    th { "Status" }
                    th { "Opened" }
                    @if can_manage { th { "" } }
                }
            }
            tbody {
                @for ticket in &tickets {
                    tr {
                        td {
                            b { (ticket.title) }
                            br;
                            (ticket.detail)
                        }
                        td { "Property " (ticket.property_id) }
                        td { (ticket.status) }
                        td { (HumanTime::from(ticket.opened_at)) }
                        @if can_manage {
                            td {
                                @for next in ticket.status.transitions() {
                                    form action=(PathTicketStatus { id: ticket.id }.to_uri().to_string()) method="POST" {
                                        input type="hidden" name="status" value=(next.as_str());
                                        button.button type="submit" { "Mark " (next) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        p { a href=(PathNewTicket.to_uri().to_string()) { "Report a problem" } }
    };
    let page = app(&rstate, Some("Maintenance".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[instrument(skip_all)]
pub async fn new_ticket(
    _: PathNewTicket,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    // the API scopes this to properties the viewer can file against
    let properties = Property::all(state.client(), &ctx).await?;
    let body = html! {
        h1 { "Report a problem" }
        form action=(PathMaintenance.to_uri().to_string()) method="POST" {
            .field {
                select name="property_id" {
                    @for property in &properties {
                        option value=(property.id) { (property.address) ", " (property.city) }
                    }
                }
            }
            .field {
                input name="title" type="text" required="true" placeholder="What is broken?";
            }
            .field {
                textarea name="detail" required="true" placeholder="Tell us more" {}
            }
            .actions {
                button.button type="submit" { "File ticket" }
            }
        }
    };
    let page = app(&rstate, Some("Report a problem".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[derive(serde::Deserialize, Debug)]
pub struct TicketForm {
    pub property_id: i64,
    pub title: String,
    pub detail: String,
}

#[instrument(skip_all)]
pub async fn create_ticket(
    _: PathMaintenance,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<TicketForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    let ctx = rstate.api_context()?;
    let params = TicketParamsV1 {
        property_id: form.property_id,
        title: form.title,
        detail: form.detail,
    };
    MaintenanceTicket::create(state.client(), &ctx, &params).await?;
    let jar = put_flash(
        rstate.jar,
        state.config(),
        Flash::alert("Ticket filed, someone will take a look"),
    );
    Ok((jar, Redirect::to(&PathMaintenance.to_uri().to_string())))
}

#[derive(serde::Deserialize, Debug)]
pub struct TicketStatusForm {
    pub status: String,
}

#[instrument(skip_all)]
pub async fn set_ticket_status(
    PathTicketStatus { id }: PathTicketStatus,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<TicketStatusForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    let status: TicketStatus = form.status.parse().map_err(RoostError::Model)?;
    MaintenanceTicket::set_status(state.client(), &ctx, id, status).await?;
    let jar = put_flash(
        rstate.jar,
        state.config(),
        Flash::alert(format!("Ticket moved to {}", status)),
    );
    Ok((jar, Redirect::to(&PathMaintenance.to_uri().to_string())))
}
