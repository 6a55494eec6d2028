use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::Redirect;
use axum::{Form, Router};
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::routing::{RouterExt, TypedPath};
use chrono::NaiveDate;
use maud::{html, Markup};
use roost_core::error::RoostResult;
use roost_core::request_helper::HtmlResponse;
use roost_core::session::Authenticated;
use roost_core::state::{Flash, RoostRequestState, RoostState};
use roost_models::api::v1::LeaseParamsV1;
use roost_models::{ApiContext, Client, Lease, LeaseStatus, UserRole};

use crate::pages::common::flash::{clear_flash, put_flash};
use crate::pages::common::frontmatter::app;
use crate::pages::properties::PathShowProperty;

const MANAGING_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

pub fn lease_pages(r: Router<RoostState>) -> Router<RoostState> {
    r.typed_get(list_leases)
        .typed_post(create_lease)
        .typed_get(new_lease)
        .typed_post(terminate_lease)
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/leases")]
pub struct PathLeases;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/leases/new")]
pub struct PathNewLease;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/leases/:id/terminate")]
pub struct PathTerminateLease {
    pub id: i64,
}

/// One cached directory lookup per distinct tenant on the page.
async fn tenant_names(
    client: &Client,
    ctx: &ApiContext,
    leases: &[Lease],
) -> BTreeMap<i64, String> {
    let mut names = BTreeMap::new();
    for lease in leases {
        if !names.contains_key(&lease.tenant_id) {
            let name = client
                .display_name(ctx, lease.tenant_id)
                .await
                .unwrap_or_else(|| format!("User {}", lease.tenant_id));
            names.insert(lease.tenant_id, name);
        }
    }
    names
}

#[instrument(skip_all)]
pub async fn list_leases(
    _: PathLeases,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let leases = Lease::all(state.client(), &ctx).await?;
    let names = tenant_names(state.client(), &ctx, &leases).await;
    let can_manage = rstate
        .role()
        .map(|r| r.manages_portfolio())
        .unwrap_or(false);

    let body = html! {
        h1 { "Leases" }
        table.listing {
            thead {
                tr {
                    th { "Property" }
                    th { "Tenant" }
                    th { "Term" }
                    th { "Rent" }
                    th { "Status" }
                    @if can_manage { th { "" } }
                }
            }
            tbody {
                @for lease in &leases {
                    tr {
                        td {
                            a href=(PathShowProperty { id: lease.property_id }.to_uri().to_string()) {
                                "Property " (lease.property_id)
                            }
                        }
                        td { (names.get(&lease.tenant_id).map(|n| n.as_str()).unwrap_or("?")) }
                        td { (lease.starts_on) " → " (lease.ends_on) }
                        td { (lease.rent_display()) }
                        td { (lease.status) }
                        @if can_manage {
                            td {
                                @if lease.status == LeaseStatus::Active {
                                    form action=(PathTerminateLease { id: lease.id }.to_uri().to_string()) method="POST" {
                                        button.button type="submit" { "Terminate" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        @if can_manage {
            p { a href=(PathNewLease.to_uri().to_string()) { "New lease" } }
        }
    };
    let page = app(&rstate, Some("Leases".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

fn lease_form() -> Markup {
    html! {
        form action=(PathLeases.to_uri().to_string()) method="POST" {
            .field { input name="property_id" type="number" required="true" placeholder="Property ID"; }
            .field { input name="tenant_id" type="number" required="true" placeholder="Tenant ID"; }
            .field { label { "Starts " input name="starts_on" type="date" required="true"; } }
            .field { label { "Ends " input name="ends_on" type="date" required="true"; } }
            .field { input name="rent" type="number" required="true" placeholder="Monthly rent (dollars)"; }
            .field { input name="deposit" type="number" required="true" placeholder="Deposit (dollars)"; }
            .actions { button.button type="submit" { "Create lease" } }
        }
    }
}

#[instrument(skip_all)]
pub async fn new_lease(
    _: PathNewLease,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    rstate.require_role(MANAGING_ROLES)?;
    let body = html! {
        h1 { "New lease" }
        (lease_form())
    };
    let page = app(&rstate, Some("New lease".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[derive(serde::Deserialize, Debug)]
pub struct LeaseForm {
    pub property_id: i64,
    pub tenant_id: i64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    /// whole dollars as typed into the form
    pub rent: i64,
    pub deposit: i64,
}

#[instrument(skip_all)]
pub async fn create_lease(
    _: PathLeases,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<LeaseForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    let params = LeaseParamsV1 {
        property_id: form.property_id,
        tenant_id: form.tenant_id,
        starts_on: form.starts_on,
        ends_on: form.ends_on,
        rent_cents: form.rent * 100,
        deposit_cents: form.deposit * 100,
    };
    Lease::create(state.client(), &ctx, &params).await?;
    let jar = put_flash(rstate.jar, state.config(), Flash::alert("Lease created"));
    Ok((jar, Redirect::to(&PathLeases.to_uri().to_string())))
}

#[instrument(skip_all)]
pub async fn terminate_lease(
    PathTerminateLease { id }: PathTerminateLease,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    Lease::terminate(state.client(), &ctx, id).await?;
    let jar = put_flash(rstate.jar, state.config(), Flash::alert("Lease terminated"));
    Ok((jar, Redirect::to(&PathLeases.to_uri().to_string())))
}
