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
use roost_models::{Payment, PaymentStatus, UserRole};

use crate::pages::common::flash::{clear_flash, put_flash};
use crate::pages::common::frontmatter::app;

const MANAGING_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

pub fn payment_pages(r: Router<RoostState>) -> Router<RoostState> {
    r.typed_get(list_payments).typed_post(set_payment_status)
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/payments")]
pub struct PathPayments;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/payments/:id/status")]
pub struct PathPaymentStatus {
    pub id: i64,
}

#[instrument(skip_all)]
pub async fn list_payments(
    _: PathPayments,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let mut payments = Payment::all(state.client(), &ctx).await?;
    payments.sort_by(|a, b| b.due_on.cmp(&a.due_on));
    let can_manage = rstate
        .role()
        .map(|r| r.manages_portfolio())
        .unwrap_or(false);

    let body = html! {
        h1 { "Payments" }
        table.listing {
            thead {
                tr {
                    th { "Lease" }
                    th { "Amount" }
                    th { "Due" }
                    th { "Status" }
                    @if can_manage { th { "" } }
                }
            }
            tbody {
                @for payment in &payments {
                    tr {
                        td { "Lease " (payment.lease_id) }
                        td { (payment.amount_display()) }
                        td { (payment.due_on) }
                        td {
                            (payment.status)
                            @if let Some(paid_at) = payment.paid_at {
                                " (" (HumanTime::from(paid_at)) ")"
                            }
                        }
                        @if can_manage {
                            td {
                                @if payment.outstanding() {
                                    form action=(PathPaymentStatus { id: payment.id }.to_uri().to_string()) method="POST" {
                                        input type="hidden" name="status" value=(PaymentStatus::Paid.as_str());
                                        button.button type="submit" { "Mark paid" }
                                    }
                                } @else {
                                    form action=(PathPaymentStatus { id: payment.id }.to_uri().to_string()) method="POST" {
                                        input type="hidden" name="status" value=(PaymentStatus::Due.as_str());
                                        button.button type="submit" { "Mark unpaid" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };
    let page = app(&rstate, Some("Payments".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[derive(serde::Deserialize, Debug)]
pub struct PaymentStatusForm {
    pub status: String,
}

#[instrument(skip_all)]
pub async fn set_payment_status(
    PathPaymentStatus { id }: PathPaymentStatus,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<PaymentStatusForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    let status: PaymentStatus = form.status.parse().map_err(RoostError::Model)?;
    Payment::set_status(state.client(), &ctx, id, status).await?;
    let jar = put_flash(
        rstate.jar,
        state.config(),
        Flash::alert(format!("Payment marked {}", status)),
    );
    Ok((jar, Redirect::to(&PathPayments.to_uri().to_string())))
}
