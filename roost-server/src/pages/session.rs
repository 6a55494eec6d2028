use axum::extract::State;
use axum::response::Redirect;
use axum::{Form, Router};
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::routing::{RouterExt, TypedPath};
use maud::html;
use roost_core::error::RoostResult;
use roost_core::request_helper::{HtmlResponse, RoostResponse};
use roost_core::session::{Authenticated, Session, Unauthenticated};
use roost_core::state::{Flash, RoostRequestState, RoostState};
use roost_models::{RoostModelError, User};

use crate::pages::common::flash::{clear_flash, put_flash};
use crate::pages::common::frontmatter::app;
use crate::pages::dashboard::PathDashboard;

pub fn session_pages(r: Router<RoostState>) -> Router<RoostState> {
    r.typed_get(new_session)
        .typed_post(new_session_post)
        .typed_get(destroy_session)
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/sessions/login")]
pub struct PathSessionsLogin;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/sessions/logout")]
pub struct PathSessionsLogout;

#[instrument(skip_all)]
pub async fn new_session(
    _: PathSessionsLogin,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Unauthenticated>,
) -> RoostResult<(PrivateCookieJar, RoostResponse<()>)> {
    if rstate.session().is_some() {
        return Ok((
            rstate.jar,
            RoostResponse::Redirect(Redirect::to(&PathDashboard.to_uri().to_string())),
        ));
    }
    let body = html! {
        h1 { "Sign in" }

        form action=(PathSessionsLogin.to_uri().to_string()) method="POST" {
            .field {
                input.input #user_email name="email" type="email" required="true" placeholder="Email" autofocus="true";
            }

            .field {
                input.input #user_password name="password" type="password" required="true" placeholder="Password";
            }

            .actions {
                button.button type="submit" { "Sign in" }
            }
        }

        p {
            "Your landlord or property manager creates accounts; there is no self-registration."
        }
    };
    let page = app(&rstate, Some("Sign in".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, RoostResponse::Html(HtmlResponse::from(page))))
}

#[derive(serde::Deserialize)]
pub struct NewSessionForm {
    email: String,
    password: String,
}

#[instrument(skip_all)]
pub async fn new_session_post(
    _: PathSessionsLogin,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Unauthenticated>,
    Form(login_data): Form<NewSessionForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    trace!("requesting new session, verifying user upstream");
    match User::login(state.client(), &login_data.email, &login_data.password).await {
        Ok((token, user)) => {
            let session = Session::new(token, &user, state.config().session_ttl());
            let jar = session.store(rstate.jar, &state.config().session_cookie)?;
            let jar = put_flash(jar, state.config(), Flash::alert("Login successfull!"));
            Ok((jar, Redirect::to(&PathDashboard.to_uri().to_string())))
        }
        Err(RoostModelError::Unauthorized) => {
            trace!("upstream rejected credentials");
            let jar = put_flash(
                rstate.jar,
                state.config(),
                Flash::alert("User or password incorrect"),
            );
            Ok((jar, Redirect::to(&PathSessionsLogin.to_uri().to_string())))
        }
        Err(e) => {
            warn!("could not reach the platform API for login: {}", e);
            let jar = put_flash(
                rstate.jar,
                state.config(),
                Flash::error("The platform is unavailable right now, try again in a moment"),
            );
            Ok((jar, Redirect::to(&PathSessionsLogin.to_uri().to_string())))
        }
    }
}

#[instrument(skip_all)]
pub async fn destroy_session(
    _: PathSessionsLogout,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    if let Ok(ctx) = rstate.api_context() {
        // the cookie is gone either way, revocation is best-effort
        if let Err(e) = User::logout(state.client(), &ctx).await {
            debug!("upstream token revocation failed: {}", e);
        }
    }
    let jar = Session::clear(rstate.jar, &state.config().session_cookie);
    let jar = put_flash(jar, state.config(), Flash::info("You have been logged out"));
    Ok((jar, Redirect::to(&PathSessionsLogin.to_uri().to_string())))
}
