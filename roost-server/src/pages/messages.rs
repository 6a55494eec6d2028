use axum::extract::State;
use axum::response::Redirect;
use axum::{Form, Router};
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::routing::{RouterExt, TypedPath};
use chrono_humanize::HumanTime;
use maud::html;
use roost_core::error::RoostResult;
use roost_core::request_helper::HtmlResponse;
use roost_core::session::Authenticated;
use roost_core::state::{Flash, RoostRequestState, RoostState};
use roost_models::{ConversationView, Message, UserRole};

use crate::pages::common::flash::{clear_flash, put_flash};
use crate::pages::common::frontmatter::app;

const PREVIEW_CHARS: usize = 80;

pub fn message_pages(r: Router<RoostState>) -> Router<RoostState> {
    r.typed_get(list_conversations)
        .typed_get(broadcast_form)
        .typed_post(broadcast_post)
        .typed_get(show_thread)
        .typed_post(send_message)
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/messages")]
pub struct PathMessages;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/messages/broadcast")]
pub struct PathBroadcast;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/messages/with/:user")]
pub struct PathMessagesWith {
    pub user: i64,
}

fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_CHARS {
        body.to_string()
    } else {
        format!(
            "{}…",
            body.chars().take(PREVIEW_CHARS).collect::<String>()
        )
    }
}

#[instrument(skip_all)]
pub async fn list_conversations(
    _: PathMessages,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let view = ConversationView::load(state.client(), &ctx).await;

    let body = html! {
        h1 { "Messages" }
        @if view.has_unread {
            .unread-banner { "You have unread messages" }
        }
        @if view.conversations.is_empty() {
            p { "No conversations yet." }
        }
        ul.conversations {
            @for convo in &view.conversations {
                li {
                    a href=(PathMessagesWith { user: convo.counterparty }.to_uri().to_string()) {
                        b { (convo.counterparty_name) }
                    }
                    @if convo.unread > 0 {
                        " " span.badge { (convo.unread) }
                    }
                    br;
                    (preview(&convo.last_message))
                    @if convo.last_automated {
                        " " span.badge { "auto" }
                    }
                    " — "
                    em { (HumanTime::from(convo.last_message_at)) }
                }
            }
        }
    };
    let page = app(&rstate, Some("Messages".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[instrument(skip_all)]
pub async fn show_thread(
    PathMessagesWith { user }: PathMessagesWith,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let client = state.client();

    let inbox = Message::inbox(client, &ctx).await.unwrap_or_else(|e| {
        warn!("inbox fetch failed, rendering partial thread: {}", e);
        Vec::new()
    });
    let sent = Message::sent(client, &ctx).await.unwrap_or_else(|e| {
        warn!("sent fetch failed, rendering partial thread: {}", e);
        Vec::new()
    });

    let unseen = inbox
        .iter()
        .any(|m| !m.read && m.counterparty(ctx.viewer) == Some(user));

    let mut messages = inbox;
    messages.extend(sent);
    let thread = Message::thread_between(&messages, ctx.viewer, user);

    let name = client
        .display_name(&ctx, user)
        .await
        .unwrap_or_else(|| format!("User {}", user));

    if unseen {
        // the read flag lives upstream; losing this call only delays the flip
        if let Err(e) = Message::mark_thread_read(client, &ctx, user).await {
            debug!("could not mark thread with {} read: {}", user, e);
        }
    }

    let body = html! {
        h1 { "Conversation with " (name) }
        @if thread.is_empty() {
            p { "No messages yet. Say hello." }
        }
        .thread {
            @for message in &thread {
                @if message.sender == ctx.viewer {
                    .message--self {
                        (message.body)
                        br;
                        em { (HumanTime::from(message.sent_at)) }
                    }
                } @else {
                    .message--other {
                        (message.body)
                        @if message.automated {
                            " " span.badge { "auto" }
                        }
                        br;
                        em { (HumanTime::from(message.sent_at)) }
                    }
                }
            }
        }
        form action=(PathMessagesWith { user }.to_uri().to_string()) method="POST" {
            .field {
                textarea name="body" required="true" placeholder="Write a message" {}
            }
            .actions {
                button.button type="submit" { "Send" }
            }
        }
        p { a href=(PathMessages.to_uri().to_string()) { "Back to all conversations" } }
    };
    let page = app(&rstate, Some(name), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[derive(serde::Deserialize, Debug)]
pub struct MessageForm {
    pub body: String,
}

#[instrument(skip_all)]
pub async fn send_message(
    PathMessagesWith { user }: PathMessagesWith,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<MessageForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    let ctx = rstate.api_context()?;
    let body = form.body.trim();
    let jar = if body.is_empty() {
        put_flash(
            rstate.jar,
            state.config(),
            Flash::warning("Cannot send an empty message"),
        )
    } else {
        match Message::send(state.client(), &ctx, user, body).await {
            Ok(()) => put_flash(rstate.jar, state.config(), Flash::alert("Message sent")),
            Err(e) => {
                warn!("sending message to {} failed: {}", user, e);
                put_flash(
                    rstate.jar,
                    state.config(),
                    Flash::error("Could not send your message, try again"),
                )
            }
        }
    };
    Ok((
        jar,
        Redirect::to(&PathMessagesWith { user }.to_uri().to_string()),
    ))
}

#[instrument(skip_all)]
pub async fn broadcast_form(
    _: PathBroadcast,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    rstate.require_role(&[UserRole::Admin])?;
    let body = html! {
        h1 { "Send an announcement" }
        p { "Announcements reach every user, or every user in one role. They do not start conversations." }
        form action=(PathBroadcast.to_uri().to_string()) method="POST" {
            .field {
                select name="target_role" {
                    option value="" { "Everyone" }
                    option value=(UserRole::Tenant.as_str()) { "Tenants" }
                    option value=(UserRole::Manager.as_str()) { "Managers" }
                }
            }
            .field {
                textarea name="body" required="true" placeholder="What should everyone know?" {}
            }
            .actions {
                button.button type="submit" { "Announce" }
            }
        }
    };
    let page = app(&rstate, Some("Announcement".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[derive(serde::Deserialize, Debug)]
pub struct BroadcastForm {
    pub target_role: String,
    pub body: String,
}

#[instrument(skip_all)]
pub async fn broadcast_post(
    _: PathBroadcast,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<BroadcastForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(&[UserRole::Admin])?;
    let ctx = rstate.api_context()?;
    let target = form.target_role.parse::<UserRole>().ok();
    Message::broadcast(state.client(), &ctx, target, form.body.trim()).await?;
    let jar = put_flash(rstate.jar, state.config(), Flash::alert("Announcement sent"));
    Ok((jar, Redirect::to(&PathMessages.to_uri().to_string())))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_bodies_are_not_truncated() {
        assert_eq!(preview("hello"), "hello");
    }

    #[test]
    fn long_bodies_truncate_on_char_boundaries() {
        let body = "ä".repeat(200);
        let short = preview(&body);
        assert!(short.chars().count() <= PREVIEW_CHARS + 1);
        assert!(short.ends_with('…'));
    }
}
