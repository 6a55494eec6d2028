use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, HeaderMap, Uri};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use roost_models::{ApiContext, Client, UserRole};

use crate::config::Configuration;
use crate::error::{RoostError, RoostResult};
use crate::session::{Session, SessionMode};

#[derive(Clone)]
pub struct RoostState {
    pub config: Configuration,
    client: Client,
    cookie_key: Key,
}

impl RoostState {
    pub async fn new(config: Configuration) -> RoostResult<Self> {
        tracing::info!("Loading session cookie key");
        let key_path = config.session_key_path();
        let key_bytes = std::fs::read(&key_path).map_err(|e| {
            RoostError::ConfigurationUnset(format!(
                "session key {} unreadable ({}), generate one with `roost gen-keys`",
                key_path.display(),
                e
            ))
        })?;
        if key_bytes.len() < 64 {
            return Err(RoostError::ConfigurationUnset(format!(
                "session key {} must hold at least 64 bytes",
                key_path.display()
            )));
        }
        let cookie_key = Key::from(&key_bytes);
        let client = Client::new(crate::http_client(&config)?, config.api_url.clone());
        Ok(Self {
            config,
            client,
            cookie_key,
        })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl FromRef<RoostState> for Key {
    fn from_ref(state: &RoostState) -> Key {
        state.cookie_key.clone()
    }
}

/// Everything a handler needs from the incoming request: the cookie jar,
/// the parsed session, pending flash messages. Constructed per request;
/// handlers never reach into ambient state.
pub struct RoostRequestState<T: SessionMode> {
    pub jar: PrivateCookieJar,
    pub headers: HeaderMap,
    pub uri: Uri,
    session: Option<Session>,
    pub flash: Vec<Flash>,
    pub started_at: Instant,
    mode: PhantomData<T>,
}

#[async_trait]
impl<T: SessionMode> FromRequestParts<RoostState> for RoostRequestState<T> {
    type Rejection = RoostError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &RoostState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(|err: std::convert::Infallible| -> RoostError { match err {} })?;
        let session = Session::from_jar(&jar, &state.config.session_cookie);
        if T::requires_authentication() && session.is_none() {
            trace!("unauthenticated request to {}, rejecting", parts.uri);
            return Err(RoostError::AccessDenied);
        }
        let flash = jar
            .get(&state.config.flash_cookie)
            .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
            .unwrap_or_default();
        Ok(Self {
            jar,
            headers: parts.headers.clone(),
            uri: parts.uri.clone(),
            session,
            flash,
            started_at: Instant::now(),
            mode: PhantomData,
        })
    }
}

impl<T: SessionMode> RoostRequestState<T> {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The explicit context for upstream calls; absent session is a denial.
    pub fn api_context(&self) -> RoostResult<ApiContext> {
        self.session
            .as_ref()
            .map(|s| s.api_context())
            .ok_or(RoostError::AccessDenied)
    }

    pub fn role(&self) -> Option<UserRole> {
        self.session.as_ref().map(|s| s.role())
    }

    pub fn require_role(&self, allowed: &[UserRole]) -> RoostResult<()> {
        match self.role() {
            Some(role) if allowed.contains(&role) => Ok(()),
            _ => Err(RoostError::AccessDenied),
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq, Eq)]
pub enum Flash {
    Info(String),
    Alert(String),
    Error(String),
    Warning(String),
    None,
}

impl Flash {
    pub fn error<S: Into<String>>(e: S) -> Flash {
        Self::Error(e.into())
    }
    pub fn alert<S: Into<String>>(a: S) -> Flash {
        Self::Alert(a.into())
    }
    pub fn warning<S: Into<String>>(w: S) -> Flash {
        Self::Warning(w.into())
    }
    pub fn info<S: Into<String>>(i: S) -> Flash {
        Self::Info(i.into())
    }

    pub fn kind(&self) -> String {
        match self {
            Self::Info(_) => "info",
            Self::Alert(_) => "alert",
            Self::Warning(_) => "warning",
            Self::Error(_) => "error",
            Self::None => "none",
        }
        .to_string()
    }

    pub fn message(&self) -> String {
        match self {
            Self::Info(v) => v.clone(),
            Self::Alert(v) => v.clone(),
            Self::Warning(v) => v.clone(),
            Self::Error(v) => v.clone(),
            Self::None => "none".to_string(),
        }
    }
}

impl Default for Flash {
    fn default() -> Self {
        Self::None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flash_list_round_trips_through_json() {
        let flashes = vec![
            Flash::alert("Login successful!"),
            Flash::error("Upstream unavailable"),
        ];
        let encoded = serde_json::to_string(&flashes).unwrap();
        let decoded: Vec<Flash> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(flashes, decoded);
    }

    #[test]
    fn flash_kinds_match_their_constructors() {
        assert_eq!(Flash::info("x").kind(), "info");
        assert_eq!(Flash::warning("x").kind(), "warning");
        assert_eq!(Flash::alert("x").message(), "x");
    }
}
