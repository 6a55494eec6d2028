use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use roost_models::{ApiContext, User, UserRole};

/// Marker types deciding whether a request may proceed without a login.
pub trait SessionMode: Send + Sync + 'static {
    fn requires_authentication() -> bool;
}

pub struct Authenticated;
pub struct Unauthenticated;

impl SessionMode for Authenticated {
    fn requires_authentication() -> bool {
        true
    }
}

impl SessionMode for Unauthenticated {
    fn requires_authentication() -> bool {
        false
    }
}

/// The authenticated identity, carried in an encrypted client-side cookie.
///
/// Holds the platform API bearer token; everything else is a display
/// convenience resolved at login time. There is no server-side session
/// store — losing the cookie is logging out.
#[derive(serde::Serialize, serde::Deserialize, Clone, securefmt::Debug)]
pub struct Session {
    #[sensitive]
    token: String,
    user_id: i64,
    display_name: String,
    role: UserRole,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token,
            user_id: user.id,
            display_name: user.display_name(),
            role: user.role,
            created: now,
            expires: now + ttl,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn expired(&self) -> bool {
        self.expires <= Utc::now()
    }

    /// The explicit request-scoped context handed into every API call.
    pub fn api_context(&self) -> ApiContext {
        ApiContext {
            token: self.token.clone(),
            viewer: self.user_id,
        }
    }

    /// Parse the session out of the cookie jar. Expired or undecodable
    /// sessions read as "not logged in".
    pub fn from_jar(jar: &PrivateCookieJar, cookie_name: &str) -> Option<Session> {
        let cookie = jar.get(cookie_name)?;
        let session: Session = match serde_json::from_str(cookie.value()) {
            Ok(session) => session,
            Err(e) => {
                warn!("could not decode session cookie, discarding it: {}", e);
                return None;
            }
        };
        if session.expired() {
            trace!("session for user {} expired", session.user_id);
            return None;
        }
        Some(session)
    }

    /// Serialise into the jar; returned jar must ride the response.
    pub fn store(
        &self,
        jar: PrivateCookieJar,
        cookie_name: &str,
    ) -> Result<PrivateCookieJar, serde_json::Error> {
        let value = serde_json::to_string(self)?;
        let cookie = Cookie::build(cookie_name.to_string(), value)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        Ok(jar.add(cookie))
    }

    pub fn clear(jar: PrivateCookieJar, cookie_name: &str) -> PrivateCookieJar {
        jar.remove(Cookie::named(cookie_name.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::HeaderMap;
    use axum_extra::extract::cookie::Key;
    use chrono::TimeZone;

    fn user() -> User {
        User {
            id: 7,
            email: "t@example.com".to_string(),
            first_name: "Terry".to_string(),
            last_name: "Tenant".to_string(),
            role: UserRole::Tenant,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn session_round_trips_through_the_jar() {
        let key = Key::generate();
        let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), key);
        let session = Session::new("tok".to_string(), &user(), Duration::hours(1));
        let jar = session.store(jar, "_roost_session").unwrap();
        let read = Session::from_jar(&jar, "_roost_session").unwrap();
        assert_eq!(read.user_id(), 7);
        assert_eq!(read.display_name(), "Terry Tenant");
        assert_eq!(read.role(), UserRole::Tenant);
        assert_eq!(read.api_context().token, "tok");
    }

    #[test]
    fn expired_sessions_read_as_logged_out() {
        let key = Key::generate();
        let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), key);
        let session = Session::new("tok".to_string(), &user(), Duration::hours(-1));
        let jar = session.store(jar, "_roost_session").unwrap();
        assert!(Session::from_jar(&jar, "_roost_session").is_none());
    }

    #[test]
    fn cleared_jar_has_no_session() {
        let key = Key::generate();
        let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), key);
        let session = Session::new("tok".to_string(), &user(), Duration::hours(1));
        let jar = session.store(jar, "_roost_session").unwrap();
        let jar = Session::clear(jar, "_roost_session");
        assert!(Session::from_jar(&jar, "_roost_session").is_none());
    }

    #[test]
    fn token_is_not_leaked_by_debug() {
        let session = Session::new("super-secret".to_string(), &user(), Duration::hours(1));
        let printed = format!("{:?}", session);
        assert!(!printed.contains("super-secret"));
    }
}
