use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::api::v1::{LoginRequestV1, LoginResponseV1, UserRecordV1};
use crate::{ApiContext, Client, RoostModelError, RoostModelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Tenant,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Tenant => "tenant",
        }
    }

    /// Roles that may create and edit portfolio data.
    pub fn manages_portfolio(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = RoostModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "tenant" => Ok(UserRole::Tenant),
            other => Err(RoostModelError::InvalidRecord {
                kind: "user",
                reason: format!("unknown role {:?}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub async fn get(
        client: &Client,
        ctx: &ApiContext,
        id: i64,
    ) -> RoostModelResult<Option<User>> {
        let record: Option<UserRecordV1> =
            client.get_opt(ctx, &format!("/api/v1/users/{}", id)).await?;
        record.map(User::try_from).transpose()
    }

    /// Exchange credentials for a bearer token and the user it belongs to.
    ///
    /// Credential verification happens entirely upstream; a 401/403 from the
    /// API surfaces as [`RoostModelError::Unauthorized`].
    pub async fn login(
        client: &Client,
        email: &str,
        password: &str,
    ) -> RoostModelResult<(String, User)> {
        let resp: LoginResponseV1 = client
            .post(None, "/api/v1/auth/login", &LoginRequestV1 { email, password })
            .await?;
        Ok((resp.token, User::try_from(resp.user)?))
    }

    /// Best-effort upstream token revocation. The session cookie is gone
    /// either way, so callers only log a failure here.
    pub async fn logout(client: &Client, ctx: &ApiContext) -> RoostModelResult<()> {
        client
            .post_unit(ctx, "/api/v1/auth/logout", &serde_json::json!({}))
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Tenant] {
            assert_eq!(role, role.as_str().parse().unwrap());
        }
        assert!("landlord".parse::<UserRole>().is_err());
    }

    #[test]
    fn portfolio_management_is_admin_and_manager_only() {
        assert!(UserRole::Admin.manages_portfolio());
        assert!(UserRole::Manager.manages_portfolio());
        assert!(!UserRole::Tenant.manages_portfolio());
    }
}
