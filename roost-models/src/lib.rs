#[macro_use]
extern crate tracing;

pub mod api;
mod models;

pub use models::*;

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum RoostModelError {
    #[error("Other error: {}", .0)]
    Other(String),
    #[error("Could not deserialize upstream payload: {}", .0)]
    SerdeJson(#[from] serde_json::Error),
    #[error("Network error in upstream API: {}", .0)]
    Reqwest(#[from] reqwest::Error),
    #[error("URL error: {}", .0)]
    Url(#[from] url::ParseError),
    #[error("Upstream rejected credentials or token")]
    Unauthorized,
    #[error("Could not find {}", .what)]
    NotFound { what: String },
    #[error("Upstream returned status {} for {}", .status, .endpoint)]
    UpstreamStatus { status: u16, endpoint: String },
    #[error("Invalid {} record: {}", .kind, .reason)]
    InvalidRecord { kind: &'static str, reason: String },
    #[error("Error parsing integer: {:?}", .0)]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("{:?}", .0)]
    Context(#[from] anyhow::Error),
}

pub type RoostModelResult<T> = std::result::Result<T, RoostModelError>;

/// Request-scoped identity and credential for upstream calls.
///
/// Built from the session by the web layer and handed explicitly into every
/// API operation; nothing in this crate reads ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContext {
    pub token: String,
    pub viewer: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Descending
    }
}

/// Client for the platform API. All persistence and business rules live
/// upstream; this client is a typed proxy over its `v1` JSON surface.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_root: Url,
    cache_names: Cache<i64, Option<String>>,
}

impl Client {
    pub fn new(http: reqwest::Client, api_root: Url) -> Self {
        Self {
            http,
            api_root,
            cache_names: Cache::new(1000),
        }
    }

    fn url(&self, path: &str) -> RoostModelResult<Url> {
        Ok(self.api_root.join(path)?)
    }

    fn check_status(status: reqwest::StatusCode, path: &str) -> RoostModelResult<()> {
        if status.is_success() {
            return Ok(());
        }
        Err(match status.as_u16() {
            401 | 403 => RoostModelError::Unauthorized,
            404 => RoostModelError::NotFound {
                what: path.to_string(),
            },
            s => RoostModelError::UpstreamStatus {
                status: s,
                endpoint: path.to_string(),
            },
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        ctx: &ApiContext,
        path: &str,
    ) -> RoostModelResult<T> {
        trace!("GET {}", path);
        let resp = self
            .http
            .get(self.url(path)?)
            .bearer_auth(&ctx.token)
            .send()
            .await?;
        Self::check_status(resp.status(), path)?;
        Ok(resp.json().await?)
    }

    /// Like [`Client::get`] but folds an upstream 404 into `None`.
    pub(crate) async fn get_opt<T: DeserializeOwned>(
        &self,
        ctx: &ApiContext,
        path: &str,
    ) -> RoostModelResult<Option<T>> {
        trace!("GET {}", path);
        let resp = self
            .http
            .get(self.url(path)?)
            .bearer_auth(&ctx.token)
            .send()
            .await?;
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        Self::check_status(resp.status(), path)?;
        Ok(Some(resp.json().await?))
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: Option<&ApiContext>,
        path: &str,
        body: &B,
    ) -> RoostModelResult<T> {
        trace!("POST {}", path);
        let mut req = self.http.post(self.url(path)?).json(body);
        if let Some(ctx) = ctx {
            req = req.bearer_auth(&ctx.token);
        }
        let resp = req.send().await?;
        Self::check_status(resp.status(), path)?;
        Ok(resp.json().await?)
    }

    /// POST for operations where the caller only cares about success.
    pub(crate) async fn post_unit<B: Serialize>(
        &self,
        ctx: &ApiContext,
        path: &str,
        body: &B,
    ) -> RoostModelResult<()> {
        trace!("POST {}", path);
        let resp = self
            .http
            .post(self.url(path)?)
            .bearer_auth(&ctx.token)
            .json(body)
            .send()
            .await?;
        Self::check_status(resp.status(), path)
    }

    /// Resolve a user id to a display name via the user directory.
    ///
    /// Lookups are cached, including negative results, so one upstream call
    /// is made per distinct id per cache lifetime. Failures degrade to
    /// `None`; callers substitute their own placeholder.
    #[instrument(skip(self, ctx))]
    pub async fn display_name(&self, ctx: &ApiContext, id: i64) -> Option<String> {
        let client = self.clone();
        let ctx = ctx.clone();
        self.cache_names
            .get_with(id, async move {
                match User::get(&client, &ctx, id).await {
                    Ok(Some(user)) => Some(user.display_name()),
                    Ok(None) => None,
                    Err(e) => {
                        warn!("name lookup for user {} failed: {}", id, e);
                        None
                    }
                }
            })
            .await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_root", &self.api_root.as_str())
            .finish()
    }
}
