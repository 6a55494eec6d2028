use std::fmt::Display;

use chrono::NaiveDate;

use crate::api::v1::{LeaseParamsV1, LeaseRecordV1};
use crate::{ApiContext, Client, RoostModelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    Terminated,
    Expired,
}

impl LeaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Active => "active",
            LeaseStatus::Terminated => "terminated",
            LeaseStatus::Expired => "expired",
        }
    }
}

impl Display for LeaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lease {
    pub id: i64,
    pub property_id: i64,
    pub tenant_id: i64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub rent_cents: i64,
    pub deposit_cents: i64,
    pub status: LeaseStatus,
}

impl Lease {
    pub fn rent_display(&self) -> String {
        format!("${}.{:02}", self.rent_cents / 100, self.rent_cents % 100)
    }

    /// The API scopes the result to the caller: admins and managers see the
    /// leases of their portfolio, tenants see their own.
    pub async fn all(client: &Client, ctx: &ApiContext) -> RoostModelResult<Vec<Lease>> {
        let records: Vec<LeaseRecordV1> = client.get(ctx, "/api/v1/leases").await?;
        records.into_iter().map(Lease::try_from).collect()
    }

    pub async fn create(
        client: &Client,
        ctx: &ApiContext,
        params: &LeaseParamsV1,
    ) -> RoostModelResult<Lease> {
        let record: LeaseRecordV1 = client.post(Some(ctx), "/api/v1/leases", params).await?;
        Lease::try_from(record)
    }

    pub async fn terminate(client: &Client, ctx: &ApiContext, id: i64) -> RoostModelResult<()> {
        client
            .post_unit(
                ctx,
                &format!("/api/v1/leases/{}/terminate", id),
                &serde_json::json!({}),
            )
            .await
    }
}
