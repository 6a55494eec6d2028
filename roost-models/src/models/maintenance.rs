use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::api::v1::{TicketParamsV1, TicketRecordV1, TicketStatusV1};
use crate::{ApiContext, Client, RoostModelError, RoostModelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
        }
    }

    /// The statuses a ticket may move to from here.
    pub fn transitions(&self) -> &'static [TicketStatus] {
        match self {
            TicketStatus::Open => &[TicketStatus::InProgress, TicketStatus::Resolved],
            TicketStatus::InProgress => &[TicketStatus::Resolved],
            TicketStatus::Resolved => &[],
        }
    }
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = RoostModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            other => Err(RoostModelError::InvalidRecord {
                kind: "ticket",
                reason: format!("unknown status {:?}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceTicket {
    pub id: i64,
    pub property_id: i64,
    pub tenant_id: i64,
    pub title: String,
    pub detail: String,
    pub status: TicketStatus,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceTicket {
    pub async fn all(
        client: &Client,
        ctx: &ApiContext,
    ) -> RoostModelResult<Vec<MaintenanceTicket>> {
        let records: Vec<TicketRecordV1> = client.get(ctx, "/api/v1/tickets").await?;
        records.into_iter().map(MaintenanceTicket::try_from).collect()
    }

    pub async fn create(
        client: &Client,
        ctx: &ApiContext,
        params: &TicketParamsV1,
    ) -> RoostModelResult<MaintenanceTicket> {
        let record: TicketRecordV1 = client.post(Some(ctx), "/api/v1/tickets", params).await?;
        MaintenanceTicket::try_from(record)
    }

    pub async fn set_status(
        client: &Client,
        ctx: &ApiContext,
        id: i64,
        status: TicketStatus,
    ) -> RoostModelResult<()> {
        client
            .post_unit(
                ctx,
                &format!("/api/v1/tickets/{}/status", id),
                &TicketStatusV1 {
                    status: status.as_str(),
                },
            )
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolved_is_terminal() {
        assert!(TicketStatus::Resolved.transitions().is_empty());
        assert_eq!(
            TicketStatus::Open.transitions(),
            &[TicketStatus::InProgress, TicketStatus::Resolved][..]
        );
    }
}
