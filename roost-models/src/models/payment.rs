use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::api::v1::{PaymentRecordV1, PaymentStatusV1};
use crate::{ApiContext, Client, RoostModelError, RoostModelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Due,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Due => "due",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = RoostModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "due" => Ok(PaymentStatus::Due),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            other => Err(RoostModelError::InvalidRecord {
                kind: "payment",
                reason: format!("unknown status {:?}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub lease_id: i64,
    pub tenant_id: i64,
    pub amount_cents: i64,
    pub due_on: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn amount_display(&self) -> String {
        format!("${}.{:02}", self.amount_cents / 100, self.amount_cents % 100)
    }

    pub fn outstanding(&self) -> bool {
        matches!(self.status, PaymentStatus::Due | PaymentStatus::Overdue)
    }

    pub async fn all(client: &Client, ctx: &ApiContext) -> RoostModelResult<Vec<Payment>> {
        let records: Vec<PaymentRecordV1> = client.get(ctx, "/api/v1/payments").await?;
        records.into_iter().map(Payment::try_from).collect()
    }

    pub async fn set_status(
        client: &Client,
        ctx: &ApiContext,
        id: i64,
        status: PaymentStatus,
    ) -> RoostModelResult<()> {
        client
            .post_unit(
                ctx,
                &format!("/api/v1/payments/{}/status", id),
                &PaymentStatusV1 {
                    status: status.as_str(),
                },
            )
            .await
    }

    /// The next payment a tenant should care about: the earliest due date
    /// among outstanding payments.
    pub fn next_due(payments: &[Payment]) -> Option<&Payment> {
        payments
            .iter()
            .filter(|p| p.outstanding())
            .min_by_key(|p| p.due_on)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn payment(id: i64, due: (i32, u32, u32), status: PaymentStatus) -> Payment {
        Payment {
            id,
            lease_id: 1,
            tenant_id: 1,
            amount_cents: 100_000,
            due_on: NaiveDate::from_ymd_opt(due.0, due.1, due.2).unwrap(),
            paid_at: None,
            status,
        }
    }

    #[test]
    fn next_due_skips_settled_payments() {
        let payments = vec![
            payment(1, (2026, 1, 1), PaymentStatus::Paid),
            payment(2, (2026, 3, 1), PaymentStatus::Due),
            payment(3, (2026, 2, 1), PaymentStatus::Overdue),
        ];
        assert_eq!(Payment::next_due(&payments).unwrap().id, 3);
    }

    #[test]
    fn next_due_is_none_when_everything_is_paid() {
        let payments = vec![payment(1, (2026, 1, 1), PaymentStatus::Paid)];
        assert!(Payment::next_due(&payments).is_none());
    }
}
