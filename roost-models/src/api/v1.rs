use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    Lease, LeaseStatus, MaintenanceTicket, Message, Payment, PaymentStatus, Property,
    PropertyStatus, RoostModelError, TicketStatus, User, UserRole,
};

fn invalid(kind: &'static str, reason: String) -> RoostModelError {
    RoostModelError::InvalidRecord { kind, reason }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginRequestV1<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginResponseV1 {
    pub token: String,
    pub user: UserRecordV1,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct UserRecordV1 {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRecordV1> for User {
    type Error = RoostModelError;

    fn try_from(record: UserRecordV1) -> Result<Self, Self::Error> {
        Ok(User {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role.parse()?,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PropertyRecordV1 {
    pub id: i64,
    pub address: String,
    pub city: String,
    pub rent_cents: i64,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub status: String,
    pub manager_id: i64,
    pub listed_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<PropertyRecordV1> for Property {
    type Error = RoostModelError;

    fn try_from(record: PropertyRecordV1) -> Result<Self, Self::Error> {
        if record.rent_cents < 0 {
            return Err(invalid(
                "property",
                format!("negative rent {} on property {}", record.rent_cents, record.id),
            ));
        }
        Ok(Property {
            id: record.id,
            address: record.address,
            city: record.city,
            rent_cents: record.rent_cents,
            bedrooms: record.bedrooms,
            bathrooms: record.bathrooms,
            status: record.status.parse()?,
            manager_id: record.manager_id,
            listed_at: record.listed_at,
            description: record.description,
        })
    }
}

/// Request body shared by property create and update.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PropertyParamsV1 {
    pub address: String,
    pub city: String,
    pub rent_cents: i64,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyParamsV1 {
    pub fn from_parts(
        address: String,
        city: String,
        rent_cents: i64,
        bedrooms: u8,
        bathrooms: u8,
        status: PropertyStatus,
        description: Option<String>,
    ) -> Self {
        Self {
            address,
            city,
            rent_cents,
            bedrooms,
            bathrooms,
            status: status.as_str(),
            description,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LeaseRecordV1 {
    pub id: i64,
    pub property_id: i64,
    pub tenant_id: i64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub rent_cents: i64,
    pub deposit_cents: i64,
    pub status: String,
}

impl TryFrom<LeaseRecordV1> for Lease {
    type Error = RoostModelError;

    fn try_from(record: LeaseRecordV1) -> Result<Self, Self::Error> {
        if record.ends_on < record.starts_on {
            return Err(invalid(
                "lease",
                format!("lease {} ends before it starts", record.id),
            ));
        }
        let status = match record.status.as_str() {
            "active" => LeaseStatus::Active,
            "terminated" => LeaseStatus::Terminated,
            "expired" => LeaseStatus::Expired,
            other => {
                return Err(invalid("lease", format!("unknown status {:?}", other)));
            }
        };
        Ok(Lease {
            id: record.id,
            property_id: record.property_id,
            tenant_id: record.tenant_id,
            starts_on: record.starts_on,
            ends_on: record.ends_on,
            rent_cents: record.rent_cents,
            deposit_cents: record.deposit_cents,
            status,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LeaseParamsV1 {
    pub property_id: i64,
    pub tenant_id: i64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub rent_cents: i64,
    pub deposit_cents: i64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TicketRecordV1 {
    pub id: i64,
    pub property_id: i64,
    pub tenant_id: i64,
    pub title: String,
    pub detail: String,
    pub status: String,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRecordV1> for MaintenanceTicket {
    type Error = RoostModelError;

    fn try_from(record: TicketRecordV1) -> Result<Self, Self::Error> {
        Ok(MaintenanceTicket {
            id: record.id,
            property_id: record.property_id,
            tenant_id: record.tenant_id,
            title: record.title,
            detail: record.detail,
            status: record.status.parse::<TicketStatus>()?,
            opened_at: record.opened_at,
            updated_at: record.updated_at,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TicketParamsV1 {
    pub property_id: i64,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TicketStatusV1 {
    pub status: &'static str,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PaymentRecordV1 {
    pub id: i64,
    pub lease_id: i64,
    pub tenant_id: i64,
    pub amount_cents: i64,
    pub due_on: NaiveDate,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl TryFrom<PaymentRecordV1> for Payment {
    type Error = RoostModelError;

    fn try_from(record: PaymentRecordV1) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: record.id,
            lease_id: record.lease_id,
            tenant_id: record.tenant_id,
            amount_cents: record.amount_cents,
            due_on: record.due_on,
            paid_at: record.paid_at,
            status: record.status.parse::<PaymentStatus>()?,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentStatusV1 {
    pub status: &'static str,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MessageRecordV1 {
    pub id: i64,
    pub sender_id: i64,
    #[serde(default)]
    pub receiver_id: Option<i64>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_broadcast: bool,
    #[serde(default)]
    pub is_automated: bool,
    #[serde(default)]
    pub target_role: Option<String>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

impl TryFrom<MessageRecordV1> for Message {
    type Error = RoostModelError;

    fn try_from(record: MessageRecordV1) -> Result<Self, Self::Error> {
        // a broadcast must carry no receiver; normalise rather than reject
        // so one sloppy upstream row cannot take down the whole fetch
        let receiver = if record.is_broadcast && record.receiver_id.is_some() {
            warn!(
                "broadcast message {} carried receiver {:?}, dropping it",
                record.id, record.receiver_id
            );
            None
        } else {
            record.receiver_id
        };
        let target_role = record
            .target_role
            .as_deref()
            .map(|role| role.parse::<UserRole>())
            .transpose()
            .map_err(|_| {
                invalid(
                    "message",
                    format!(
                        "unknown target role {:?} on message {}",
                        record.target_role, record.id
                    ),
                )
            })?;
        Ok(Message {
            id: record.id,
            sender: record.sender_id,
            receiver,
            body: record.body,
            sent_at: record.sent_at,
            read: record.is_read,
            broadcast: record.is_broadcast,
            automated: record.is_automated,
            target_role,
            archived_at: record.archived_at,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageSendV1<'a> {
    pub receiver_id: i64,
    pub body: &'a str,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BroadcastSendV1<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_role: Option<&'static str>,
    pub body: &'a str,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn message_record_converts() {
        let record: MessageRecordV1 = serde_json::from_value(serde_json::json!({
            "id": 7,
            "sender_id": 2,
            "receiver_id": 1,
            "body": "hi",
            "sent_at": "2026-03-01T12:00:00Z",
            "is_read": false,
        }))
        .unwrap();
        let message = Message::try_from(record).unwrap();
        assert_eq!(message.sender, 2);
        assert_eq!(message.receiver, Some(1));
        assert!(!message.read);
        assert!(!message.broadcast);
        assert!(!message.automated);
    }

    #[test]
    fn broadcast_with_receiver_is_normalised() {
        let record: MessageRecordV1 = serde_json::from_value(serde_json::json!({
            "id": 8,
            "sender_id": 1,
            "receiver_id": 2,
            "body": "maintenance window tonight",
            "sent_at": "2026-03-01T12:00:00Z",
            "is_broadcast": true,
            "target_role": "tenant",
        }))
        .unwrap();
        let message = Message::try_from(record).unwrap();
        assert!(message.broadcast);
        assert_eq!(message.receiver, None);
        assert_eq!(message.target_role, Some(UserRole::Tenant));
    }

    #[test]
    fn unknown_target_role_is_rejected() {
        let record: MessageRecordV1 = serde_json::from_value(serde_json::json!({
            "id": 9,
            "sender_id": 1,
            "body": "hello",
            "sent_at": "2026-03-01T12:00:00Z",
            "is_broadcast": true,
            "target_role": "janitor",
        }))
        .unwrap();
        assert!(Message::try_from(record).is_err());
    }

    #[test]
    fn login_response_parses() {
        let resp: LoginResponseV1 = serde_json::from_value(serde_json::json!({
            "token": "tok-123",
            "user": {
                "id": 3,
                "email": "pm@example.com",
                "first_name": "Pat",
                "last_name": "Manager",
                "role": "manager",
                "created_at": "2025-06-01T00:00:00Z",
            },
        }))
        .unwrap();
        let user = User::try_from(resp.user).unwrap();
        assert_eq!(resp.token, "tok-123");
        assert_eq!(user.role, UserRole::Manager);
        assert_eq!(user.display_name(), "Pat Manager");
    }

    #[test]
    fn lease_ending_before_start_is_rejected() {
        let record: LeaseRecordV1 = serde_json::from_value(serde_json::json!({
            "id": 1,
            "property_id": 1,
            "tenant_id": 2,
            "starts_on": "2026-06-01",
            "ends_on": "2026-05-01",
            "rent_cents": 120000,
            "deposit_cents": 120000,
            "status": "active",
        }))
        .unwrap();
        assert!(Lease::try_from(record).is_err());
    }

    #[test]
    fn negative_rent_is_rejected() {
        let record: PropertyRecordV1 = serde_json::from_value(serde_json::json!({
            "id": 1,
            "address": "1 Main St",
            "city": "Springfield",
            "rent_cents": -5,
            "bedrooms": 2,
            "bathrooms": 1,
            "status": "vacant",
            "manager_id": 1,
            "listed_at": "2026-01-01T00:00:00Z",
        }))
        .unwrap();
        assert!(Property::try_from(record).is_err());
    }
}
