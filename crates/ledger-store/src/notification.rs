use chrono::{DateTime, Utc};
use common::OwnerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// In-app notice recorded for an owner alongside a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub owner: OwnerId,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates an unread notification.
    pub fn unread(owner: OwnerId, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            message: message.into(),
            read: false,
            created_at: at,
        }
    }
}
