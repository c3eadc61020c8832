use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::contract_activities::ActivityType;

/// `release-payout`: pay out every listed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePayout {
    pub payments: Vec<Uuid>,
}

/// `check-subscription-paid`: re-check a contract's subscription payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSubscriptionPaid {
    pub contract_id: Uuid,
}

/// `create-contract-activity`: append an entry to the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContractActivity {
    pub activity_type: ActivityType,
    pub contract_id: Uuid,
    pub role_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub file_name: Option<String>,
    pub file_mime: Option<String>,
}

/// `file-created`: post-process an attached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCreated {
    pub file_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ContractEnded,
    ProjectInviteAnswered,
}

/// `notifications`: email/push fan-out handled by the notification worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub contract_id: Uuid,
}
