use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::collaborators::Permission;
use crate::models::roles::RoleKind;

/// Contract lifecycle status stored as a snake_case string in the database.
///
/// Variants are declared in lifecycle order; `NotInterested` is the terminal
/// branch of a refused invite.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(string_value = "invited")]
    Invited,
    #[sea_orm(string_value = "accepted_invite")]
    AcceptedInvite,
    #[sea_orm(string_value = "not_interested")]
    NotInterested,
    #[sea_orm(string_value = "preparing_estimate")]
    PreparingEstimate,
    #[sea_orm(string_value = "waiting_review")]
    WaitingReview,
    #[sea_orm(string_value = "hired")]
    Hired,
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// How the partner is billed for the contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentPlan {
    #[sea_orm(string_value = "transaction")]
    Transaction,
    #[sea_orm(string_value = "monthly_subscription")]
    MonthlySubscription,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum InviteRefusalReason {
    #[sea_orm(string_value = "too_busy")]
    TooBusy,
    #[sea_orm(string_value = "out_of_service_area")]
    OutOfServiceArea,
    #[sea_orm(string_value = "not_a_good_fit")]
    NotAGoodFit,
    #[sea_orm(string_value = "other")]
    Other,
}

/// SeaORM entity for the `contracts` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Homeowner role.
    pub owner_id: Uuid,
    /// Pro (contractor) role.
    pub partner_id: Uuid,
    pub status: Status,
    pub payment_plan: Option<PaymentPlan>,
    pub paid: bool,
    pub subscription_id: Option<Uuid>,
    pub invite_refusal_reason: Option<InviteRefusalReason>,
    pub invite_refusal_message: Option<String>,
    pub auto_release_days: Option<i32>,
    pub relative_dates: bool,
    pub dismiss_review_dates: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::OwnerId",
        to = "super::roles::Column::Id"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::PartnerId",
        to = "super::roles::Column::Id"
    )]
    Partner,
    #[sea_orm(has_many = "super::phases::Entity")]
    Phases,
    #[sea_orm(has_many = "super::collaborators::Entity")]
    Collaborators,
    #[sea_orm(has_many = "super::contract_completions::Entity")]
    Completions,
}

impl Related<super::phases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phases.def()
    }
}

impl Related<super::collaborators::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collaborators.def()
    }
}

impl Related<super::contract_completions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Completions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_monthly_subscription(&self) -> bool {
        self.payment_plan == Some(PaymentPlan::MonthlySubscription)
    }
}

// ── DTOs ──

/// Request body for answering a project invite.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInvite {
    pub accept: bool,
    pub refusal_reason: Option<InviteRefusalReason>,
    pub refusal_message: Option<String>,
}

/// Signed acknowledgment attached to a full-payment completion.
#[derive(Debug, Clone, Deserialize)]
pub struct EsignInput {
    pub signature: String,
}

/// Request body for ending a contract.
#[derive(Debug, Clone, Deserialize)]
pub struct EndContract {
    pub esign: Option<EsignInput>,
    pub reason: String,
    pub partial_payment: bool,
}

/// Editable contract fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContract {
    pub name: Option<String>,
    pub auto_release_days: Option<i32>,
    pub relative_dates: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectPaymentPlan {
    pub plan: PaymentPlan,
}

/// Query parameters for `GET /api/contracts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractListQuery {
    pub archived: Option<bool>,
}

/// Query parameters for `GET /api/contracts/manage`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManageContractsQuery {
    pub force_fetch_contract_id: Option<Uuid>,
}

/// Query parameters for `GET /api/contracts/{id}/members`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberQuery {
    pub role: Option<RoleKind>,
    pub permission: Option<Permission>,
}
