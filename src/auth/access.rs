//! Contract access evaluation.
//!
//! Every read and mutation on a contract goes through [`evaluate`]: a pure
//! function over a [`ContractSnapshot`] loaded inside the caller's transaction
//! right before the check, so the decision and the data it guards come from the
//! same transaction.

use sea_orm::*;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::collaborators::{self, Permission};
use crate::models::contracts::{self, Status};
use crate::models::roles::{self, RoleKind};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Ok,
    RoleMismatch,
    PermissionTooLow,
    ContractEnded,
    NotFound,
}

impl AccessDecision {
    pub fn is_ok(self) -> bool {
        self == AccessDecision::Ok
    }
}

/// What the caller needs on the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessOptions {
    pub min_permission: Permission,
    pub required_role: Option<RoleKind>,
    pub check_contract_ended: bool,
}

impl Default for AccessOptions {
    fn default() -> Self {
        Self::read()
    }
}

impl AccessOptions {
    pub fn read() -> Self {
        Self::at_least(Permission::Read)
    }

    pub fn write() -> Self {
        Self::at_least(Permission::Write)
    }

    pub fn full() -> Self {
        Self::at_least(Permission::Full)
    }

    pub fn at_least(min_permission: Permission) -> Self {
        Self {
            min_permission,
            required_role: None,
            check_contract_ended: false,
        }
    }

    /// Only a role of this kind may pass.
    pub fn role(mut self, kind: RoleKind) -> Self {
        self.required_role = Some(kind);
        self
    }

    /// Refuse completed contracts.
    pub fn not_ended(mut self) -> Self {
        self.check_contract_ended = true;
        self
    }
}

/// The role a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingRole {
    pub id: Uuid,
    pub kind: RoleKind,
}

impl From<&roles::Model> for ActingRole {
    fn from(role: &roles::Model) -> Self {
        Self {
            id: role.id,
            kind: role.name,
        }
    }
}

/// Everything the evaluator looks at: the contract row (if it exists) and the
/// acting role's explicit collaborator grant (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSnapshot {
    pub contract: Option<contracts::Model>,
    pub grant: Option<Permission>,
}

/// Permission the role holds on the contract. Owner and partner always hold Full.
pub fn effective_permission(
    contract: &contracts::Model,
    grant: Option<Permission>,
    role_id: Uuid,
) -> Option<Permission> {
    if contract.owner_id == role_id || contract.partner_id == role_id {
        Some(Permission::Full)
    } else {
        grant
    }
}

/// Decide whether `actor` may act on the snapshot's contract.
///
/// Precedence: not found, role mismatch, ended contract, permission threshold.
pub fn evaluate(
    snapshot: &ContractSnapshot,
    actor: ActingRole,
    options: AccessOptions,
) -> AccessDecision {
    let Some(contract) = snapshot.contract.as_ref() else {
        return AccessDecision::NotFound;
    };

    if let Some(required) = options.required_role {
        if actor.kind != required {
            return AccessDecision::RoleMismatch;
        }
    }

    if options.check_contract_ended && contract.status == Status::Completed {
        return AccessDecision::ContractEnded;
    }

    match effective_permission(contract, snapshot.grant, actor.id) {
        Some(held) if held >= options.min_permission => AccessDecision::Ok,
        _ => AccessDecision::PermissionTooLow,
    }
}

impl ContractSnapshot {
    /// Evaluate and hand back the contract, or the matching API error.
    pub fn require(
        self,
        actor: ActingRole,
        options: AccessOptions,
    ) -> Result<contracts::Model, ApiError> {
        match evaluate(&self, actor, options) {
            AccessDecision::Ok => self
                .contract
                .ok_or_else(|| ApiError::not_found("contract")),
            denied => {
                tracing::debug!(role_id = %actor.id, decision = ?denied, "contract access denied");
                Err(denied.into())
            }
        }
    }
}

/// Load the contract and the role's grant. The grant lookup is skipped for the
/// contract's own owner and partner.
pub async fn load_snapshot<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    role_id: Uuid,
) -> Result<ContractSnapshot, DbErr> {
    let Some(contract) = contracts::Entity::find_by_id(contract_id).one(db).await? else {
        return Ok(ContractSnapshot {
            contract: None,
            grant: None,
        });
    };

    let grant = if contract.owner_id == role_id || contract.partner_id == role_id {
        None
    } else {
        collaborators::Entity::find()
            .filter(collaborators::Column::ContractId.eq(contract_id))
            .filter(collaborators::Column::RoleId.eq(role_id))
            .one(db)
            .await?
            .map(|c| c.permission)
    };

    Ok(ContractSnapshot {
        contract: Some(contract),
        grant,
    })
}

/// Load the snapshot and require `options` in one step.
pub async fn authorize<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    actor: ActingRole,
    options: AccessOptions,
) -> Result<contracts::Model, ApiError> {
    load_snapshot(db, contract_id, actor.id)
        .await?
        .require(actor, options)
}
