//! Contract access evaluation over in-memory snapshots.
//!
//! Run with: `cargo test --test access_test`
mod common;

use sitework_backend::auth::access::{
    AccessDecision, AccessOptions, ContractSnapshot, effective_permission, evaluate,
};
use sitework_backend::errors::{ApiError, ForbiddenReason};
use sitework_backend::models::collaborators::Permission;
use sitework_backend::models::contracts::Status;
use sitework_backend::models::roles::RoleKind;

use common::{contract, home_owner, pro};

fn snapshot(contract: sitework_backend::models::contracts::Model, grant: Option<Permission>) -> ContractSnapshot {
    ContractSnapshot {
        contract: Some(contract),
        grant,
    }
}

#[test]
fn test_owner_and_partner_hold_full_permission() {
    let owner = home_owner();
    let partner = pro();
    let c = contract(&owner, &partner, Status::Hired);

    assert_eq!(effective_permission(&c, None, owner.id), Some(Permission::Full));
    assert_eq!(effective_permission(&c, None, partner.id), Some(Permission::Full));
    // An explicit lower grant never demotes the owner.
    assert_eq!(
        effective_permission(&c, Some(Permission::Read), owner.id),
        Some(Permission::Full)
    );
}

#[test]
fn test_collaborator_is_bounded_by_grant() {
    let owner = home_owner();
    let partner = pro();
    let collaborator = home_owner();
    let c = contract(&owner, &partner, Status::Hired);
    let snap = snapshot(c, Some(Permission::Write));

    assert_eq!(evaluate(&snap, collaborator, AccessOptions::read()), AccessDecision::Ok);
    assert_eq!(evaluate(&snap, collaborator, AccessOptions::write()), AccessDecision::Ok);
    assert_eq!(
        evaluate(&snap, collaborator, AccessOptions::full()),
        AccessDecision::PermissionTooLow
    );
}

#[test]
fn test_stranger_without_grant_is_refused() {
    let owner = home_owner();
    let partner = pro();
    let snap = snapshot(contract(&owner, &partner, Status::Hired), None);

    assert_eq!(
        evaluate(&snap, home_owner(), AccessOptions::read()),
        AccessDecision::PermissionTooLow
    );
}

#[test]
fn test_higher_grants_pass_whatever_lower_grants_pass() {
    let owner = home_owner();
    let partner = pro();
    let collaborator = pro();
    let c = contract(&owner, &partner, Status::Hired);
    let levels = [Permission::Read, Permission::Write, Permission::Full];

    for (i, held) in levels.iter().enumerate() {
        for required in &levels {
            let lower = evaluate(
                &snapshot(c.clone(), Some(*held)),
                collaborator,
                AccessOptions::at_least(*required),
            );
            for higher in &levels[i..] {
                let decision = evaluate(
                    &snapshot(c.clone(), Some(*higher)),
                    collaborator,
                    AccessOptions::at_least(*required),
                );
                if lower.is_ok() {
                    assert!(decision.is_ok(), "{higher:?} should pass where {held:?} passes");
                }
            }
        }
    }
}

#[test]
fn test_missing_contract_wins_over_everything() {
    let snap = ContractSnapshot {
        contract: None,
        grant: Some(Permission::Full),
    };

    let options = AccessOptions::full().role(RoleKind::Pro).not_ended();
    assert_eq!(evaluate(&snap, home_owner(), options), AccessDecision::NotFound);
}

#[test]
fn test_role_mismatch_precedes_ended_and_permission() {
    let owner = home_owner();
    let partner = pro();
    let snap = snapshot(contract(&owner, &partner, Status::Completed), None);

    // The owner has Full, but is not a pro and the contract has ended.
    let options = AccessOptions::full().role(RoleKind::Pro).not_ended();
    assert_eq!(evaluate(&snap, owner, options), AccessDecision::RoleMismatch);
}

#[test]
fn test_ended_contract_precedes_permission() {
    let owner = home_owner();
    let partner = pro();
    let stranger = pro();
    let snap = snapshot(contract(&owner, &partner, Status::Completed), None);

    assert_eq!(
        evaluate(&snap, stranger, AccessOptions::full().not_ended()),
        AccessDecision::ContractEnded
    );
    // Without the ended check the same request fails on permission.
    assert_eq!(
        evaluate(&snap, stranger, AccessOptions::full()),
        AccessDecision::PermissionTooLow
    );
}

#[test]
fn test_ended_contract_still_readable() {
    let owner = home_owner();
    let partner = pro();
    let snap = snapshot(contract(&owner, &partner, Status::Completed), None);

    assert_eq!(evaluate(&snap, owner, AccessOptions::read()), AccessDecision::Ok);
}

#[test]
fn test_require_maps_decisions_to_errors() {
    let owner = home_owner();
    let partner = pro();
    let c = contract(&owner, &partner, Status::Completed);

    let result = snapshot(c.clone(), None).require(owner, AccessOptions::full());
    assert_eq!(result.expect("owner passes").id, c.id);

    match snapshot(c.clone(), None).require(owner, AccessOptions::full().not_ended()) {
        Err(ApiError::Forbidden { reason, .. }) => {
            assert_eq!(reason, ForbiddenReason::ContractEnded)
        }
        other => panic!("expected forbidden, got {other:?}"),
    }

    let missing = ContractSnapshot {
        contract: None,
        grant: None,
    };
    assert!(matches!(
        missing.require(owner, AccessOptions::read()),
        Err(ApiError::NotFound(_))
    ));
}
