use sea_orm::ConnectionTrait;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use crate::auth::access::{self, AccessOptions, ActingRole};
use crate::db::files as file_db;
use crate::errors::{ApiError, Result};
use crate::events::AfterCommit;
use crate::jobs::{payloads, queues};
use crate::models::contract_activities::ActivityType;
use crate::models::contracts;
use crate::models::files::{self, AttachFiles, ChangeFileAccess, FileFilter, WhoCanSeeFiles};
use crate::models::roles::RoleKind;
use crate::pubsub::protocol::ContractEvent;
use crate::tx::RequestTx;

/// Attach files the acting role uploaded to the contract.
///
/// `OnlyMe` restricts the files. An acting collaborator is assigned to them so
/// the uploader keeps seeing their own files.
pub async fn create_contract_files(
    tx: &mut RequestTx,
    actor: ActingRole,
    contract_id: Uuid,
    input: AttachFiles,
) -> Result<Vec<files::Model>> {
    let contract = access::authorize(
        tx.conn(),
        contract_id,
        actor,
        AccessOptions::write().not_ended(),
    )
    .await?;

    let restricted = input.who_can_see == WhoCanSeeFiles::OnlyMe;
    let attached =
        file_db::attach_files(tx.conn(), contract_id, actor.id, input.files, restricted).await?;

    if restricted && !attached.is_empty() && !is_party(&contract, actor) {
        if let Some(collaborator) =
            file_db::collaborator_for_role(tx.conn(), contract_id, actor.id).await?
        {
            let ids: Vec<Uuid> = attached.iter().map(|f| f.id).collect();
            file_db::add_assignees(tx.conn(), &ids, &[collaborator.id]).await?;
        }
    }

    for file in &attached {
        tx.defer(AfterCommit::enqueue(
            queues::CREATE_CONTRACT_ACTIVITY,
            &payloads::CreateContractActivity {
                activity_type: ActivityType::FileNew,
                contract_id,
                role_id: actor.id,
                subject_id: Some(file.id),
                file_name: Some(file.name.clone()),
                file_mime: Some(file.mime.clone()),
            },
        )?);
        tx.defer(AfterCommit::Publish(ContractEvent::FileUpdated {
            contract_id,
            file: file.clone(),
        }));
        tx.defer(AfterCommit::enqueue(
            queues::FILE_CREATED,
            &payloads::FileCreated { file_id: file.id },
        )?);
    }

    info!(%contract_id, role_id = %actor.id, files = attached.len(), "files attached to contract");
    Ok(attached)
}

/// Files of the contract the acting role may see. Owner and partner see all
/// of them; collaborators see unrestricted files and those assigned to them.
pub async fn get_contract_files<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    contract_id: Uuid,
    filter: FileFilter,
) -> Result<Vec<files::Model>> {
    let contract = access::authorize(db, contract_id, actor, AccessOptions::read()).await?;

    let visible_to = if is_party(&contract, actor) {
        None
    } else {
        // A nil id matches no assignment, leaving the unrestricted files.
        Some(
            file_db::collaborator_for_role(db, contract_id, actor.id)
                .await?
                .map(|c| c.id)
                .unwrap_or_default(),
        )
    };

    Ok(file_db::contract_files(db, contract_id, visible_to, &filter).await?)
}

fn is_party(contract: &contracts::Model, actor: ActingRole) -> bool {
    contract.owner_id == actor.id || contract.partner_id == actor.id
}

/// Add and remove collaborator access to contract files.
pub async fn change_file_access(
    tx: &mut RequestTx,
    actor: ActingRole,
    contract_id: Uuid,
    input: ChangeFileAccess,
) -> Result<Vec<files::Model>> {
    access::authorize(
        tx.conn(),
        contract_id,
        actor,
        AccessOptions::full().role(RoleKind::Pro).not_ended(),
    )
    .await?;

    let files = file_db::get_files_by_ids(tx.conn(), input.files.clone()).await?;
    let found: HashSet<Uuid> = files.iter().map(|f| f.id).collect();
    if input.files.iter().any(|id| !found.contains(id))
        || files.iter().any(|f| f.contract_id != Some(contract_id))
    {
        return Err(ApiError::validation(
            "All files must be related to the contract",
        ));
    }

    let mut collaborator_ids = input.add_assignees.clone();
    collaborator_ids.extend(input.remove_assignees.iter().copied());
    let collaborators = file_db::get_collaborators_by_ids(tx.conn(), collaborator_ids.clone()).await?;
    for id in &collaborator_ids {
        let collaborator = collaborators
            .iter()
            .find(|c| c.id == *id)
            .ok_or_else(|| ApiError::not_found("collaborator"))?;
        if collaborator.contract_id != contract_id {
            return Err(ApiError::validation(
                "All collaborators must be related to the contract",
            ));
        }
    }

    file_db::add_assignees(tx.conn(), &input.files, &input.add_assignees).await?;
    file_db::remove_assignees(tx.conn(), &input.files, &input.remove_assignees).await?;

    for file in &files {
        tx.defer(AfterCommit::Publish(ContractEvent::FileUpdated {
            contract_id,
            file: file.clone(),
        }));
    }

    Ok(files)
}
