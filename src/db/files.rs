use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use uuid::Uuid;

use crate::models::files::FileFilter;
use crate::models::{collaborators, file_assignees, files};

/// Attach files uploaded by `role_id` to the contract. Files owned by someone
/// else or already attached elsewhere are skipped.
pub async fn attach_files<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    role_id: Uuid,
    file_ids: Vec<Uuid>,
    restricted: bool,
) -> Result<Vec<files::Model>, DbErr> {
    if file_ids.is_empty() {
        return Ok(Vec::new());
    }

    files::Entity::update_many()
        .set(files::ActiveModel {
            contract_id: Set(Some(contract_id)),
            restricted: Set(restricted),
            ..Default::default()
        })
        .filter(files::Column::Id.is_in(file_ids))
        .filter(files::Column::RoleId.eq(role_id))
        .filter(
            Condition::any()
                .add(files::Column::ContractId.is_null())
                .add(files::Column::ContractId.eq(contract_id)),
        )
        .exec_with_returning(db)
        .await
}

pub async fn get_files_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<Vec<files::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    files::Entity::find()
        .filter(files::Column::Id.is_in(ids))
        .all(db)
        .await
}

/// Files attached to the contract, newest first. `visible_to` limits the
/// result to unrestricted files plus those assigned to that collaborator.
pub async fn contract_files<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    visible_to: Option<Uuid>,
    filter: &FileFilter,
) -> Result<Vec<files::Model>, DbErr> {
    let mut query = files::Entity::find().filter(files::Column::ContractId.eq(contract_id));

    if let Some(collaborator_id) = visible_to {
        let assigned: Vec<Uuid> = file_assignees::Entity::find()
            .filter(file_assignees::Column::CollaboratorId.eq(collaborator_id))
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.file_id)
            .collect();

        let mut visible = Condition::any().add(files::Column::Restricted.eq(false));
        if !assigned.is_empty() {
            visible = visible.add(files::Column::Id.is_in(assigned));
        }
        query = query.filter(visible);
    }

    if let Some(name) = filter.name.as_deref() {
        query = query.filter(files::Column::Name.ilike(format!("%{name}%")));
    }
    if let Some(mime) = filter.mime.as_deref() {
        query = query.filter(files::Column::Mime.eq(mime));
    }

    query
        .order_by_desc(files::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn collaborator_for_role<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    role_id: Uuid,
) -> Result<Option<collaborators::Model>, DbErr> {
    collaborators::Entity::find()
        .filter(collaborators::Column::ContractId.eq(contract_id))
        .filter(collaborators::Column::RoleId.eq(role_id))
        .one(db)
        .await
}

pub async fn get_collaborators_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<Vec<collaborators::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    collaborators::Entity::find()
        .filter(collaborators::Column::Id.is_in(ids))
        .all(db)
        .await
}

/// Grant every collaborator access to every file. Existing pairs are kept.
pub async fn add_assignees<C: ConnectionTrait>(
    db: &C,
    file_ids: &[Uuid],
    collaborator_ids: &[Uuid],
) -> Result<(), DbErr> {
    let rows: Vec<file_assignees::ActiveModel> = file_ids
        .iter()
        .flat_map(|file_id| {
            collaborator_ids
                .iter()
                .map(move |collaborator_id| file_assignees::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    file_id: Set(*file_id),
                    collaborator_id: Set(*collaborator_id),
                })
        })
        .collect();

    if rows.is_empty() {
        return Ok(());
    }

    let result = file_assignees::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                file_assignees::Column::FileId,
                file_assignees::Column::CollaboratorId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

pub async fn remove_assignees<C: ConnectionTrait>(
    db: &C,
    file_ids: &[Uuid],
    collaborator_ids: &[Uuid],
) -> Result<u64, DbErr> {
    if file_ids.is_empty() || collaborator_ids.is_empty() {
        return Ok(0);
    }

    let result = file_assignees::Entity::delete_many()
        .filter(file_assignees::Column::FileId.is_in(file_ids.to_vec()))
        .filter(file_assignees::Column::CollaboratorId.is_in(collaborator_ids.to_vec()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
