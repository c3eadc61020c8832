use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `files` table.
///
/// Files are uploaded by a role first and attached to a contract afterwards.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub role_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub name: String,
    pub mime: String,
    /// Collaborators only see a restricted file when it is assigned to them.
    pub restricted: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

/// Who may see newly attached files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhoCanSeeFiles {
    #[default]
    All,
    OnlyMe,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachFiles {
    pub files: Vec<Uuid>,
    #[serde(default)]
    pub who_can_see: WhoCanSeeFiles,
}

/// Query parameters for `GET /api/contracts/{id}/files`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileFilter {
    /// Case-insensitive substring of the file name.
    pub name: Option<String>,
    pub mime: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeFileAccess {
    pub files: Vec<Uuid>,
    #[serde(default)]
    pub add_assignees: Vec<Uuid>,
    #[serde(default)]
    pub remove_assignees: Vec<Uuid>,
}
