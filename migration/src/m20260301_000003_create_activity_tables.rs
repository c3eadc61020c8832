use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ContractActivities {
    Table,
    Id,
    ContractId,
    RoleId,
    ActivityType,
    SubjectId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ActivitySeen {
    Table,
    Id,
    RoleId,
    ContractId,
    ActivityType,
    SubjectId,
    SeenAt,
}

#[derive(DeriveIden)]
enum ViewPoints {
    Table,
    Id,
    ContractId,
    RoleId,
    ViewPoint,
    SeenAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    RoleId,
    ContractId,
    Name,
    Mime,
    Restricted,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FileAssignees {
    Table,
    Id,
    FileId,
    CollaboratorId,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    RoleId,
    Active,
    ProviderSubscriptionId,
    Status,
    Quantity,
    AccessExpirationDate,
    CreatedAt,
}

/// Re-declare parent table identifiers for foreign-key references.
#[derive(DeriveIden)]
enum Contracts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Collaborators {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContractActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContractActivities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContractActivities::ContractId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContractActivities::RoleId).uuid())
                    .col(
                        ColumnDef::new(ContractActivities::ActivityType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContractActivities::SubjectId).uuid())
                    .col(
                        ColumnDef::new(ContractActivities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ContractActivities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contract_activities_contract_id")
                            .from(ContractActivities::Table, ContractActivities::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivitySeen::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivitySeen::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivitySeen::RoleId).uuid().not_null())
                    .col(ColumnDef::new(ActivitySeen::ContractId).uuid().not_null())
                    .col(ColumnDef::new(ActivitySeen::ActivityType).string().not_null())
                    .col(ColumnDef::new(ActivitySeen::SubjectId).uuid().not_null())
                    .col(
                        ColumnDef::new(ActivitySeen::SeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_seen_role_id")
                            .from(ActivitySeen::Table, ActivitySeen::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ViewPoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ViewPoints::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ViewPoints::ContractId).uuid().not_null())
                    .col(ColumnDef::new(ViewPoints::RoleId).uuid().not_null())
                    .col(ColumnDef::new(ViewPoints::ViewPoint).string().not_null())
                    .col(
                        ColumnDef::new(ViewPoints::SeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_view_points_contract_id")
                            .from(ViewPoints::Table, ViewPoints::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Files::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Files::RoleId).uuid().not_null())
                    .col(ColumnDef::new(Files::ContractId).uuid())
                    .col(ColumnDef::new(Files::Name).string().not_null())
                    .col(ColumnDef::new(Files::Mime).string().not_null())
                    .col(
                        ColumnDef::new(Files::Restricted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Files::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_files_contract_id")
                            .from(Files::Table, Files::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FileAssignees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileAssignees::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FileAssignees::FileId).uuid().not_null())
                    .col(
                        ColumnDef::new(FileAssignees::CollaboratorId)
                            .uuid()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_assignees_file_id")
                            .from(FileAssignees::Table, FileAssignees::FileId)
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_assignees_collaborator_id")
                            .from(FileAssignees::Table, FileAssignees::CollaboratorId)
                            .to(Collaborators::Table, Collaborators::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::RoleId).uuid().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::ProviderSubscriptionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Subscriptions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::AccessExpirationDate)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriptions_role_id")
                            .from(Subscriptions::Table, Subscriptions::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FileAssignees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Files::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ViewPoints::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivitySeen::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContractActivities::Table).to_owned())
            .await
    }
}
