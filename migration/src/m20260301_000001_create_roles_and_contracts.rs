use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Roles {
    Table,
    Id,
    UserId,
    Name,
    DisplayName,
    BillingCustomerId,
    SubscriptionPaymentMethodId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Contracts {
    Table,
    Id,
    Name,
    OwnerId,
    PartnerId,
    Status,
    PaymentPlan,
    Paid,
    SubscriptionId,
    InviteRefusalReason,
    InviteRefusalMessage,
    AutoReleaseDays,
    RelativeDates,
    DismissReviewDates,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Collaborators {
    Table,
    Id,
    ContractId,
    RoleId,
    Permission,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContractCompletions {
    Table,
    Id,
    ContractId,
    InitiatedById,
    Reason,
    PartialPayment,
    CompletionType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContractArchives {
    Table,
    Id,
    ContractId,
    RoleId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Roles::UserId).uuid().not_null())
                    .col(ColumnDef::new(Roles::Name).string().not_null())
                    .col(ColumnDef::new(Roles::DisplayName).string())
                    .col(ColumnDef::new(Roles::BillingCustomerId).string())
                    .col(ColumnDef::new(Roles::SubscriptionPaymentMethodId).string())
                    .col(
                        ColumnDef::new(Roles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contracts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contracts::Name).string().not_null())
                    .col(ColumnDef::new(Contracts::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Contracts::PartnerId).uuid().not_null())
                    .col(ColumnDef::new(Contracts::Status).string().not_null())
                    .col(ColumnDef::new(Contracts::PaymentPlan).string())
                    .col(
                        ColumnDef::new(Contracts::Paid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Contracts::SubscriptionId).uuid())
                    .col(ColumnDef::new(Contracts::InviteRefusalReason).string())
                    .col(ColumnDef::new(Contracts::InviteRefusalMessage).text())
                    .col(ColumnDef::new(Contracts::AutoReleaseDays).integer())
                    .col(
                        ColumnDef::new(Contracts::RelativeDates)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Contracts::DismissReviewDates)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Contracts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Contracts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contracts_owner_id")
                            .from(Contracts::Table, Contracts::OwnerId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contracts_partner_id")
                            .from(Contracts::Table, Contracts::PartnerId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Collaborators::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collaborators::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collaborators::ContractId).uuid().not_null())
                    .col(ColumnDef::new(Collaborators::RoleId).uuid().not_null())
                    .col(ColumnDef::new(Collaborators::Permission).string().not_null())
                    .col(
                        ColumnDef::new(Collaborators::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collaborators_contract_id")
                            .from(Collaborators::Table, Collaborators::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collaborators_role_id")
                            .from(Collaborators::Table, Collaborators::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContractCompletions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContractCompletions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContractCompletions::ContractId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContractCompletions::InitiatedById).uuid())
                    .col(ColumnDef::new(ContractCompletions::Reason).text().not_null())
                    .col(
                        ColumnDef::new(ContractCompletions::PartialPayment)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractCompletions::CompletionType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractCompletions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contract_completions_contract_id")
                            .from(ContractCompletions::Table, ContractCompletions::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContractArchives::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContractArchives::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContractArchives::ContractId).uuid().not_null())
                    .col(ColumnDef::new(ContractArchives::RoleId).uuid().not_null())
                    .col(
                        ColumnDef::new(ContractArchives::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contract_archives_contract_id")
                            .from(ContractArchives::Table, ContractArchives::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContractArchives::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContractCompletions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Collaborators::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contracts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}
