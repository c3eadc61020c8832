use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum PaymentOperations {
    Table,
    Id,
    Amount,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Esigns {
    Table,
    Id,
    RoleId,
    Signature,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    ChargeId,
    PayoutId,
    PayoutRequestedAt,
    EsignId,
    ExternalJobId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Phases {
    Table,
    Id,
    ContractId,
    Name,
    Order,
    ActualMaterialCost,
    ActualLaborCost,
    ActualOtherCost,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    PhaseId,
    Name,
    MaterialCost,
    LaborCost,
    OtherCost,
    MarkupPercent,
    Status,
    StartDate,
    EndDate,
    PaymentId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TaskVersions {
    Table,
    Id,
    TaskId,
    Version,
    ChangeOrderId,
    MaterialCost,
    LaborCost,
    OtherCost,
    MarkupPercent,
    StartDate,
    EndDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ChangeOrders {
    Table,
    Id,
    ContractId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Decisions {
    Table,
    Id,
    TaskId,
    Title,
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

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn cents<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).big_integer().not_null().default(0).to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentOperations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentOperations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentOperations::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentOperations::Status).string().not_null())
                    .col(created_at(PaymentOperations::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Esigns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Esigns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Esigns::RoleId).uuid().not_null())
                    .col(ColumnDef::new(Esigns::Signature).text().not_null())
                    .col(created_at(Esigns::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_esigns_role_id")
                            .from(Esigns::Table, Esigns::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payments::ChargeId).uuid())
                    .col(ColumnDef::new(Payments::PayoutId).uuid())
                    .col(ColumnDef::new(Payments::PayoutRequestedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Payments::EsignId).uuid())
                    .col(ColumnDef::new(Payments::ExternalJobId).string())
                    .col(created_at(Payments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_charge_id")
                            .from(Payments::Table, Payments::ChargeId)
                            .to(PaymentOperations::Table, PaymentOperations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_payout_id")
                            .from(Payments::Table, Payments::PayoutId)
                            .to(PaymentOperations::Table, PaymentOperations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_esign_id")
                            .from(Payments::Table, Payments::EsignId)
                            .to(Esigns::Table, Esigns::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Phases::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Phases::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Phases::ContractId).uuid().not_null())
                    .col(ColumnDef::new(Phases::Name).string().not_null())
                    .col(ColumnDef::new(Phases::Order).integer().not_null())
                    .col(ColumnDef::new(Phases::ActualMaterialCost).big_integer())
                    .col(ColumnDef::new(Phases::ActualLaborCost).big_integer())
                    .col(ColumnDef::new(Phases::ActualOtherCost).big_integer())
                    .col(created_at(Phases::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phases_contract_id")
                            .from(Phases::Table, Phases::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tasks::PhaseId).uuid().not_null())
                    .col(ColumnDef::new(Tasks::Name).string().not_null())
                    .col(cents(Tasks::MaterialCost))
                    .col(cents(Tasks::LaborCost))
                    .col(cents(Tasks::OtherCost))
                    .col(
                        ColumnDef::new(Tasks::MarkupPercent)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string()
                            .not_null()
                            .default("todo"),
                    )
                    .col(
                        ColumnDef::new(Tasks::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tasks::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Tasks::PaymentId).uuid().unique_key())
                    .col(created_at(Tasks::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_phase_id")
                            .from(Tasks::Table, Tasks::PhaseId)
                            .to(Phases::Table, Phases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_payment_id")
                            .from(Tasks::Table, Tasks::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChangeOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChangeOrders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChangeOrders::ContractId).uuid().not_null())
                    .col(ColumnDef::new(ChangeOrders::Status).string().not_null())
                    .col(created_at(ChangeOrders::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_change_orders_contract_id")
                            .from(ChangeOrders::Table, ChangeOrders::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaskVersions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskVersions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaskVersions::TaskId).uuid().not_null())
                    .col(ColumnDef::new(TaskVersions::Version).integer().not_null())
                    .col(ColumnDef::new(TaskVersions::ChangeOrderId).uuid())
                    .col(cents(TaskVersions::MaterialCost))
                    .col(cents(TaskVersions::LaborCost))
                    .col(cents(TaskVersions::OtherCost))
                    .col(
                        ColumnDef::new(TaskVersions::MarkupPercent)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TaskVersions::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskVersions::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(created_at(TaskVersions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_versions_task_id")
                            .from(TaskVersions::Table, TaskVersions::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_versions_change_order_id")
                            .from(TaskVersions::Table, TaskVersions::ChangeOrderId)
                            .to(ChangeOrders::Table, ChangeOrders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Decisions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Decisions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Decisions::TaskId).uuid().not_null())
                    .col(ColumnDef::new(Decisions::Title).text().not_null())
                    .col(created_at(Decisions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_decisions_task_id")
                            .from(Decisions::Table, Decisions::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Decisions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskVersions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChangeOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Phases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Esigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentOperations::Table).to_owned())
            .await
    }
}
