use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Collaborators {
    Table,
    ContractId,
    RoleId,
}

#[derive(DeriveIden)]
enum ContractArchives {
    Table,
    ContractId,
    RoleId,
}

#[derive(DeriveIden)]
enum ContractCompletions {
    Table,
    ContractId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Phases {
    Table,
    ContractId,
    Order,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    PhaseId,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    ExternalJobId,
}

#[derive(DeriveIden)]
enum ActivitySeen {
    Table,
    RoleId,
    ActivityType,
    SubjectId,
}

#[derive(DeriveIden)]
enum ContractActivities {
    Table,
    ContractId,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FileAssignees {
    Table,
    FileId,
    CollaboratorId,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    RoleId,
    Active,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One grant per role and contract
        manager
            .create_index(
                Index::create()
                    .name("idx_collaborators_contract_role")
                    .table(Collaborators::Table)
                    .col(Collaborators::ContractId)
                    .col(Collaborators::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Archive is idempotent through ON CONFLICT on this pair
        manager
            .create_index(
                Index::create()
                    .name("idx_contract_archives_contract_role")
                    .table(ContractArchives::Table)
                    .col(ContractArchives::ContractId)
                    .col(ContractArchives::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Latest completion lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_contract_completions_contract_created")
                    .table(ContractCompletions::Table)
                    .col(ContractCompletions::ContractId)
                    .col(ContractCompletions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_phases_contract_order")
                    .table(Phases::Table)
                    .col(Phases::ContractId)
                    .col(Phases::Order)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tasks_phase_id")
                    .table(Tasks::Table)
                    .col(Tasks::PhaseId)
                    .to_owned(),
            )
            .await?;

        // Reconciling an existing release-payout job
        manager
            .create_index(
                Index::create()
                    .name("idx_payments_external_job_id")
                    .table(Payments::Table)
                    .col(Payments::ExternalJobId)
                    .to_owned(),
            )
            .await?;

        // Seen receipts are upserted on this triple
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_seen_role_type_subject")
                    .table(ActivitySeen::Table)
                    .col(ActivitySeen::RoleId)
                    .col(ActivitySeen::ActivityType)
                    .col(ActivitySeen::SubjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Activity feed pages
        manager
            .create_index(
                Index::create()
                    .name("idx_contract_activities_contract_updated")
                    .table(ContractActivities::Table)
                    .col(ContractActivities::ContractId)
                    .col(ContractActivities::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_file_assignees_file_collaborator")
                    .table(FileAssignees::Table)
                    .col(FileAssignees::FileId)
                    .col(FileAssignees::CollaboratorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_role_active")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::RoleId)
                    .col(Subscriptions::Active)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_collaborators_contract_role",
            "idx_contract_archives_contract_role",
            "idx_contract_completions_contract_created",
            "idx_phases_contract_order",
            "idx_tasks_phase_id",
            "idx_payments_external_job_id",
            "idx_activity_seen_role_type_subject",
            "idx_contract_activities_contract_updated",
            "idx_file_assignees_file_collaborator",
            "idx_subscriptions_role_active",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}
