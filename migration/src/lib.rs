pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_roles_and_contracts;
mod m20260301_000002_create_work_tables;
mod m20260301_000003_create_activity_tables;
mod m20260301_000004_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_roles_and_contracts::Migration),
            Box::new(m20260301_000002_create_work_tables::Migration),
            Box::new(m20260301_000003_create_activity_tables::Migration),
            Box::new(m20260301_000004_add_indexes::Migration),
        ]
    }
}
