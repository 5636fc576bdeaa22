use sea_orm_migration::prelude::*;

mod m20250101_000001_create_opportunities;
mod m20250101_000002_create_applications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_opportunities::Migration),
            Box::new(m20250101_000002_create_applications::Migration),
        ]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("opportunities_migrations").into_iden()
    }
}
