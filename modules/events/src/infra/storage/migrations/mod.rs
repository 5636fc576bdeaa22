use sea_orm_migration::prelude::*;

mod m20250101_000001_create_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_000001_create_events::Migration)]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("events_migrations").into_iden()
    }
}
