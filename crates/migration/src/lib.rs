pub use sea_orm_migration::prelude::*;

mod m20260831_000001_accounts;
mod m20260831_000002_verification_tokens;

pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260831_000001_accounts::Migration),
            Box::new(m20260831_000002_verification_tokens::Migration),
        ]
    }
}
