use sea_orm_migration::prelude::*;

mod columns;
mod m20250101000000_editais_noticias;
mod m20250201000000_patrimonio;
mod m20250301000000_admin_auth;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101000000_editais_noticias::Migration),
            Box::new(m20250201000000_patrimonio::Migration),
            Box::new(m20250301000000_admin_auth::Migration),
        ]
    }
}
