use sea_orm_migration::prelude::*;

use crate::columns::{fk_id_col, pk_id_col, timestamp_col, unique_uuid_index, uuid_col};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(AdminUsers::Table)
                    .col(pk_id_col(manager, AdminUsers::Id))
                    .col(uuid_col(AdminUsers::Uuid))
                    .col(ColumnDef::new(AdminUsers::Email).string().not_null())
                    .col(ColumnDef::new(AdminUsers::PasswordHash).string().not_null())
                    .col(ColumnDef::new(AdminUsers::DisplayName).string())
                    .col(timestamp_col(AdminUsers::CreatedAt))
                    .col(timestamp_col(AdminUsers::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(unique_uuid_index(
                "idx_admin_users_uuid",
                AdminUsers::Table,
                AdminUsers::Uuid,
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_admin_users_email")
                    .table(AdminUsers::Table)
                    .col(AdminUsers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(AuthSessions::Table)
                    .col(pk_id_col(manager, AuthSessions::Id))
                    .col(uuid_col(AuthSessions::Uuid))
                    .col(fk_id_col(manager, AuthSessions::UserId))
                    .col(
                        ColumnDef::new(AuthSessions::TokenHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuthSessions::ExpiresAt).timestamp().not_null())
                    .col(ColumnDef::new(AuthSessions::RevokedAt).timestamp())
                    .col(timestamp_col(AuthSessions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_sessions_user_id")
                            .from(AuthSessions::Table, AuthSessions::UserId)
                            .to(AdminUsers::Table, AdminUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(unique_uuid_index(
                "idx_auth_sessions_uuid",
                AuthSessions::Table,
                AuthSessions::Uuid,
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_auth_sessions_token_hash")
                    .table(AuthSessions::Table)
                    .col(AuthSessions::TokenHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_auth_sessions_expires_at")
                    .table(AuthSessions::Table)
                    .col(AuthSessions::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminUsers::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum AdminUsers {
    Table,
    Id,
    Uuid,
    Email,
    PasswordHash,
    DisplayName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AuthSessions {
    Table,
    Id,
    Uuid,
    UserId,
    TokenHash,
    ExpiresAt,
    RevokedAt,
    CreatedAt,
}
