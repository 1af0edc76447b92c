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
                    .table(BensPatrimoniais::Table)
                    .col(pk_id_col(manager, BensPatrimoniais::Id))
                    .col(uuid_col(BensPatrimoniais::Uuid))
                    .col(
                        ColumnDef::new(BensPatrimoniais::Tipo)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BensPatrimoniais::Nome).string().not_null())
                    .col(ColumnDef::new(BensPatrimoniais::NumeroSerie).string())
                    .col(
                        ColumnDef::new(BensPatrimoniais::NumeroTombamento)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BensPatrimoniais::Estado)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("bom")),
                    )
                    .col(ColumnDef::new(BensPatrimoniais::Descricao).text())
                    .col(
                        ColumnDef::new(BensPatrimoniais::Valor)
                            .double()
                            .not_null()
                            .default(Expr::val(0.0)),
                    )
                    .col(ColumnDef::new(BensPatrimoniais::FotoUrl).text())
                    .col(ColumnDef::new(BensPatrimoniais::LocalizacaoAtual).string())
                    .col(ColumnDef::new(BensPatrimoniais::ResponsavelAtual).string())
                    .col(ColumnDef::new(BensPatrimoniais::DataUltimaMovimentacao).date())
                    .col(timestamp_col(BensPatrimoniais::CreatedAt))
                    .col(timestamp_col(BensPatrimoniais::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(unique_uuid_index(
                "idx_bens_patrimoniais_uuid",
                BensPatrimoniais::Table,
                BensPatrimoniais::Uuid,
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bens_patrimoniais_numero_tombamento")
                    .table(BensPatrimoniais::Table)
                    .col(BensPatrimoniais::NumeroTombamento)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Movimentacoes::Table)
                    .col(pk_id_col(manager, Movimentacoes::Id))
                    .col(uuid_col(Movimentacoes::Uuid))
                    .col(fk_id_col(manager, Movimentacoes::BemId))
                    .col(ColumnDef::new(Movimentacoes::Setor).string().not_null())
                    .col(ColumnDef::new(Movimentacoes::Responsavel).string().not_null())
                    .col(
                        ColumnDef::new(Movimentacoes::DataMovimentacao)
                            .date()
                            .not_null(),
                    )
                    .col(timestamp_col(Movimentacoes::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movimentacoes_bem_id")
                            .from(Movimentacoes::Table, Movimentacoes::BemId)
                            .to(BensPatrimoniais::Table, BensPatrimoniais::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(unique_uuid_index(
                "idx_movimentacoes_uuid",
                Movimentacoes::Table,
                Movimentacoes::Uuid,
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movimentacoes_bem_id_data")
                    .table(Movimentacoes::Table)
                    .col(Movimentacoes::BemId)
                    .col(Movimentacoes::DataMovimentacao)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Movimentacoes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BensPatrimoniais::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum BensPatrimoniais {
    Table,
    Id,
    Uuid,
    Tipo,
    Nome,
    NumeroSerie,
    NumeroTombamento,
    Estado,
    Descricao,
    Valor,
    FotoUrl,
    LocalizacaoAtual,
    ResponsavelAtual,
    DataUltimaMovimentacao,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Movimentacoes {
    Table,
    Id,
    Uuid,
    BemId,
    Setor,
    Responsavel,
    DataMovimentacao,
    CreatedAt,
}
