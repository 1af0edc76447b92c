use sea_orm_migration::prelude::*;

use crate::columns::{pk_id_col, timestamp_col, unique_uuid_index, uuid_col};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Editais::Table)
                    .col(pk_id_col(manager, Editais::Id))
                    .col(uuid_col(Editais::Uuid))
                    .col(ColumnDef::new(Editais::Nome).string().not_null())
                    .col(ColumnDef::new(Editais::Descricao).text())
                    .col(ColumnDef::new(Editais::DataPublicacao).date().not_null())
                    .col(
                        ColumnDef::new(Editais::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("Aberto")),
                    )
                    .col(ColumnDef::new(Editais::DataFinalizacao).date())
                    .col(ColumnDef::new(Editais::DocumentoUrl).text())
                    .col(timestamp_col(Editais::CreatedAt))
                    .col(timestamp_col(Editais::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(unique_uuid_index(
                "idx_editais_uuid",
                Editais::Table,
                Editais::Uuid,
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_editais_data_publicacao")
                    .table(Editais::Table)
                    .col(Editais::DataPublicacao)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Noticias::Table)
                    .col(pk_id_col(manager, Noticias::Id))
                    .col(uuid_col(Noticias::Uuid))
                    .col(ColumnDef::new(Noticias::Titulo).string().not_null())
                    .col(ColumnDef::new(Noticias::Resumo).text().not_null())
                    .col(ColumnDef::new(Noticias::Conteudo).text())
                    .col(ColumnDef::new(Noticias::Url).text())
                    .col(ColumnDef::new(Noticias::ImagemUrl).text())
                    .col(ColumnDef::new(Noticias::DataPublicacao).date().not_null())
                    .col(
                        ColumnDef::new(Noticias::Ativo)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .col(ColumnDef::new(Noticias::Autor).string())
                    .col(timestamp_col(Noticias::CreatedAt))
                    .col(timestamp_col(Noticias::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(unique_uuid_index(
                "idx_noticias_uuid",
                Noticias::Table,
                Noticias::Uuid,
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_noticias_ativo_data_publicacao")
                    .table(Noticias::Table)
                    .col(Noticias::Ativo)
                    .col(Noticias::DataPublicacao)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Noticias::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Editais::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Editais {
    Table,
    Id,
    Uuid,
    Nome,
    Descricao,
    DataPublicacao,
    Status,
    DataFinalizacao,
    DocumentoUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Noticias {
    Table,
    Id,
    Uuid,
    Titulo,
    Resumo,
    Conteudo,
    Url,
    ImagemUrl,
    DataPublicacao,
    Ativo,
    Autor,
    CreatedAt,
    UpdatedAt,
}
