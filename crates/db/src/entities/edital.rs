use sea_orm::entity::prelude::*;

use crate::types::EditalStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "editais")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub data_publicacao: Date,
    pub status: EditalStatus,
    pub data_finalizacao: Option<Date>,
    pub documento_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
