use sea_orm::entity::prelude::*;

use crate::types::{EstadoBem, TipoBem};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bens_patrimoniais")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub tipo: TipoBem,
    pub nome: String,
    pub numero_serie: Option<String>,
    pub numero_tombamento: String,
    pub estado: EstadoBem,
    pub descricao: Option<String>,
    pub valor: f64,
    pub foto_url: Option<String>,
    pub localizacao_atual: Option<String>,
    pub responsavel_atual: Option<String>,
    pub data_ultima_movimentacao: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movimentacao::Entity")]
    Movimentacoes,
}

impl Related<super::movimentacao::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movimentacoes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
