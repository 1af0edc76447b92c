use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "movimentacoes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub bem_id: i64,
    pub setor: String,
    pub responsavel: String,
    pub data_movimentacao: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bem_patrimonial::Entity",
        from = "Column::BemId",
        to = "super::bem_patrimonial::Column::Id",
        on_delete = "Cascade"
    )]
    BemPatrimonial,
}

impl Related<super::bem_patrimonial::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BemPatrimonial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
