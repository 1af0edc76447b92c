use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ExprTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    pagination::{Page, PageRequest, contains_ci, search_term},
    validation::{ValidationErrors, non_blank},
};
use crate::{
    entities::bem_patrimonial,
    types::{EstadoBem, TipoBem},
};

#[derive(Debug, Error)]
pub enum BemError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Bem patrimonial not found")]
    NotFound,
    #[error("Tombamento {0} already registered")]
    DuplicateTombamento(String),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BemPatrimonial {
    pub id: Uuid,
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
    pub data_ultima_movimentacao: Option<NaiveDate>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

/// Editable attributes. The location triple is only ever written by
/// movement registration.
#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateBem {
    pub tipo: TipoBem,
    pub nome: String,
    pub numero_serie: Option<String>,
    pub numero_tombamento: String,
    #[serde(default)]
    pub estado: EstadoBem,
    pub descricao: Option<String>,
    #[serde(default)]
    pub valor: f64,
    pub foto_url: Option<String>,
}

pub type UpdateBem = CreateBem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, TS)]
pub struct BemFilter {
    pub search: Option<String>,
    pub estado: Option<EstadoBem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, TS)]
pub struct RelatorioFilter {
    pub tipo: Option<String>,
    pub estado: Option<EstadoBem>,
    pub localizacao: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ResumoEstado {
    pub estado: EstadoBem,
    pub quantidade: u64,
    pub valor: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct RelatorioPatrimonio {
    pub items: Vec<BemPatrimonial>,
    pub total_itens: u64,
    pub valor_total: f64,
    pub por_estado: Vec<ResumoEstado>,
}

impl CreateBem {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_min_chars("nome", &self.nome, 1, "O nome do bem é obrigatório");
        errors.require_min_chars(
            "numero_tombamento",
            &self.numero_tombamento,
            1,
            "O número de tombamento é obrigatório",
        );
        if !self.valor.is_finite() || self.valor < 0.0 {
            errors.push("valor", "O valor não pode ser negativo");
        }
        errors.optional_link("foto_url", self.foto_url.as_deref());
        errors.into_result()
    }
}

fn map_unique_violation(err: DbErr, tombamento: &str) -> BemError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            BemError::DuplicateTombamento(tombamento.to_string())
        }
        _ => BemError::Database(err),
    }
}

impl BemPatrimonial {
    pub(crate) fn from_model(model: bem_patrimonial::Model) -> Self {
        Self {
            id: model.uuid,
            tipo: model.tipo,
            nome: model.nome,
            numero_serie: model.numero_serie,
            numero_tombamento: model.numero_tombamento,
            estado: model.estado,
            descricao: model.descricao,
            valor: model.valor,
            foto_url: model.foto_url,
            localizacao_atual: model.localizacao_atual,
            responsavel_atual: model.responsavel_atual,
            data_ultima_movimentacao: model.data_ultima_movimentacao,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = bem_patrimonial::Entity::find()
            .filter(bem_patrimonial::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn list<C: ConnectionTrait>(
        db: &C,
        filter: &BemFilter,
        request: PageRequest,
    ) -> Result<Page<Self>, DbErr> {
        let mut query = bem_patrimonial::Entity::find();
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                contains_ci(bem_patrimonial::Column::Nome, term)
                    .or(contains_ci(bem_patrimonial::Column::NumeroTombamento, term)),
            );
        }
        if let Some(estado) = filter.estado {
            query = query.filter(bem_patrimonial::Column::Estado.eq(estado));
        }
        let paginator = query
            .order_by_desc(bem_patrimonial::Column::CreatedAt)
            .order_by_desc(bem_patrimonial::Column::Id)
            .paginate(db, request.page_size);
        let count = paginator.num_items().await?;
        let records = paginator.fetch_page(request.index()).await?;
        Ok(Page::new(
            records.into_iter().map(Self::from_model).collect(),
            count,
            request,
        ))
    }

    /// Inventory report: every matching asset plus totals.
    pub async fn relatorio<C: ConnectionTrait>(
        db: &C,
        filter: &RelatorioFilter,
    ) -> Result<RelatorioPatrimonio, DbErr> {
        let mut query = bem_patrimonial::Entity::find();
        if let Some(tipo) = search_term(filter.tipo.as_deref()) {
            query = query.filter(contains_ci(bem_patrimonial::Column::Tipo, tipo));
        }
        if let Some(estado) = filter.estado {
            query = query.filter(bem_patrimonial::Column::Estado.eq(estado));
        }
        if let Some(localizacao) = search_term(filter.localizacao.as_deref()) {
            query = query.filter(contains_ci(
                bem_patrimonial::Column::LocalizacaoAtual,
                localizacao,
            ));
        }
        let records = query
            .order_by_asc(bem_patrimonial::Column::Tipo)
            .order_by_asc(bem_patrimonial::Column::Nome)
            .all(db)
            .await?;
        let items: Vec<Self> = records.into_iter().map(Self::from_model).collect();
        Ok(summarize(items))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateBem,
        bem_id: Uuid,
    ) -> Result<Self, BemError> {
        data.validate()?;
        let tombamento = data.numero_tombamento.trim().to_string();
        let now = Utc::now();
        let active = bem_patrimonial::ActiveModel {
            uuid: Set(bem_id),
            tipo: Set(data.tipo),
            nome: Set(data.nome.trim().to_string()),
            numero_serie: Set(non_blank(data.numero_serie.as_deref())),
            numero_tombamento: Set(tombamento.clone()),
            estado: Set(data.estado),
            descricao: Set(non_blank(data.descricao.as_deref())),
            valor: Set(data.valor),
            foto_url: Set(non_blank(data.foto_url.as_deref())),
            localizacao_atual: Set(None),
            responsavel_atual: Set(None),
            data_ultima_movimentacao: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active
            .insert(db)
            .await
            .map_err(|err| map_unique_violation(err, &tombamento))?;
        Ok(Self::from_model(model))
    }

    /// Replaces the editable attributes. An absent `foto_url` keeps the
    /// current photo.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateBem,
    ) -> Result<Self, BemError> {
        data.validate()?;
        let record = bem_patrimonial::Entity::find()
            .filter(bem_patrimonial::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(BemError::NotFound)?;

        let tombamento = data.numero_tombamento.trim().to_string();
        let mut active: bem_patrimonial::ActiveModel = record.into();
        active.tipo = Set(data.tipo);
        active.nome = Set(data.nome.trim().to_string());
        active.numero_serie = Set(non_blank(data.numero_serie.as_deref()));
        active.numero_tombamento = Set(tombamento.clone());
        active.estado = Set(data.estado);
        active.descricao = Set(non_blank(data.descricao.as_deref()));
        active.valor = Set(data.valor);
        if let Some(foto_url) = non_blank(data.foto_url.as_deref()) {
            active.foto_url = Set(Some(foto_url));
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(db)
            .await
            .map_err(|err| map_unique_violation(err, &tombamento))?;
        Ok(Self::from_model(updated))
    }

    /// Removes the asset; its movement history goes with it.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = bem_patrimonial::Entity::delete_many()
            .filter(bem_patrimonial::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

fn summarize(items: Vec<BemPatrimonial>) -> RelatorioPatrimonio {
    let mut por_estado: Vec<ResumoEstado> = Vec::new();
    for item in &items {
        match por_estado.iter_mut().find(|resumo| resumo.estado == item.estado) {
            Some(resumo) => {
                resumo.quantidade += 1;
                resumo.valor += item.valor;
            }
            None => por_estado.push(ResumoEstado {
                estado: item.estado,
                quantidade: 1,
                valor: item.valor,
            }),
        }
    }
    RelatorioPatrimonio {
        total_itens: items.len() as u64,
        valor_total: items.iter().map(|item| item.valor).sum(),
        por_estado,
        items,
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn bem_payload(nome: &str, tombamento: &str) -> CreateBem {
        CreateBem {
            tipo: TipoBem::Tecnologia,
            nome: nome.to_string(),
            numero_serie: None,
            numero_tombamento: tombamento.to_string(),
            estado: EstadoBem::Bom,
            descricao: None,
            valor: 1500.0,
            foto_url: None,
        }
    }

    #[test]
    fn negative_value_is_rejected() {
        let mut data = bem_payload("Notebook", "T-1");
        data.valor = -1.0;
        data.numero_tombamento = " ".to_string();
        let errors = data.validate().unwrap_err();
        assert!(errors.has_field("valor"));
        assert!(errors.has_field("numero_tombamento"));
    }

    #[tokio::test]
    async fn duplicate_tombamento_is_reported() {
        let db = setup_db().await;
        BemPatrimonial::create(&db, &bem_payload("Notebook", "T-100"), Uuid::new_v4())
            .await
            .unwrap();
        let err = BemPatrimonial::create(&db, &bem_payload("Impressora", "T-100"), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, BemError::DuplicateTombamento(ref t) if t == "T-100"));
    }

    #[tokio::test]
    async fn list_searches_name_and_tombamento() {
        let db = setup_db().await;
        BemPatrimonial::create(&db, &bem_payload("Notebook Dell", "T-1"), Uuid::new_v4())
            .await
            .unwrap();
        let mut cadeira = bem_payload("Cadeira", "MOV-7");
        cadeira.tipo = TipoBem::Moveis;
        cadeira.estado = EstadoBem::Regular;
        BemPatrimonial::create(&db, &cadeira, Uuid::new_v4())
            .await
            .unwrap();

        let by_name = BemPatrimonial::list(
            &db,
            &BemFilter {
                search: Some("dell".to_string()),
                estado: None,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(by_name.count, 1);

        let by_tombamento = BemPatrimonial::list(
            &db,
            &BemFilter {
                search: Some("mov-7".to_string()),
                estado: Some(EstadoBem::Regular),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(by_tombamento.count, 1);
        assert_eq!(by_tombamento.items[0].nome, "Cadeira");
    }

    #[tokio::test]
    async fn relatorio_totals_by_estado() {
        let db = setup_db().await;
        let mut novo = bem_payload("Projetor", "T-2");
        novo.estado = EstadoBem::Novo;
        novo.valor = 2000.0;
        BemPatrimonial::create(&db, &novo, Uuid::new_v4()).await.unwrap();
        BemPatrimonial::create(&db, &bem_payload("Notebook", "T-3"), Uuid::new_v4())
            .await
            .unwrap();
        let mut mesa = bem_payload("Mesa", "M-1");
        mesa.tipo = TipoBem::Moveis;
        mesa.valor = 300.0;
        BemPatrimonial::create(&db, &mesa, Uuid::new_v4()).await.unwrap();

        let tecnologia = BemPatrimonial::relatorio(
            &db,
            &RelatorioFilter {
                tipo: Some("tecnologia".to_string()),
                estado: None,
                localizacao: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(tecnologia.total_itens, 2);
        assert_eq!(tecnologia.valor_total, 3500.0);
        assert_eq!(tecnologia.por_estado.len(), 2);

        let bons = BemPatrimonial::relatorio(
            &db,
            &RelatorioFilter {
                tipo: None,
                estado: Some(EstadoBem::Bom),
                localizacao: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(bons.total_itens, 2);
        assert_eq!(bons.valor_total, 1800.0);
    }
}
