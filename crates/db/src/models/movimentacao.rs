use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionSession, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{bem_patrimonial::BemPatrimonial, validation::ValidationErrors};
use crate::{
    entities::{bem_patrimonial, movimentacao},
    retry::retry_on_sqlite_busy,
};

#[derive(Debug, Error)]
pub enum MovimentacaoError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Bem patrimonial not found")]
    BemNotFound,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Movimentacao {
    pub id: Uuid,
    pub bem_id: Uuid,
    pub setor: String,
    pub responsavel: String,
    pub data_movimentacao: NaiveDate,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct RegisterMovimentacao {
    pub setor: String,
    pub responsavel: String,
    pub data_movimentacao: NaiveDate,
}

/// Result of a registration: the history entry and the asset with its
/// updated location.
#[derive(Debug, Clone, Serialize, TS)]
pub struct MovimentacaoRegistrada {
    pub movimentacao: Movimentacao,
    pub bem: BemPatrimonial,
}

fn earliest_movement_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl RegisterMovimentacao {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_min_chars("setor", &self.setor, 1, "O setor é obrigatório");
        errors.require_min_chars(
            "responsavel",
            &self.responsavel,
            1,
            "O nome do responsável é obrigatório",
        );
        if self.data_movimentacao > today {
            errors.push("data_movimentacao", "A data não pode ser no futuro");
        } else if self.data_movimentacao < earliest_movement_date() {
            errors.push("data_movimentacao", "Data inválida");
        }
        errors.into_result()
    }
}

impl Movimentacao {
    fn from_model(model: movimentacao::Model, bem_id: Uuid) -> Self {
        Self {
            id: model.uuid,
            bem_id,
            setor: model.setor,
            responsavel: model.responsavel,
            data_movimentacao: model.data_movimentacao,
            created_at: model.created_at,
        }
    }

    /// Records a movement and moves the asset's current location to it.
    /// Both writes commit together or not at all.
    pub async fn register<C>(
        db: &C,
        bem_id: Uuid,
        data: &RegisterMovimentacao,
        movimentacao_id: Uuid,
        today: NaiveDate,
    ) -> Result<MovimentacaoRegistrada, MovimentacaoError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        data.validate(today)?;
        let registered =
            retry_on_sqlite_busy(|| Self::register_once(db, bem_id, data, movimentacao_id))
                .await?;
        let registered = registered.ok_or(MovimentacaoError::BemNotFound)?;
        tracing::info!(
            bem_id = %bem_id,
            setor = %registered.movimentacao.setor,
            "Movimentação registrada"
        );
        Ok(registered)
    }

    async fn register_once<C>(
        db: &C,
        bem_id: Uuid,
        data: &RegisterMovimentacao,
        movimentacao_id: Uuid,
    ) -> Result<Option<MovimentacaoRegistrada>, DbErr>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = db.begin().await?;
        let Some(bem) = bem_patrimonial::Entity::find()
            .filter(bem_patrimonial::Column::Uuid.eq(bem_id))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let setor = data.setor.trim().to_string();
        let responsavel = data.responsavel.trim().to_string();
        let now = Utc::now();

        let movement = movimentacao::ActiveModel {
            uuid: Set(movimentacao_id),
            bem_id: Set(bem.id),
            setor: Set(setor.clone()),
            responsavel: Set(responsavel.clone()),
            data_movimentacao: Set(data.data_movimentacao),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut active: bem_patrimonial::ActiveModel = bem.into();
        active.localizacao_atual = Set(Some(setor));
        active.responsavel_atual = Set(Some(responsavel));
        active.data_ultima_movimentacao = Set(Some(data.data_movimentacao));
        active.updated_at = Set(now);
        let bem = active.update(&txn).await?;

        txn.commit().await?;
        Ok(Some(MovimentacaoRegistrada {
            movimentacao: Self::from_model(movement, bem_id),
            bem: BemPatrimonial::from_model(bem),
        }))
    }

    /// History of an asset, newest movement date first. Entries on the
    /// same date come back most recently registered first.
    pub async fn list_for_bem<C: ConnectionTrait>(
        db: &C,
        bem_id: Uuid,
    ) -> Result<Vec<Self>, MovimentacaoError> {
        let bem = bem_patrimonial::Entity::find()
            .filter(bem_patrimonial::Column::Uuid.eq(bem_id))
            .one(db)
            .await?
            .ok_or(MovimentacaoError::BemNotFound)?;
        let records = movimentacao::Entity::find()
            .filter(movimentacao::Column::BemId.eq(bem.id))
            .order_by_desc(movimentacao::Column::DataMovimentacao)
            .order_by_desc(movimentacao::Column::Id)
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|record| Self::from_model(record, bem_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{Database, PaginatorTrait};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::{
        models::bem_patrimonial::CreateBem,
        types::{EstadoBem, TipoBem},
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed_bem(db: &sea_orm::DatabaseConnection) -> BemPatrimonial {
        let data = CreateBem {
            tipo: TipoBem::Tecnologia,
            nome: "Notebook".to_string(),
            numero_serie: Some("SN-1".to_string()),
            numero_tombamento: "T-001".to_string(),
            estado: EstadoBem::Bom,
            descricao: None,
            valor: 2500.0,
            foto_url: None,
        };
        BemPatrimonial::create(db, &data, Uuid::new_v4())
            .await
            .unwrap()
    }

    fn movement(setor: &str, responsavel: &str, on: NaiveDate) -> RegisterMovimentacao {
        RegisterMovimentacao {
            setor: setor.to_string(),
            responsavel: responsavel.to_string(),
            data_movimentacao: on,
        }
    }

    #[tokio::test]
    async fn register_updates_current_location() {
        let db = setup_db().await;
        let bem = seed_bem(&db).await;
        let today = date(2025, 3, 10);

        let registered = Movimentacao::register(
            &db,
            bem.id,
            &movement(" Secretaria ", "Maria", date(2025, 3, 1)),
            Uuid::new_v4(),
            today,
        )
        .await
        .unwrap();

        assert_eq!(registered.movimentacao.setor, "Secretaria");
        assert_eq!(registered.bem.localizacao_atual.as_deref(), Some("Secretaria"));
        assert_eq!(registered.bem.responsavel_atual.as_deref(), Some("Maria"));
        assert_eq!(
            registered.bem.data_ultima_movimentacao,
            Some(date(2025, 3, 1))
        );

        let reloaded = BemPatrimonial::find_by_id(&db, bem.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.localizacao_atual.as_deref(), Some("Secretaria"));
    }

    #[tokio::test]
    async fn history_is_newest_first_with_insertion_tiebreak() {
        let db = setup_db().await;
        let bem = seed_bem(&db).await;
        let today = date(2025, 3, 10);

        for (setor, on) in [
            ("Almoxarifado", date(2025, 1, 5)),
            ("Recepção", date(2025, 2, 1)),
            ("Secretaria", date(2025, 2, 1)),
        ] {
            Movimentacao::register(&db, bem.id, &movement(setor, "João", on), Uuid::new_v4(), today)
                .await
                .unwrap();
        }

        let history = Movimentacao::list_for_bem(&db, bem.id).await.unwrap();
        let setores: Vec<&str> = history.iter().map(|m| m.setor.as_str()).collect();
        assert_eq!(setores, vec!["Secretaria", "Recepção", "Almoxarifado"]);
    }

    #[tokio::test]
    async fn missing_bem_leaves_nothing_behind() {
        let db = setup_db().await;
        let err = Movimentacao::register(
            &db,
            Uuid::new_v4(),
            &movement("Secretaria", "Maria", date(2025, 1, 1)),
            Uuid::new_v4(),
            date(2025, 3, 10),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MovimentacaoError::BemNotFound));
        assert_eq!(movimentacao::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_movement_is_rejected_without_writes() {
        let db = setup_db().await;
        let bem = seed_bem(&db).await;
        let today = date(2025, 3, 10);

        let future = Movimentacao::register(
            &db,
            bem.id,
            &movement("Secretaria", "Maria", date(2025, 3, 11)),
            Uuid::new_v4(),
            today,
        )
        .await
        .unwrap_err();
        match future {
            MovimentacaoError::Validation(errors) => {
                assert!(errors.has_field("data_movimentacao"))
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let blank = movement(" ", "", date(1899, 12, 31))
            .validate(today)
            .unwrap_err();
        assert!(blank.has_field("setor"));
        assert!(blank.has_field("responsavel"));
        assert!(blank.has_field("data_movimentacao"));

        let reloaded = BemPatrimonial::find_by_id(&db, bem.id)
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.localizacao_atual.is_none());
    }

    #[tokio::test]
    async fn deleting_bem_removes_history() {
        let db = setup_db().await;
        let bem = seed_bem(&db).await;
        Movimentacao::register(
            &db,
            bem.id,
            &movement("Secretaria", "Maria", date(2025, 1, 1)),
            Uuid::new_v4(),
            date(2025, 3, 10),
        )
        .await
        .unwrap();

        assert_eq!(BemPatrimonial::delete(&db, bem.id).await.unwrap(), 1);
        assert_eq!(movimentacao::Entity::find().count(&db).await.unwrap(), 0);
    }
}
