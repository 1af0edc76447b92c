use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils_core::links::normalize_external_url;
use uuid::Uuid;

use super::{
    pagination::{Page, PageRequest, contains_ci, search_term},
    validation::{ValidationErrors, non_blank},
};
use crate::entities::noticia;

pub const CAROUSEL_LIMIT: u64 = 10;

#[derive(Debug, Error)]
pub enum NoticiaError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Noticia not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Where "read more" leads: an external article when the item carries a
/// link, the local detail page otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NoticiaLink {
    External { url: String },
    Internal { path: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Noticia {
    pub id: Uuid,
    pub titulo: String,
    pub resumo: String,
    pub conteudo: Option<String>,
    pub url: Option<String>,
    pub imagem_url: Option<String>,
    pub data_publicacao: NaiveDate,
    pub ativo: bool,
    pub autor: Option<String>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct PublicNoticia {
    pub id: Uuid,
    pub titulo: String,
    pub resumo: String,
    pub conteudo: Option<String>,
    pub imagem_url: Option<String>,
    pub data_publicacao: NaiveDate,
    pub autor: Option<String>,
    pub link: NoticiaLink,
}

fn default_ativo() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateNoticia {
    pub titulo: String,
    pub resumo: String,
    pub conteudo: Option<String>,
    pub url: Option<String>,
    pub imagem_url: Option<String>,
    pub data_publicacao: NaiveDate,
    #[serde(default = "default_ativo")]
    pub ativo: bool,
    pub autor: Option<String>,
}

pub type UpdateNoticia = CreateNoticia;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, TS)]
pub struct NoticiaFilter {
    pub search: Option<String>,
    pub ativo: Option<bool>,
}

impl CreateNoticia {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_min_chars(
            "titulo",
            &self.titulo,
            3,
            "Título é obrigatório (mínimo 3 caracteres)",
        );
        errors.require_min_chars(
            "resumo",
            &self.resumo,
            5,
            "Subtítulo/Resumo é obrigatório (mínimo 5 caracteres)",
        );
        let normalized = self.url.as_deref().and_then(normalize_external_url);
        errors.optional_link("url", normalized.as_deref());
        errors.optional_link("imagem_url", self.imagem_url.as_deref());
        errors.into_result()
    }
}

pub fn link_for(id: Uuid, url: Option<&str>) -> NoticiaLink {
    match url.and_then(normalize_external_url) {
        Some(url) => NoticiaLink::External { url },
        None => NoticiaLink::Internal {
            path: format!("/noticia/{id}"),
        },
    }
}

impl Noticia {
    fn from_model(model: noticia::Model) -> Self {
        Self {
            id: model.uuid,
            titulo: model.titulo,
            resumo: model.resumo,
            conteudo: model.conteudo,
            url: model.url,
            imagem_url: model.imagem_url,
            data_publicacao: model.data_publicacao,
            ativo: model.ativo,
            autor: model.autor,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub fn link(&self) -> NoticiaLink {
        link_for(self.id, self.url.as_deref())
    }

    pub fn into_public(self) -> PublicNoticia {
        let link = self.link();
        PublicNoticia {
            id: self.id,
            titulo: self.titulo,
            resumo: self.resumo,
            conteudo: self.conteudo,
            imagem_url: self.imagem_url,
            data_publicacao: self.data_publicacao,
            autor: self.autor,
            link,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = noticia::Entity::find()
            .filter(noticia::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_active_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = noticia::Entity::find()
            .filter(noticia::Column::Uuid.eq(id))
            .filter(noticia::Column::Ativo.eq(true))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Active items, most recently published first.
    pub async fn list_active<C: ConnectionTrait>(db: &C, limit: u64) -> Result<Vec<Self>, DbErr> {
        let records = noticia::Entity::find()
            .filter(noticia::Column::Ativo.eq(true))
            .order_by_desc(noticia::Column::DataPublicacao)
            .order_by_desc(noticia::Column::Id)
            .limit(limit)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn list_admin<C: ConnectionTrait>(
        db: &C,
        filter: &NoticiaFilter,
        request: PageRequest,
    ) -> Result<Page<Self>, DbErr> {
        let mut query = noticia::Entity::find();
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(contains_ci(noticia::Column::Titulo, term));
        }
        if let Some(ativo) = filter.ativo {
            query = query.filter(noticia::Column::Ativo.eq(ativo));
        }
        let paginator = query
            .order_by_desc(noticia::Column::DataPublicacao)
            .order_by_desc(noticia::Column::Id)
            .paginate(db, request.page_size);
        let count = paginator.num_items().await?;
        let records = paginator.fetch_page(request.index()).await?;
        Ok(Page::new(
            records.into_iter().map(Self::from_model).collect(),
            count,
            request,
        ))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateNoticia,
        noticia_id: Uuid,
    ) -> Result<Self, NoticiaError> {
        data.validate()?;
        let now = Utc::now();
        let active = noticia::ActiveModel {
            uuid: Set(noticia_id),
            titulo: Set(data.titulo.trim().to_string()),
            resumo: Set(data.resumo.trim().to_string()),
            conteudo: Set(non_blank(data.conteudo.as_deref())),
            url: Set(non_blank(data.url.as_deref())),
            imagem_url: Set(non_blank(data.imagem_url.as_deref())),
            data_publicacao: Set(data.data_publicacao),
            ativo: Set(data.ativo),
            autor: Set(non_blank(data.autor.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Replaces the editable fields. An absent `imagem_url` keeps the
    /// current image.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateNoticia,
    ) -> Result<Self, NoticiaError> {
        data.validate()?;
        let record = noticia::Entity::find()
            .filter(noticia::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(NoticiaError::NotFound)?;

        let mut active: noticia::ActiveModel = record.into();
        active.titulo = Set(data.titulo.trim().to_string());
        active.resumo = Set(data.resumo.trim().to_string());
        active.conteudo = Set(non_blank(data.conteudo.as_deref()));
        active.url = Set(non_blank(data.url.as_deref()));
        if let Some(imagem_url) = non_blank(data.imagem_url.as_deref()) {
            active.imagem_url = Set(Some(imagem_url));
        }
        active.data_publicacao = Set(data.data_publicacao);
        active.ativo = Set(data.ativo);
        active.autor = Set(non_blank(data.autor.as_deref()));
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn set_ativo<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        ativo: bool,
    ) -> Result<Self, NoticiaError> {
        let record = noticia::Entity::find()
            .filter(noticia::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(NoticiaError::NotFound)?;
        let mut active: noticia::ActiveModel = record.into();
        active.ativo = Set(ativo);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = noticia::Entity::delete_many()
            .filter(noticia::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
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

    fn payload(titulo: &str, day: u32, ativo: bool, url: Option<&str>) -> CreateNoticia {
        CreateNoticia {
            titulo: titulo.to_string(),
            resumo: "Resumo da notícia".to_string(),
            conteudo: Some("<p>Conteúdo</p>".to_string()),
            url: url.map(str::to_string),
            imagem_url: None,
            data_publicacao: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            ativo,
            autor: None,
        }
    }

    #[test]
    fn link_prefers_external_url() {
        let id = Uuid::new_v4();
        assert_eq!(
            link_for(id, Some("example.com/materia")),
            NoticiaLink::External {
                url: "https://example.com/materia".to_string()
            }
        );
        assert_eq!(
            link_for(id, Some("   ")),
            NoticiaLink::Internal {
                path: format!("/noticia/{id}")
            }
        );
        assert_eq!(
            link_for(id, None),
            NoticiaLink::Internal {
                path: format!("/noticia/{id}")
            }
        );
    }

    #[test]
    fn link_serializes_with_kind_tag() {
        let json = serde_json::to_value(NoticiaLink::External {
            url: "https://example.com".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "external");
        assert_eq!(json["url"], "https://example.com");
    }

    #[test]
    fn validation_reports_short_fields() {
        let mut data = payload("ab", 1, true, Some("exa mple"));
        data.resumo = "curt".to_string();
        let errors = data.validate().unwrap_err();
        assert!(errors.has_field("titulo"));
        assert!(errors.has_field("resumo"));
        assert!(errors.has_field("url"));
    }

    #[tokio::test]
    async fn active_items_are_newest_first_and_limited() {
        let db = setup_db().await;
        for day in 1..=12 {
            Noticia::create(&db, &payload(&format!("Notícia {day}"), day, true, None), Uuid::new_v4())
                .await
                .unwrap();
        }
        Noticia::create(&db, &payload("Oculta", 28, false, None), Uuid::new_v4())
            .await
            .unwrap();

        let carousel = Noticia::list_active(&db, CAROUSEL_LIMIT).await.unwrap();
        assert_eq!(carousel.len(), 10);
        assert_eq!(carousel[0].titulo, "Notícia 12");
        assert!(carousel.iter().all(|n| n.ativo));
        assert!(
            carousel
                .windows(2)
                .all(|pair| pair[0].data_publicacao >= pair[1].data_publicacao)
        );
    }

    #[tokio::test]
    async fn admin_list_filters_and_toggle_hides_item() {
        let db = setup_db().await;
        let id = Uuid::new_v4();
        Noticia::create(&db, &payload("Campanha do agasalho", 5, true, None), id)
            .await
            .unwrap();
        Noticia::create(&db, &payload("Outra", 6, true, None), Uuid::new_v4())
            .await
            .unwrap();

        let found = Noticia::list_admin(
            &db,
            &NoticiaFilter {
                search: Some("agasalho".to_string()),
                ativo: None,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(found.count, 1);

        let toggled = Noticia::set_ativo(&db, id, false).await.unwrap();
        assert!(!toggled.ativo);
        assert!(Noticia::find_active_by_id(&db, id).await.unwrap().is_none());
        assert!(Noticia::find_by_id(&db, id).await.unwrap().is_some());

        let inactive = Noticia::list_admin(
            &db,
            &NoticiaFilter {
                search: None,
                ativo: Some(false),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(inactive.count, 1);
        assert_eq!(inactive.items[0].id, id);
    }
}
