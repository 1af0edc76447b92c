use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils_core::calendar::{
    DATE_PLACEHOLDER, format_display_date, format_display_date_raw, parse_calendar_date,
};
use uuid::Uuid;

use super::{
    pagination::{Page, PageRequest, contains_ci, search_term},
    validation::{ValidationErrors, non_blank},
};
use crate::{entities::edital, types::EditalStatus};

#[derive(Debug, Error)]
pub enum EditalError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Edital not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Status a viewer sees for a call, given what the editor stored, the
/// deadline and today's date in the reference timezone.
///
/// A cancelled call stays cancelled. Once the deadline has passed
/// (strictly after it, comparing calendar dates) every call is finished
/// except one the editor explicitly moved to in-progress.
pub fn derive_status(
    stored: EditalStatus,
    deadline: Option<NaiveDate>,
    today: NaiveDate,
) -> EditalStatus {
    if stored == EditalStatus::Cancelled {
        return EditalStatus::Cancelled;
    }
    let Some(deadline) = deadline else {
        return stored;
    };
    if today > deadline {
        if stored == EditalStatus::InProgress {
            return EditalStatus::InProgress;
        }
        return EditalStatus::Finished;
    }
    stored
}

/// Same as [`derive_status`] for a deadline still in its stored text form.
/// Unparseable deadlines leave the stored status untouched.
pub fn derive_status_raw(
    stored: EditalStatus,
    deadline: Option<&str>,
    today: NaiveDate,
) -> EditalStatus {
    match deadline.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => derive_status(stored, None, today),
        Some(raw) => match parse_calendar_date(raw) {
            Some(date) => derive_status(stored, Some(date), today),
            None => stored,
        },
    }
}

/// In-progress is only a valid editor choice once the deadline has passed.
pub fn can_select_in_progress(deadline: Option<NaiveDate>, today: NaiveDate) -> bool {
    deadline.is_some_and(|deadline| today > deadline)
}

pub fn selectable_statuses(deadline: Option<NaiveDate>, today: NaiveDate) -> Vec<EditalStatus> {
    EditalStatus::ALL
        .into_iter()
        .filter(|status| {
            *status != EditalStatus::InProgress || can_select_in_progress(deadline, today)
        })
        .collect()
}

/// Editor preview for a deadline as typed, before it is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct StatusOptions {
    pub options: Vec<EditalStatus>,
    /// What the chosen status would be displayed as today.
    pub status: Option<EditalStatus>,
    pub prazo_exibicao: String,
}

pub fn status_options(
    chosen: Option<EditalStatus>,
    deadline: Option<&str>,
    today: NaiveDate,
) -> StatusOptions {
    let parsed = deadline.and_then(parse_calendar_date);
    StatusOptions {
        options: selectable_statuses(parsed, today),
        status: chosen.map(|stored| derive_status_raw(stored, deadline, today)),
        prazo_exibicao: format_display_date_raw(deadline),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Edital {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub data_publicacao: NaiveDate,
    /// Status as displayed.
    pub status: EditalStatus,
    /// Status as last chosen by an editor.
    pub stored_status: EditalStatus,
    pub data_finalizacao: Option<NaiveDate>,
    pub documento_url: Option<String>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

/// Projection exposed on the public site.
#[derive(Debug, Clone, Serialize, TS)]
pub struct PublicEdital {
    pub id: Uuid,
    pub nome: String,
    pub descricao: Option<String>,
    pub data_publicacao: NaiveDate,
    pub status: EditalStatus,
    pub data_finalizacao: Option<NaiveDate>,
    /// `dd/mm/yyyy`, or a placeholder when there is no deadline.
    pub prazo_exibicao: String,
    pub documento_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateEdital {
    pub nome: String,
    pub descricao: Option<String>,
    pub data_publicacao: NaiveDate,
    #[serde(default)]
    pub status: EditalStatus,
    pub data_finalizacao: Option<NaiveDate>,
    pub documento_url: Option<String>,
}

/// Full replacement of the editable fields. An absent `documento_url` keeps
/// the current document.
#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpdateEdital {
    pub nome: String,
    pub descricao: Option<String>,
    pub data_publicacao: NaiveDate,
    pub status: EditalStatus,
    pub data_finalizacao: Option<NaiveDate>,
    pub documento_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, TS)]
pub struct EditalFilter {
    pub search: Option<String>,
    pub status: Option<EditalStatus>,
}

fn validate_fields(
    errors: &mut ValidationErrors,
    nome: &str,
    status: EditalStatus,
    deadline: Option<NaiveDate>,
    documento_url: Option<&str>,
    today: NaiveDate,
) {
    errors.require_min_chars("nome", nome, 3, "Nome é obrigatório (mínimo 3 caracteres)");
    errors.optional_link("documento_url", documento_url);
    if status == EditalStatus::InProgress && !can_select_in_progress(deadline, today) {
        errors.push(
            "status",
            "\"Em andamento\" só pode ser escolhido após a data de finalização",
        );
    }
}

impl CreateEdital {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_fields(
            &mut errors,
            &self.nome,
            self.status,
            self.data_finalizacao,
            self.documento_url.as_deref(),
            today,
        );
        if non_blank(self.documento_url.as_deref()).is_none() {
            errors.push("documento_url", "Selecione um arquivo PDF");
        }
        errors.into_result()
    }
}

impl UpdateEdital {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_fields(
            &mut errors,
            &self.nome,
            self.status,
            self.data_finalizacao,
            self.documento_url.as_deref(),
            today,
        );
        errors.into_result()
    }
}

impl Edital {
    fn from_model(model: edital::Model) -> Self {
        Self {
            id: model.uuid,
            nome: model.nome,
            descricao: model.descricao,
            data_publicacao: model.data_publicacao,
            status: model.status,
            stored_status: model.status,
            data_finalizacao: model.data_finalizacao,
            documento_url: model.documento_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    /// Applies [`derive_status`] for display.
    pub fn derived(mut self, today: NaiveDate) -> Self {
        self.status = derive_status(self.stored_status, self.data_finalizacao, today);
        self
    }

    pub fn into_public(self, today: NaiveDate) -> PublicEdital {
        let derived = self.derived(today);
        PublicEdital {
            id: derived.id,
            nome: derived.nome,
            descricao: derived.descricao,
            data_publicacao: derived.data_publicacao,
            status: derived.status,
            data_finalizacao: derived.data_finalizacao,
            prazo_exibicao: derived
                .data_finalizacao
                .map(format_display_date)
                .unwrap_or_else(|| DATE_PLACEHOLDER.to_string()),
            documento_url: derived.documento_url,
        }
    }

    fn search_query(search: Option<&str>) -> Select<edital::Entity> {
        let mut query = edital::Entity::find();
        if let Some(term) = search_term(search) {
            query = query.filter(contains_ci(edital::Column::Nome, term));
        }
        query
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = edital::Entity::find()
            .filter(edital::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Editor listing: filters on the stored status, newest record first,
    /// paged in the store. Statuses are derived for display.
    pub async fn list_admin<C: ConnectionTrait>(
        db: &C,
        filter: &EditalFilter,
        request: PageRequest,
        today: NaiveDate,
    ) -> Result<Page<Self>, DbErr> {
        let mut query = Self::search_query(filter.search.as_deref());
        if let Some(status) = filter.status {
            query = query.filter(edital::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(edital::Column::CreatedAt)
            .order_by_desc(edital::Column::Id)
            .paginate(db, request.page_size);
        let count = paginator.num_items().await?;
        let records = paginator.fetch_page(request.index()).await?;
        let page = Page::new(records, count, request);
        Ok(page.map(|model| Self::from_model(model).derived(today)))
    }

    /// Public listing: the status filter applies to the derived status, so
    /// it runs after derivation and paging happens in memory.
    pub async fn list_public<C: ConnectionTrait>(
        db: &C,
        filter: &EditalFilter,
        request: PageRequest,
        today: NaiveDate,
    ) -> Result<Page<PublicEdital>, DbErr> {
        let records = Self::search_query(filter.search.as_deref())
            .order_by_desc(edital::Column::DataPublicacao)
            .order_by_desc(edital::Column::Id)
            .all(db)
            .await?;
        let visible: Vec<PublicEdital> = records
            .into_iter()
            .map(|model| Self::from_model(model).into_public(today))
            .filter(|edital| filter.status.is_none_or(|status| edital.status == status))
            .collect();
        Ok(Page::from_all(visible, request))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateEdital,
        edital_id: Uuid,
        today: NaiveDate,
    ) -> Result<Self, EditalError> {
        data.validate(today)?;
        let status = derive_status(data.status, data.data_finalizacao, today);
        let now = Utc::now();
        let active = edital::ActiveModel {
            uuid: Set(edital_id),
            nome: Set(data.nome.trim().to_string()),
            descricao: Set(non_blank(data.descricao.as_deref())),
            data_publicacao: Set(data.data_publicacao),
            status: Set(status),
            data_finalizacao: Set(data.data_finalizacao),
            documento_url: Set(non_blank(data.documento_url.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model).derived(today))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateEdital,
        today: NaiveDate,
    ) -> Result<Self, EditalError> {
        data.validate(today)?;
        let record = edital::Entity::find()
            .filter(edital::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(EditalError::NotFound)?;

        let mut active: edital::ActiveModel = record.into();
        active.nome = Set(data.nome.trim().to_string());
        active.descricao = Set(non_blank(data.descricao.as_deref()));
        active.data_publicacao = Set(data.data_publicacao);
        active.status = Set(derive_status(data.status, data.data_finalizacao, today));
        active.data_finalizacao = Set(data.data_finalizacao);
        if let Some(url) = non_blank(data.documento_url.as_deref()) {
            active.documento_url = Set(Some(url));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated).derived(today))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = edital::Entity::delete_many()
            .filter(edital::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
