use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::admin_user;

/// Editor account. The password hash is skipped when serializing.
#[derive(Debug, Clone, Serialize, TS)]
pub struct AdminUser {
    #[serde(skip)]
    #[ts(skip)]
    pub row_id: i64,
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub display_name: Option<String>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AdminUser {
    fn from_model(model: admin_user::Model) -> Self {
        Self {
            row_id: model.id,
            id: model.uuid,
            email: model.email,
            password_hash: model.password_hash,
            display_name: model.display_name,
            created_at: model.created_at,
        }
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_row_id<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        let record = admin_user::Entity::find_by_id(row_id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
        admin_user::Entity::find().count(db).await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        email: &str,
        password_hash: &str,
        display_name: Option<&str>,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let model = admin_user::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            email: Set(normalize_email(email)),
            password_hash: Set(password_hash.to_string()),
            display_name: Set(display_name.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(Self::from_model(model))
    }

    pub async fn set_password_hash<C: ConnectionTrait>(
        db: &C,
        row_id: i64,
        password_hash: &str,
    ) -> Result<(), DbErr> {
        let Some(record) = admin_user::Entity::find_by_id(row_id).one(db).await? else {
            return Err(DbErr::RecordNotFound(format!("admin user {row_id}")));
        };
        let mut active: admin_user::ActiveModel = record.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();

        let created = AdminUser::create(&db, " Admin@Caritas.org ", "hash", None)
            .await
            .unwrap();
        assert_eq!(created.email, "admin@caritas.org");

        let found = AdminUser::find_by_email(&db, "ADMIN@caritas.org")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(AdminUser::count(&db).await.unwrap(), 1);
    }
}
