use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ExprTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::entities::auth_session;

/// Persisted admin session. Only the SHA-256 of the bearer token is stored.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    fn from_model(model: auth_session::Model) -> Self {
        Self {
            id: model.uuid,
            user_id: model.user_id,
            expires_at: model.expires_at,
            revoked_at: model.revoked_at,
            created_at: model.created_at,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let model = auth_session::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(token_hash.to_string()),
            expires_at: Set(expires_at),
            revoked_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_active_by_hash<C: ConnectionTrait>(
        db: &C,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        let record = auth_session::Entity::find()
            .filter(auth_session::Column::TokenHash.eq(token_hash))
            .filter(auth_session::Column::RevokedAt.is_null())
            .filter(auth_session::Column::ExpiresAt.gt(now))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Marks the session revoked. Returns `false` when it was already
    /// gone or revoked.
    pub async fn revoke<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = auth_session::Entity::update_many()
            .col_expr(
                auth_session::Column::RevokedAt,
                sea_orm::sea_query::Expr::value(Some(now)),
            )
            .filter(auth_session::Column::Uuid.eq(id))
            .filter(auth_session::Column::RevokedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Deletes sessions that expired or were revoked before `now`,
    /// returning the ids that were still live until their expiry.
    pub async fn purge_expired<C: ConnectionTrait>(
        db: &C,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, DbErr> {
        let expired = auth_session::Entity::find()
            .filter(auth_session::Column::ExpiresAt.lte(now))
            .filter(auth_session::Column::RevokedAt.is_null())
            .all(db)
            .await?;
        let expired_ids: Vec<Uuid> = expired.iter().map(|record| record.uuid).collect();

        auth_session::Entity::delete_many()
            .filter(
                auth_session::Column::ExpiresAt
                    .lte(now)
                    .or(auth_session::Column::RevokedAt.is_not_null()),
            )
            .exec(db)
            .await?;
        Ok(expired_ids)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::admin_user::AdminUser;

    async fn setup() -> (sea_orm::DatabaseConnection, i64) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let user = AdminUser::create(&db, "admin@caritas.org", "hash", None)
            .await
            .unwrap();
        (db, user.row_id)
    }

    #[tokio::test]
    async fn revoked_and_expired_sessions_are_not_active() {
        let (db, user_id) = setup().await;
        let now = Utc::now();
        let live = AuthSession::create(&db, user_id, "live", now + Duration::hours(1))
            .await
            .unwrap();
        AuthSession::create(&db, user_id, "old", now - Duration::minutes(1))
            .await
            .unwrap();

        assert!(
            AuthSession::find_active_by_hash(&db, "live", now)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            AuthSession::find_active_by_hash(&db, "old", now)
                .await
                .unwrap()
                .is_none()
        );

        assert!(AuthSession::revoke(&db, live.id, now).await.unwrap());
        assert!(!AuthSession::revoke(&db, live.id, now).await.unwrap());
        assert!(
            AuthSession::find_active_by_hash(&db, "live", now)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn purge_reports_expired_sessions() {
        let (db, user_id) = setup().await;
        let now = Utc::now();
        let old = AuthSession::create(&db, user_id, "old", now - Duration::minutes(5))
            .await
            .unwrap();
        AuthSession::create(&db, user_id, "fresh", now + Duration::hours(2))
            .await
            .unwrap();

        let expired = AuthSession::purge_expired(&db, now).await.unwrap();
        assert_eq!(expired, vec![old.id]);
        assert!(
            AuthSession::find_active_by_hash(&db, "fresh", now)
                .await
                .unwrap()
                .is_some()
        );
    }
}
