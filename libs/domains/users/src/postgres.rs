use async_trait::async_trait;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    SqlErr, TransactionTrait,
};

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{CreateUser, User},
    repository::UserRepository,
};

/// PostgreSQL-backed implementation of UserRepository
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn storage_fault(e: sea_orm::DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", e))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_all(&self) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_fault)?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(storage_fault)?;

        Ok(model.map(|m| m.into()))
    }

    async fn find_by_user_name(&self, user_name: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::UserName.eq(user_name))
            .one(&self.db)
            .await
            .map_err(storage_fault)?;

        Ok(model.map(|m| m.into()))
    }

    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        // Compares LOWER(email) so stored casing never hides a duplicate
        let exists = entity::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(entity::Column::Email)))
                    .eq(email.to_lowercase()),
            )
            .one(&self.db)
            .await
            .map_err(storage_fault)?
            .is_some();

        Ok(exists)
    }

    async fn exists_by_user_name(&self, user_name: &str) -> UserResult<bool> {
        let exists = entity::Entity::find()
            .filter(entity::Column::UserName.eq(user_name))
            .one(&self.db)
            .await
            .map_err(storage_fault)?
            .is_some();

        Ok(exists)
    }

    async fn save(&self, input: CreateUser) -> UserResult<User> {
        let email = input.email.clone();
        let active_model: entity::ActiveModel = input.into();

        // Scoped transaction around the insert only; the caller performs the
        // existence check outside it
        let txn = self.db.begin().await.map_err(storage_fault)?;

        let model = active_model.insert(&txn).await.map_err(|e| {
            // The unique index on LOWER(email) closes the check-then-act race
            match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateEmail(email),
                _ => storage_fault(e),
            }
        })?;

        txn.commit().await.map_err(storage_fault)?;

        tracing::info!(user_id = model.id, "Created user");
        Ok(model.into())
    }
}
