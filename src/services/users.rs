use crate::{
    auth::hash_password,
    db::DbPool,
    entities::{user, UserRole},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Admin-facing management of system accounts. Self-service registration and
/// login live in [`crate::auth`].
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateUserInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateUserInput {
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create(&self, input: CreateUserInput) -> Result<user::Model, ServiceError> {
        self.ensure_unique_username(&input.username, None).await?;

        let password_hash =
            hash_password(&input.password).map_err(|e| ServiceError::HashError(e.to_string()))?;

        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username.clone()),
            password_hash: Set(password_hash),
            role: Set(input.role.unwrap_or(UserRole::User).to_string()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        info!(user_id = %created.id, "Created user");
        Ok(created)
    }

    pub async fn list(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(page, limit);
        let paginator = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        Ok((paginator.fetch_page(page - 1).await?, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    /// Change password, role or active flag. Username is immutable.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(password) = input.password {
            let hash =
                hash_password(&password).map_err(|e| ServiceError::HashError(e.to_string()))?;
            active.password_hash = Set(hash);
        }
        if let Some(role) = input.role {
            active.role = Set(role.to_string());
        }
        if let Some(flag) = input.active {
            active.active = Set(flag);
        }

        Ok(active.update(&*self.db).await?)
    }

    async fn ensure_unique_username(
        &self,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = user::Entity::find().filter(user::Column::Username.eq(username));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }
        Ok(())
    }
}
