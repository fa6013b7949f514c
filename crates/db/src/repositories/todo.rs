//! Todo repository for database operations.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use todo_core::todo::{TodoError, TodoItem, TodoRepository, TodoUpdate};
use todo_shared::types::TodoId;

use crate::entities::todos;

/// Postgres-backed todo repository.
#[derive(Debug, Clone)]
pub struct DbTodoRepository {
    db: DatabaseConnection,
}

impl DbTodoRepository {
    /// Creates a new todo repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn to_domain(model: todos::Model) -> TodoItem {
        TodoItem {
            user_id: model.user_id,
            todo_id: TodoId::from_uuid(model.todo_id),
            created_at: model.created_at.into(),
            name: model.name,
            due_date: model.due_date,
            done: model.done,
            attachment_url: model.attachment_url,
        }
    }

    /// Partial active model carrying only the fields present in `update`.
    fn changes(update: &TodoUpdate) -> todos::ActiveModel {
        let mut model = <todos::ActiveModel as Default>::default();
        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(due_date) = &update.due_date {
            model.due_date = Set(due_date.clone());
        }
        if let Some(done) = update.done {
            model.done = Set(done);
        }
        model
    }
}

#[async_trait]
impl TodoRepository for DbTodoRepository {
    async fn get(&self, _user_id: &str, todo_id: TodoId) -> Result<Option<TodoItem>, TodoError> {
        let model = todos::Entity::find()
            .filter(todos::Column::TodoId.eq(todo_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(|e| TodoError::repository(e.to_string()))?;

        Ok(model.map(Self::to_domain))
    }

    async fn get_all(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        let models = todos::Entity::find()
            .filter(todos::Column::UserId.eq(user_id))
            .order_by_asc(todos::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| TodoError::repository(e.to_string()))?;

        debug!(user_id, count = models.len(), "Fetched todos");
        Ok(models.into_iter().map(Self::to_domain).collect())
    }

    async fn put(&self, item: &TodoItem) -> Result<(), TodoError> {
        let model = todos::ActiveModel {
            user_id: Set(item.user_id.clone()),
            todo_id: Set(item.todo_id.into_inner()),
            created_at: Set(item.created_at.into()),
            name: Set(item.name.clone()),
            due_date: Set(item.due_date.clone()),
            done: Set(item.done),
            attachment_url: Set(item.attachment_url.clone()),
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| TodoError::repository(e.to_string()))?;

        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: TodoId,
        update: &TodoUpdate,
    ) -> Result<(), TodoError> {
        if update.is_empty() {
            return Ok(());
        }

        todos::Entity::update_many()
            .set(Self::changes(update))
            .filter(todos::Column::UserId.eq(user_id))
            .filter(todos::Column::TodoId.eq(todo_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| TodoError::repository(e.to_string()))?;

        Ok(())
    }

    async fn update_attachment_url(
        &self,
        user_id: &str,
        todo_id: TodoId,
        attachment_url: &str,
    ) -> Result<(), TodoError> {
        let model = todos::ActiveModel {
            attachment_url: Set(Some(attachment_url.to_string())),
            ..Default::default()
        };

        todos::Entity::update_many()
            .set(model)
            .filter(todos::Column::UserId.eq(user_id))
            .filter(todos::Column::TodoId.eq(todo_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| TodoError::repository(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, user_id: &str, todo_id: TodoId) -> Result<(), TodoError> {
        todos::Entity::delete_many()
            .filter(todos::Column::UserId.eq(user_id))
            .filter(todos::Column::TodoId.eq(todo_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| TodoError::repository(e.to_string()))?;

        Ok(())
    }
}
