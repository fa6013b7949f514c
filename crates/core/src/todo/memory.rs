//! In-process todo repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use todo_shared::types::TodoId;

use super::error::TodoError;
use super::service::TodoRepository;
use super::types::{TodoItem, TodoUpdate};

/// Todo repository backed by a map, for tests and database-less local runs.
///
/// Updates and deletes of a `(user_id, todo_id)` pair that is not stored are no-ops.
#[derive(Debug, Default)]
pub struct MemoryTodoRepository {
    items: RwLock<HashMap<TodoId, TodoItem>>,
}

impl MemoryTodoRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn get(&self, _user_id: &str, todo_id: TodoId) -> Result<Option<TodoItem>, TodoError> {
        Ok(self.items.read().await.get(&todo_id).cloned())
    }

    async fn get_all(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        let mut items: Vec<TodoItem> = self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.created_at);
        Ok(items)
    }

    async fn put(&self, item: &TodoItem) -> Result<(), TodoError> {
        self.items.write().await.insert(item.todo_id, item.clone());
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: TodoId,
        update: &TodoUpdate,
    ) -> Result<(), TodoError> {
        if let Some(item) = self
            .items
            .write()
            .await
            .get_mut(&todo_id)
            .filter(|item| item.user_id == user_id)
        {
            item.apply(update);
        }
        Ok(())
    }

    async fn update_attachment_url(
        &self,
        user_id: &str,
        todo_id: TodoId,
        attachment_url: &str,
    ) -> Result<(), TodoError> {
        if let Some(item) = self
            .items
            .write()
            .await
            .get_mut(&todo_id)
            .filter(|item| item.user_id == user_id)
        {
            item.attachment_url = Some(attachment_url.to_string());
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, todo_id: TodoId) -> Result<(), TodoError> {
        let mut items = self.items.write().await;
        if items
            .get(&todo_id)
            .is_some_and(|item| item.user_id == user_id)
        {
            items.remove(&todo_id);
        }
        Ok(())
    }
}
