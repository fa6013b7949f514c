//! Todo service implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use validator::Validate;

use todo_shared::types::{AttachmentId, TodoId};

use super::error::TodoError;
use super::types::{CreateTodoInput, TodoItem, TodoUpdate, UploadUrl};
use crate::storage::{PresignedUrl, StorageError};

/// Repository trait for todo persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
/// Every call is a single attempt against the store.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Find the todo with `todo_id`.
    ///
    /// Todo ids are globally unique, so the item is returned even when it is
    /// owned by someone other than `user_id`; the service decides what the
    /// caller may do with it.
    async fn get(&self, user_id: &str, todo_id: TodoId) -> Result<Option<TodoItem>, TodoError>;

    /// List all todos owned by `user_id`.
    async fn get_all(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError>;

    /// Insert a new todo.
    async fn put(&self, item: &TodoItem) -> Result<(), TodoError>;

    /// Overwrite the fields present in `update`.
    async fn update(
        &self,
        user_id: &str,
        todo_id: TodoId,
        update: &TodoUpdate,
    ) -> Result<(), TodoError>;

    /// Set the attachment URL.
    async fn update_attachment_url(
        &self,
        user_id: &str,
        todo_id: TodoId,
        attachment_url: &str,
    ) -> Result<(), TodoError>;

    /// Remove the todo permanently.
    async fn delete(&self, user_id: &str, todo_id: TodoId) -> Result<(), TodoError>;
}

/// Blob store gateway for attachments.
///
/// The object key of an attachment is its id.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Presigned URL that lets the holder upload the attachment.
    async fn upload_url(&self, attachment_id: AttachmentId) -> Result<PresignedUrl, StorageError>;

    /// Stable URL the attachment is retrieved from.
    async fn attachment_url(&self, attachment_id: AttachmentId) -> Result<String, StorageError>;
}

/// Todo service orchestrating the item store and the blob store.
#[derive(Clone)]
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    storage: Arc<dyn AttachmentStorage>,
}

impl std::fmt::Debug for TodoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoService").finish_non_exhaustive()
    }
}

impl TodoService {
    /// Create a new todo service.
    #[must_use]
    pub fn new(repo: Arc<dyn TodoRepository>, storage: Arc<dyn AttachmentStorage>) -> Self {
        Self { repo, storage }
    }

    /// List the caller's todos.
    ///
    /// # Errors
    ///
    /// Returns an error if the item store fails.
    pub async fn list_todos(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        info!(user_id, "Listing todos");
        self.repo.get_all(user_id).await
    }

    /// Create a todo for the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `name` or `due_date` is blank
    /// - The item store fails
    pub async fn create_todo(
        &self,
        user_id: &str,
        input: CreateTodoInput,
    ) -> Result<TodoItem, TodoError> {
        input.validate()?;

        let item = TodoItem::new(user_id, input);
        self.repo.put(&item).await?;

        info!(user_id, todo_id = %item.todo_id, "Todo created");
        Ok(item)
    }

    /// Update the caller's todo.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A present field is blank
    /// - The todo does not exist
    /// - The todo belongs to another user
    /// - The item store fails
    pub async fn update_todo(
        &self,
        user_id: &str,
        todo_id: TodoId,
        update: TodoUpdate,
    ) -> Result<(), TodoError> {
        update.validate()?;
        self.owned_todo(user_id, todo_id, "update").await?;

        self.repo.update(user_id, todo_id, &update).await?;

        info!(user_id, todo_id = %todo_id, ?update, "Todo updated");
        Ok(())
    }

    /// Delete the caller's todo.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The todo does not exist
    /// - The todo belongs to another user
    /// - The item store fails
    pub async fn delete_todo(&self, user_id: &str, todo_id: TodoId) -> Result<(), TodoError> {
        self.owned_todo(user_id, todo_id, "delete").await?;

        self.repo.delete(user_id, todo_id).await?;

        info!(user_id, todo_id = %todo_id, "Todo deleted");
        Ok(())
    }

    /// Point the caller's todo at an attachment.
    ///
    /// Calling this twice with the same attachment stores an equal URL.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The retrieval URL cannot be resolved
    /// - The todo does not exist
    /// - The todo belongs to another user
    /// - The item store fails
    pub async fn associate_attachment(
        &self,
        user_id: &str,
        todo_id: TodoId,
        attachment_id: AttachmentId,
    ) -> Result<String, TodoError> {
        let attachment_url = self.storage.attachment_url(attachment_id).await?;

        self.owned_todo(user_id, todo_id, "update").await?;

        self.repo
            .update_attachment_url(user_id, todo_id, &attachment_url)
            .await?;

        info!(
            user_id,
            todo_id = %todo_id,
            attachment_id = %attachment_id,
            attachment_url = %attachment_url,
            "Attachment associated"
        );
        Ok(attachment_url)
    }

    /// Presigned upload URL for an attachment.
    ///
    /// No ownership check happens here; it happens when the attachment is
    /// associated with a todo.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning fails.
    pub async fn create_upload_url(
        &self,
        attachment_id: AttachmentId,
    ) -> Result<PresignedUrl, TodoError> {
        info!(attachment_id = %attachment_id, "Generating upload URL");
        Ok(self.storage.upload_url(attachment_id).await?)
    }

    /// Generate an upload URL for a fresh attachment and associate that
    /// attachment with the caller's todo.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning fails or [`Self::associate_attachment`] fails.
    pub async fn generate_upload_url(
        &self,
        user_id: &str,
        todo_id: TodoId,
    ) -> Result<UploadUrl, TodoError> {
        let attachment_id = AttachmentId::new();

        let presigned = self.create_upload_url(attachment_id).await?;
        self.associate_attachment(user_id, todo_id, attachment_id)
            .await?;

        Ok(UploadUrl {
            attachment_id,
            upload_url: presigned.url,
            upload_method: presigned.method,
            upload_headers: presigned.headers,
            expires_at: presigned.expires_at,
        })
    }

    /// Fetch a todo and check that `user_id` owns it.
    async fn owned_todo(
        &self,
        user_id: &str,
        todo_id: TodoId,
        action: &str,
    ) -> Result<TodoItem, TodoError> {
        let item = self
            .repo
            .get(user_id, todo_id)
            .await?
            .ok_or(TodoError::NotFound(todo_id))?;

        if item.user_id != user_id {
            warn!(
                user_id,
                todo_id = %todo_id,
                action,
                "User does not have permission on todo"
            );
            return Err(TodoError::forbidden(user_id, todo_id));
        }

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::MemoryTodoRepository;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const ALICE: &str = "auth0|alice";
    const BOB: &str = "auth0|bob";

    /// Fake blob store producing URLs under a fixed base.
    struct FakeStorage;

    #[async_trait]
    impl AttachmentStorage for FakeStorage {
        async fn upload_url(
            &self,
            attachment_id: AttachmentId,
        ) -> Result<PresignedUrl, StorageError> {
            Ok(PresignedUrl {
                url: format!("https://blobs.test/{attachment_id}?signature=abc"),
                method: "PUT".to_string(),
                expires_at: Utc::now() + Duration::seconds(300),
                headers: HashMap::new(),
            })
        }

        async fn attachment_url(
            &self,
            attachment_id: AttachmentId,
        ) -> Result<String, StorageError> {
            Ok(format!("https://blobs.test/{attachment_id}"))
        }
    }

    /// Fake blob store that cannot presign.
    struct BrokenStorage;

    #[async_trait]
    impl AttachmentStorage for BrokenStorage {
        async fn upload_url(&self, _: AttachmentId) -> Result<PresignedUrl, StorageError> {
            Err(StorageError::PresignNotSupported)
        }

        async fn attachment_url(&self, _: AttachmentId) -> Result<String, StorageError> {
            Err(StorageError::operation("unreachable"))
        }
    }

    /// Repository that counts writes, to prove rejected calls never write.
    #[derive(Default)]
    struct CountingRepository {
        inner: MemoryTodoRepository,
        writes: Mutex<usize>,
    }

    impl CountingRepository {
        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }

        fn bump(&self) {
            *self.writes.lock().unwrap() += 1;
        }
    }

    #[async_trait]
    impl TodoRepository for CountingRepository {
        async fn get(&self, user_id: &str, todo_id: TodoId) -> Result<Option<TodoItem>, TodoError> {
            self.inner.get(user_id, todo_id).await
        }

        async fn get_all(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
            self.inner.get_all(user_id).await
        }

        async fn put(&self, item: &TodoItem) -> Result<(), TodoError> {
            self.bump();
            self.inner.put(item).await
        }

        async fn update(
            &self,
            user_id: &str,
            todo_id: TodoId,
            update: &TodoUpdate,
        ) -> Result<(), TodoError> {
            self.bump();
            self.inner.update(user_id, todo_id, update).await
        }

        async fn update_attachment_url(
            &self,
            user_id: &str,
            todo_id: TodoId,
            attachment_url: &str,
        ) -> Result<(), TodoError> {
            self.bump();
            self.inner
                .update_attachment_url(user_id, todo_id, attachment_url)
                .await
        }

        async fn delete(&self, user_id: &str, todo_id: TodoId) -> Result<(), TodoError> {
            self.bump();
            self.inner.delete(user_id, todo_id).await
        }
    }

    fn service_with(repo: Arc<CountingRepository>) -> TodoService {
        TodoService::new(repo, Arc::new(FakeStorage))
    }

    fn milk() -> CreateTodoInput {
        CreateTodoInput {
            name: "Buy milk".to_string(),
            due_date: "2024-01-01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_todo_defaults() {
        let repo = Arc::new(CountingRepository::default());
        let service = service_with(repo.clone());

        let item = service.create_todo(ALICE, milk()).await.unwrap();

        assert_eq!(item.user_id, ALICE);
        assert!(!item.done);
        assert!(item.attachment_url.is_none());
        assert_eq!(repo.writes(), 1);

        let stored = service.list_todos(ALICE).await.unwrap();
        assert_eq!(stored, vec![item]);
    }

    #[tokio::test]
    async fn test_create_todo_rejects_blank_name() {
        let repo = Arc::new(CountingRepository::default());
        let service = service_with(repo.clone());

        let result = service
            .create_todo(
                ALICE,
                CreateTodoInput {
                    name: " ".to_string(),
                    due_date: "2024-01-01".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(TodoError::Validation(_))));
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn test_created_ids_are_unique() {
        let service = service_with(Arc::new(CountingRepository::default()));

        let a = service.create_todo(ALICE, milk()).await.unwrap();
        let b = service.create_todo(ALICE, milk()).await.unwrap();

        assert_ne!(a.todo_id, b.todo_id);
        assert_eq!(service.list_todos(ALICE).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_only_returns_callers_todos() {
        let service = service_with(Arc::new(CountingRepository::default()));
        service.create_todo(ALICE, milk()).await.unwrap();
        service.create_todo(BOB, milk()).await.unwrap();
        service.create_todo(BOB, milk()).await.unwrap();

        let alice = service.list_todos(ALICE).await.unwrap();
        let bob = service.list_todos(BOB).await.unwrap();

        assert_eq!(alice.len(), 1);
        assert!(alice.iter().all(|t| t.user_id == ALICE));
        assert_eq!(bob.len(), 2);
        assert!(bob.iter().all(|t| t.user_id == BOB));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let item = service.create_todo(ALICE, milk()).await.unwrap();

        service
            .update_todo(
                ALICE,
                item.todo_id,
                TodoUpdate {
                    done: Some(true),
                    name: Some("Buy oat milk".to_string()),
                    due_date: None,
                },
            )
            .await
            .unwrap();

        let stored = &service.list_todos(ALICE).await.unwrap()[0];
        assert!(stored.done);
        assert_eq!(stored.name, "Buy oat milk");
        assert_eq!(stored.due_date, "2024-01-01");
        assert_eq!(stored.created_at, item.created_at);
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden_and_leaves_item() {
        let repo = Arc::new(CountingRepository::default());
        let service = service_with(repo.clone());
        let item = service.create_todo(ALICE, milk()).await.unwrap();

        let result = service
            .update_todo(
                BOB,
                item.todo_id,
                TodoUpdate {
                    done: Some(true),
                    ..TodoUpdate::default()
                },
            )
            .await;

        assert!(matches!(result, Err(TodoError::Forbidden { .. })));
        assert_eq!(repo.writes(), 1);
        assert_eq!(service.list_todos(ALICE).await.unwrap(), vec![item]);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_todo_not_found() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let missing = TodoId::new();

        let update = service
            .update_todo(ALICE, missing, TodoUpdate::default())
            .await;
        let delete = service.delete_todo(ALICE, missing).await;

        assert!(matches!(update, Err(TodoError::NotFound(id)) if id == missing));
        assert!(matches!(delete, Err(TodoError::NotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_delete_removes_permanently() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let item = service.create_todo(ALICE, milk()).await.unwrap();

        service.delete_todo(ALICE, item.todo_id).await.unwrap();

        assert!(service.list_todos(ALICE).await.unwrap().is_empty());
        let again = service.delete_todo(ALICE, item.todo_id).await;
        assert!(matches!(again, Err(TodoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_other_user_is_forbidden() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let item = service.create_todo(ALICE, milk()).await.unwrap();

        let result = service.delete_todo(BOB, item.todo_id).await;

        assert!(matches!(result, Err(TodoError::Forbidden { .. })));
        assert_eq!(service.list_todos(ALICE).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_associate_attachment_is_idempotent() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let item = service.create_todo(ALICE, milk()).await.unwrap();
        let attachment_id = AttachmentId::new();

        let first = service
            .associate_attachment(ALICE, item.todo_id, attachment_id)
            .await
            .unwrap();
        let second = service
            .associate_attachment(ALICE, item.todo_id, attachment_id)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert!(first.contains(&attachment_id.to_string()));
        let stored = &service.list_todos(ALICE).await.unwrap()[0];
        assert_eq!(stored.attachment_url.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_associate_attachment_checks_owner() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let item = service.create_todo(ALICE, milk()).await.unwrap();

        let result = service
            .associate_attachment(BOB, item.todo_id, AttachmentId::new())
            .await;

        assert!(matches!(result, Err(TodoError::Forbidden { .. })));
        assert!(service.list_todos(ALICE).await.unwrap()[0]
            .attachment_url
            .is_none());
    }

    #[tokio::test]
    async fn test_generate_upload_url_associates_new_attachment() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let item = service.create_todo(ALICE, milk()).await.unwrap();

        let upload = service
            .generate_upload_url(ALICE, item.todo_id)
            .await
            .unwrap();

        assert!(upload.upload_url.contains(&upload.attachment_id.to_string()));
        assert_eq!(upload.upload_method, "PUT");
        assert!(upload.upload_headers.is_empty());
        assert!(upload.expires_at > Utc::now());
        let stored = &service.list_todos(ALICE).await.unwrap()[0];
        assert_eq!(
            stored.attachment_url.as_deref(),
            Some(format!("https://blobs.test/{}", upload.attachment_id).as_str())
        );
    }

    #[tokio::test]
    async fn test_generate_upload_url_for_missing_todo() {
        let service = service_with(Arc::new(CountingRepository::default()));
        let result = service.generate_upload_url(ALICE, TodoId::new()).await;
        assert!(matches!(result, Err(TodoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_upload_url_storage_failure() {
        let service = TodoService::new(
            Arc::new(CountingRepository::default()),
            Arc::new(BrokenStorage),
        );

        let result = service.create_upload_url(AttachmentId::new()).await;

        assert!(matches!(
            result,
            Err(TodoError::Storage(StorageError::PresignNotSupported))
        ));
    }
}
