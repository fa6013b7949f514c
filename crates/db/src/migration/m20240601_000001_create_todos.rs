//! Creates the todos table.
//!
//! Items are keyed by owner and todo id; todo ids are also unique on their own.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(TODOS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS todos CASCADE;")
            .await?;
        Ok(())
    }
}

const TODOS_SQL: &str = r"
CREATE TABLE todos (
    user_id TEXT NOT NULL,
    todo_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    name TEXT NOT NULL,
    due_date TEXT NOT NULL,
    done BOOLEAN NOT NULL DEFAULT false,
    attachment_url TEXT,
    PRIMARY KEY (user_id, todo_id),
    CONSTRAINT chk_todos_name_not_blank CHECK (btrim(name) <> ''),
    CONSTRAINT chk_todos_due_date_not_blank CHECK (btrim(due_date) <> '')
);

-- Lookup by id alone, to tell a foreign todo from a missing one
CREATE UNIQUE INDEX idx_todos_todo_id ON todos(todo_id);

-- Listing a user's todos in creation order
CREATE INDEX idx_todos_user_created ON todos(user_id, created_at);
";
