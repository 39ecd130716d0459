#[cfg(test)]
pub mod test_helpers {
    use crate::db::models::{Task, User};
    use crate::db::{create_pool, run_migrations};
    use crate::error::{AppError, Result};
    use crate::gateway::{
        DeleteTask, InsertTask, SelectTask, SelectTasks, SqliteTaskGateway, TaskGateway,
        ToggleTask, UpdateTask,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    pub const TEST_STORE_KEY: &str = "test-store-key-0123456789";

    pub struct TestContext {
        pub pool: SqlitePool,
        pub _temp_dir: TempDir,
    }

    impl TestContext {
        pub async fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let db_path = temp_dir.path().join("taskdeck.db");

            let pool = create_pool(&db_path).await.unwrap();
            run_migrations(&pool).await.unwrap();

            Self {
                pool,
                _temp_dir: temp_dir,
            }
        }

        pub fn pool(&self) -> &SqlitePool {
            &self.pool
        }

        /// Insert an account directly, bypassing password hashing.
        pub async fn create_user(&self, email: &str) -> User {
            let user = User {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.to_string(),
                created_at: Utc::now(),
            };

            sqlx::query(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, 'unused', ?)",
            )
            .bind(&user.id)
            .bind(&user.email)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .unwrap();

            user
        }

        pub async fn task_count(&self) -> i64 {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
                .fetch_one(&self.pool)
                .await
                .unwrap();
            count
        }
    }

    /// Which gateway operations a [`FaultyGateway`] should fail.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Faults {
        pub insert: bool,
        pub select: bool,
        pub toggle: bool,
        pub update: bool,
        pub delete: bool,
    }

    /// Wraps the SQLite gateway and fails selected operations without touching the store.
    pub struct FaultyGateway {
        inner: SqliteTaskGateway,
        faults: Faults,
    }

    impl FaultyGateway {
        pub fn new(pool: SqlitePool, faults: Faults) -> Self {
            Self {
                inner: SqliteTaskGateway::new(pool),
                faults,
            }
        }

        fn fail<T>(op: &str) -> Result<T> {
            Err(AppError::Database(sqlx::Error::Protocol(format!(
                "injected {} failure",
                op
            ))))
        }
    }

    #[async_trait]
    impl TaskGateway for FaultyGateway {
        async fn insert(&self, request: InsertTask) -> Result<Task> {
            if self.faults.insert {
                return Self::fail("insert");
            }
            self.inner.insert(request).await
        }

        async fn select(&self, request: SelectTasks) -> Result<Vec<Task>> {
            if self.faults.select {
                return Self::fail("select");
            }
            self.inner.select(request).await
        }

        async fn select_one(&self, request: SelectTask) -> Result<Option<Task>> {
            if self.faults.select {
                return Self::fail("select");
            }
            self.inner.select_one(request).await
        }

        async fn toggle(&self, request: ToggleTask) -> Result<Option<Task>> {
            if self.faults.toggle {
                return Self::fail("toggle");
            }
            self.inner.toggle(request).await
        }

        async fn update(&self, request: UpdateTask) -> Result<Option<Task>> {
            if self.faults.update {
                return Self::fail("update");
            }
            self.inner.update(request).await
        }

        async fn delete(&self, request: DeleteTask) -> Result<u64> {
            if self.faults.delete {
                return Self::fail("delete");
            }
            self.inner.delete(request).await
        }
    }
}
