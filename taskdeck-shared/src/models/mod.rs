/// Database models for Taskdeck
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `workspace`: Tenants; the unit of sharing
/// - `workspace_member`: User-workspace links with a recorded role
/// - `project`: Projects inside a workspace
/// - `task`: Tasks inside a project
/// - `attachment`: Files attached to tasks (bytes live in object storage)
///
/// Every query function is generic over `sqlx::PgExecutor`, so it runs
/// equally against the pool or inside a transaction (`&mut *tx`).
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{User, CreateUser};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: Some("Ada".to_string()),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod attachment;
pub mod project;
pub mod task;
pub mod user;
pub mod workspace;
pub mod workspace_member;
