use clap::Args;
use serde_json::json;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::auth::permissions;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::{CreateRole, CreateUser, Role, User};
use crate::database::Repository;

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[arg(long, help = "Administrator username")]
    pub username: String,

    #[arg(long, env = "PORTAL_ADMIN_PASSWORD", hide_env_values = true, help = "Administrator password")]
    pub password: String,

    #[arg(long, default_value = "Administrator", help = "Name of the role holding every permission")]
    pub role: String,
}

/// Idempotent: the role is created or granted the full catalog; the user is
/// only created when the username is free.
pub async fn handle(args: SeedArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    validate_password_strength(&args.password)?;
    let database = super::connect().await?;
    let pool = database.pool().clone();
    let roles = Repository::<Role>::new(Role::TABLE, "Role", pool.clone());
    let users = Repository::<User>::new(User::TABLE, "User", pool.clone());

    let mut tx = pool.begin().await?;

    let existing: Option<Role> = sqlx::query_as(
        "SELECT * FROM roles WHERE lower(name) = lower($1) AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(&args.role)
    .fetch_optional(&mut *tx)
    .await?;

    let role = match existing {
        Some(role) => {
            sqlx::query_as::<_, Role>("UPDATE roles SET permissions = $2, updated_at = now() WHERE id = $1 RETURNING *")
                .bind(role.id)
                .bind(permissions::all())
                .fetch_one(&mut *tx)
                .await?
        }
        None => {
            let (changes, _) = CreateRole {
                name: args.role.clone(),
                description: Some("Full access".to_string()),
                permissions: permissions::all(),
            }
            .into_changeset()?;
            roles.insert_with(&mut *tx, &changes).await?
        }
    };

    let taken: Option<(uuid::Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE lower(username) = lower($1) AND deleted_at IS NULL")
            .bind(&args.username)
            .fetch_optional(&mut *tx)
            .await?;

    let created = match taken {
        Some(_) => false,
        None => {
            let changes = CreateUser {
                username: args.username.clone(),
                password: String::new(),
                employee_id: None,
                role_id: role.id,
                is_active: Some(true),
            }
            .into_changeset(hash_password(&args.password)?)?;
            users.insert_with(&mut *tx, &changes).await?;
            true
        }
    };

    tx.commit().await?;
    database.close().await;

    let message = if created {
        format!("Created user '{}' with role '{}'", args.username, role.name)
    } else {
        format!("User '{}' already exists; role '{}' refreshed", args.username, role.name)
    };
    output_success(
        output_format,
        &message,
        Some(json!({ "role_id": role.id, "username": args.username, "user_created": created })),
    )
}
