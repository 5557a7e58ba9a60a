use anyhow::{Context, Result};
use diesel::prelude::*;
use uuid::Uuid;

use crate::auth::password;
use crate::config::AppConfig;
use crate::db::PgPool;
use crate::models::NewAdmin;
use crate::schema::admins;

/// Creates the bootstrap admin named by ADMIN_EMAIL when it does not exist
/// yet. A pre-computed ADMIN_PASSWORD_HASH takes precedence over hashing
/// ADMIN_PASSWORD. No-op when the seed variables are absent.
pub fn ensure_env_admin(pool: &PgPool, config: &AppConfig) -> Result<()> {
    let Some(email) = config.seed_admin_email.as_deref() else {
        return Ok(());
    };

    let mut conn = pool.get().context("failed to get seed connection")?;

    let existing = admins::table
        .filter(admins::email.eq(email))
        .select(admins::id)
        .first::<Uuid>(&mut conn)
        .optional()?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = match (
        config.seed_admin_password_hash.as_deref(),
        config.seed_admin_password.as_deref(),
    ) {
        (Some(hash), _) => hash.to_string(),
        (None, Some(password)) => password::hash_password(password)?,
        (None, None) => return Ok(()),
    };

    let admin = NewAdmin {
        id: Uuid::new_v4(),
        name: Some("Environment Admin".to_string()),
        email: email.to_string(),
        password_hash,
        role: "super".to_string(),
    };

    diesel::insert_into(admins::table)
        .values(&admin)
        .execute(&mut conn)?;

    tracing::info!(email, "seeded environment admin");
    Ok(())
}
