//! Schema migrations embedded in the binary.
//!
//! Each migration runs inside its own transaction and is recorded in
//! `_migrations`, so re-running `migrate` only applies what is missing.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::DbError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_accounts",
        sql: r"
            CREATE TABLE organizations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                is_superuser INTEGER NOT NULL DEFAULT 0,
                is_staff INTEGER NOT NULL DEFAULT 0,
                organization_id INTEGER REFERENCES organizations(id) ON DELETE CASCADE,
                date_joined TEXT NOT NULL
            );
            CREATE TABLE organization_email_domains (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                domain TEXT NOT NULL UNIQUE,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX idx_users_organization_id ON users(organization_id);
        ",
    },
    Migration {
        version: 2,
        name: "create_staticsites",
        sql: r"
            CREATE TABLE static_sites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                staging_bucket TEXT NOT NULL,
                production_bucket TEXT NOT NULL,
                last_staging_sync_at TEXT,
                last_production_sync_at TEXT,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (organization_id, name)
            );
            CREATE TABLE pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL REFERENCES static_sites(id) ON DELETE CASCADE,
                page_type TEXT NOT NULL CHECK (page_type IN ('index', 'news')),
                filename TEXT NOT NULL,
                relative_path TEXT NOT NULL,
                template TEXT NOT NULL,
                newsitems_variable TEXT,
                index_page_id INTEGER REFERENCES pages(id) ON DELETE CASCADE,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (site_id, page_type)
            );
            CREATE TABLE page_assets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
                file_type TEXT NOT NULL CHECK (file_type IN ('css', 'js', 'img', 'pdf')),
                filename TEXT NOT NULL,
                relative_path TEXT NOT NULL,
                content_key TEXT NOT NULL,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (page_id, relative_path, filename)
            );
            CREATE INDEX idx_page_assets_page_id ON page_assets(page_id);
        ",
    },
    Migration {
        version: 3,
        name: "create_news",
        sql: r"
            CREATE TABLE news_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                news_page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
                title TEXT NOT NULL DEFAULT '',
                text TEXT NOT NULL,
                publish_on TEXT NOT NULL,
                is_published INTEGER NOT NULL DEFAULT 0,
                image_filename TEXT,
                image_key TEXT,
                image_relpath TEXT NOT NULL,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                updated_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX idx_news_items_page_published
                ON news_items(news_page_id, is_published, publish_on);
        ",
    },
];

/// Apply every migration that has not run yet. Returns how many ran.
pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<usize, DbError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    let applied: Vec<i64> = sqlx::query("SELECT version FROM _migrations")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.try_get::<i64, _>("version"))
        .collect::<Result<_, _>>()?;

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        apply(pool, migration)
            .await
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        count += 1;
    }

    if count > 0 {
        tracing::info!(count, "Applied migrations");
    } else {
        tracing::debug!("No pending migrations");
    }
    Ok(count)
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
    sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
