//! Metadata attachment.
//!
//! A submitted blob such as `"color:blue, size:large"` is split on commas,
//! tokens without a `:` are dropped silently, and each remaining token is cut
//! on its first `:` into a trimmed `(key, value)` pair. Pairs are fetched or
//! created as shared `metadata` rows and linked to the owning entity. Linking
//! an already linked pair is a no-op. Unlinked rows are never deleted.

use crate::models::metadata::{Metadata, MetadataOwner, MetadataPair};
use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, SqliteConnection, sqlite::Sqlite};
use std::collections::HashMap;
use uuid::Uuid;

pub fn parse_pairs(raw: &str) -> Vec<MetadataPair> {
    raw.split(',')
        .map(str::trim)
        .filter_map(|token| token.split_once(':'))
        .map(|(key, value)| MetadataPair {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        })
        .collect()
}

/// Fetch the row holding exactly `(key, value)` or insert it.
///
/// Reusing an existing row leaves both of its timestamps untouched.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    key: &str,
    value: &str,
) -> sqlx::Result<Metadata> {
    let now = Utc::now();
    sqlx::query_as::<_, Metadata>(
        r#"
        INSERT INTO metadata (id, key, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(key, value) DO UPDATE SET key = excluded.key
        RETURNING id, key, value, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(key)
    .bind(value)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Link every pair parsed from `raw` to the owner, keeping existing links.
pub async fn attach(
    conn: &mut SqliteConnection,
    owner: MetadataOwner,
    owner_id: Uuid,
    raw: &str,
) -> sqlx::Result<Vec<Metadata>> {
    let link_sql = format!(
        "INSERT OR IGNORE INTO {} ({}, metadata_id) VALUES (?, ?)",
        owner.link_table(),
        owner.owner_column()
    );

    let mut attached: Vec<Metadata> = Vec::new();
    for MetadataPair { key, value } in parse_pairs(raw) {
        let meta = get_or_create(&mut *conn, &key, &value).await?;
        sqlx::query(&link_sql)
            .bind(owner_id)
            .bind(meta.id)
            .execute(&mut *conn)
            .await?;
        if !attached.iter().any(|m| m.id == meta.id) {
            attached.push(meta);
        }
    }

    attached.sort_by(|a, b| (&a.key, &a.value).cmp(&(&b.key, &b.value)));
    Ok(attached)
}

/// Drop every link of the owner, then attach `raw` from scratch.
pub async fn replace(
    conn: &mut SqliteConnection,
    owner: MetadataOwner,
    owner_id: Uuid,
    raw: &str,
) -> sqlx::Result<Vec<Metadata>> {
    let clear_sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        owner.link_table(),
        owner.owner_column()
    );
    sqlx::query(&clear_sql)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    attach(conn, owner, owner_id, raw).await
}

#[derive(FromRow)]
struct LinkedMetadata {
    owner_id: Uuid,
    #[sqlx(flatten)]
    metadata: Metadata,
}

/// Load the metadata of many owners in one query, keyed by owner id.
pub async fn load_for(
    conn: &mut SqliteConnection,
    owner: MetadataOwner,
    owner_ids: &[Uuid],
) -> sqlx::Result<HashMap<Uuid, Vec<Metadata>>> {
    let mut by_owner: HashMap<Uuid, Vec<Metadata>> = HashMap::new();
    if owner_ids.is_empty() {
        return Ok(by_owner);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT l.{col} AS owner_id, m.id, m.key, m.value, m.created_at, m.updated_at \
         FROM {table} l JOIN metadata m ON m.id = l.metadata_id \
         WHERE l.{col} IN (",
        col = owner.owner_column(),
        table = owner.link_table(),
    ));
    let mut ids = builder.separated(", ");
    for id in owner_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY m.key, m.value");

    let rows: Vec<LinkedMetadata> = builder.build_query_as().fetch_all(&mut *conn).await?;
    for row in rows {
        by_owner.entry(row.owner_id).or_default().push(row.metadata);
    }
    Ok(by_owner)
}

/// Metadata of a single owner.
pub async fn load_one(
    conn: &mut SqliteConnection,
    owner: MetadataOwner,
    owner_id: Uuid,
) -> sqlx::Result<Vec<Metadata>> {
    let mut by_owner = load_for(conn, owner, &[owner_id]).await?;
    Ok(by_owner.remove(&owner_id).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> MetadataPair {
        MetadataPair {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn parses_trimmed_pairs() {
        assert_eq!(
            parse_pairs("color:blue, size:large"),
            vec![pair("color", "blue"), pair("size", "large")]
        );
    }

    #[test]
    fn drops_tokens_without_separator() {
        assert_eq!(
            parse_pairs("malformed, color:blue"),
            vec![pair("color", "blue")]
        );
        assert!(parse_pairs("").is_empty());
        assert!(parse_pairs(" , ,").is_empty());
    }

    #[test]
    fn splits_on_first_colon_only() {
        assert_eq!(
            parse_pairs("url : http://example.com:8080 "),
            vec![pair("url", "http://example.com:8080")]
        );
    }

    #[test]
    fn keeps_empty_sides() {
        assert_eq!(parse_pairs(":x, y:"), vec![pair("", "x"), pair("y", "")]);
    }

    #[tokio::test]
    async fn get_or_create_reuses_rows() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let first = get_or_create(&mut conn, "color", "blue").await.unwrap();
        let again = get_or_create(&mut conn, "color", "blue").await.unwrap();
        let other = get_or_create(&mut conn, "color", "Blue").await.unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(first.created_at, again.created_at);
        assert_ne!(first.id, other.id);
    }
}
