//! Material database operations

use speclib_common::db::models::Material;
use speclib_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

/// Load a material by its (library_name, material_name) identity
pub async fn find_by_identity(
    conn: &mut SqliteConnection,
    library_name: &str,
    material_name: &str,
) -> Result<Option<Material>> {
    let material = sqlx::query_as::<_, Material>(
        r#"
        SELECT id, library_name, material_name, category, location, comments
        FROM materials
        WHERE library_name = ? AND material_name = ?
        "#,
    )
    .bind(library_name)
    .bind(material_name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(material)
}

/// Insert a new material, returning its id
pub async fn insert(
    conn: &mut SqliteConnection,
    library_name: &str,
    material_name: &str,
    category: &str,
    location: Option<&str>,
    comments: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO materials (library_name, material_name, category, location, comments)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(library_name)
    .bind(material_name)
    .bind(category)
    .bind(location)
    .bind(comments)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Refresh a material from a newly imported record: category is always
/// overwritten, location/comments only when the new value is non-empty
pub async fn update_import_fields(
    conn: &mut SqliteConnection,
    id: i64,
    category: &str,
    location: Option<&str>,
    comments: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE materials
        SET category = ?,
            location = COALESCE(?, location),
            comments = COALESCE(?, comments),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(category)
    .bind(location)
    .bind(comments)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Load all materials ordered by (library_name, material_name)
pub async fn load_all(pool: &SqlitePool) -> Result<Vec<Material>> {
    let materials = sqlx::query_as::<_, Material>(
        r#"
        SELECT id, library_name, material_name, category, location, comments
        FROM materials
        ORDER BY library_name, material_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(materials)
}

/// Count materials
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speclib_common::db::init;

    async fn setup() -> (tempfile::TempDir, SqlitePool) {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = init::init_database(&temp_dir.path().join("catalog.db"))
            .await
            .unwrap();
        (temp_dir, pool)
    }

    #[tokio::test]
    async fn insert_and_find_by_identity() {
        let (_dir, pool) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let id = insert(
            &mut conn,
            "Global Reference",
            "Basalt-01",
            "Igneous",
            Some("Iceland"),
            None,
        )
        .await
        .unwrap();

        let material = find_by_identity(&mut conn, "Global Reference", "Basalt-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(material.id, id);
        assert_eq!(material.category, "Igneous");
        assert_eq!(material.location.as_deref(), Some("Iceland"));

        let missing = find_by_identity(&mut conn, "Global Reference", "Sandstone-01")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn update_keeps_location_when_new_value_missing() {
        let (_dir, pool) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        let id = insert(
            &mut conn,
            "Global Reference",
            "Basalt-01",
            "Igneous",
            Some("Iceland"),
            Some("first import"),
        )
        .await
        .unwrap();

        update_import_fields(&mut conn, id, "Volcanic", None, None)
            .await
            .unwrap();

        let material = find_by_identity(&mut conn, "Global Reference", "Basalt-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(material.category, "Volcanic");
        assert_eq!(material.location.as_deref(), Some("Iceland"));
        assert_eq!(material.comments.as_deref(), Some("first import"));
    }

    #[tokio::test]
    async fn identity_is_unique() {
        let (_dir, pool) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        insert(&mut conn, "Global Reference", "Basalt-01", "Igneous", None, None)
            .await
            .unwrap();
        let duplicate =
            insert(&mut conn, "Global Reference", "Basalt-01", "Igneous", None, None).await;

        assert!(duplicate.is_err());
    }
}
