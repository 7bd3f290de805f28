//! Library browser query service integration tests

use chrono::NaiveDate;
use speclib_ingest::db::{materials, spectra};
use speclib_ingest::db::spectra::NewSpectrum;
use speclib_ingest::LibraryBrowserService;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = speclib_common::db::init_database(&temp_dir.path().join("catalog.db"))
        .await
        .unwrap();
    (temp_dir, pool)
}

async fn insert_spectrum(
    pool: &SqlitePool,
    material_id: i64,
    source: &str,
    acquisition_date: Option<NaiveDate>,
) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    spectra::insert(
        &mut conn,
        &NewSpectrum {
            material_id,
            source_file_id: None,
            source,
            wavelength_unit: "nm",
            reflectance_unit: "fraction",
            acquisition_date,
            quality_status: "complete",
            plugin_id: None,
            comments: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn groups_materials_by_library_sorted() {
    let (_dir, pool) = setup().await;
    let mut conn = pool.acquire().await.unwrap();
    materials::insert(&mut conn, "Zeta Library", "Quartz-01", "Mineral", None, None)
        .await
        .unwrap();
    materials::insert(&mut conn, "Alpha Library", "Basalt-01", "Igneous", None, None)
        .await
        .unwrap();
    materials::insert(&mut conn, "Alpha Library", "Andesite-01", "Igneous", None, None)
        .await
        .unwrap();
    drop(conn);

    let tree = LibraryBrowserService::new(pool).fetch_library_tree().await;

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].name, "Alpha Library");
    assert_eq!(tree[1].name, "Zeta Library");
    // Materials in (library_name, material_name) query order
    let names: Vec<&str> = tree[0]
        .materials
        .iter()
        .map(|material| material.name.as_str())
        .collect();
    assert_eq!(names, vec!["Andesite-01", "Basalt-01"]);
}

#[tokio::test]
async fn dated_spectra_sort_before_undated_and_chronologically() {
    let (_dir, pool) = setup().await;
    let mut conn = pool.acquire().await.unwrap();
    let material_id = materials::insert(&mut conn, "Global Reference", "Basalt-01", "Igneous", None, None)
        .await
        .unwrap();
    drop(conn);

    let undated = insert_spectrum(&pool, material_id, "ASD", None).await;
    let later = insert_spectrum(
        &pool,
        material_id,
        "ASD",
        NaiveDate::from_ymd_opt(2024, 4, 2),
    )
    .await;
    let earlier = insert_spectrum(
        &pool,
        material_id,
        "ASD",
        NaiveDate::from_ymd_opt(2024, 3, 14),
    )
    .await;

    let tree = LibraryBrowserService::new(pool).fetch_library_tree().await;
    let nodes = &tree[0].materials[0].spectra;

    let ids: Vec<i64> = nodes.iter().map(|node| node.id).collect();
    assert_eq!(ids, vec![earlier, later, undated]);
}

#[tokio::test]
async fn labels_use_date_or_id() {
    let (_dir, pool) = setup().await;
    let mut conn = pool.acquire().await.unwrap();
    let material_id = materials::insert(&mut conn, "Global Reference", "Basalt-01", "Igneous", None, None)
        .await
        .unwrap();
    drop(conn);

    let dated = insert_spectrum(
        &pool,
        material_id,
        "ASD FieldSpec 4",
        NaiveDate::from_ymd_opt(2024, 3, 14),
    )
    .await;
    let undated = insert_spectrum(&pool, material_id, "ASD TerraSpec", None).await;

    let tree = LibraryBrowserService::new(pool).fetch_library_tree().await;
    let nodes = &tree[0].materials[0].spectra;

    let dated_node = nodes.iter().find(|node| node.id == dated).unwrap();
    assert_eq!(dated_node.label, "ASD FieldSpec 4 · 2024-03-14");
    let undated_node = nodes.iter().find(|node| node.id == undated).unwrap();
    assert_eq!(undated_node.label, format!("ASD TerraSpec · #{undated}"));
}

#[tokio::test]
async fn material_without_spectra_appears_empty() {
    let (_dir, pool) = setup().await;
    let mut conn = pool.acquire().await.unwrap();
    materials::insert(&mut conn, "Field Campaign 2024", "Ice Core A", "Cryogenic", None, None)
        .await
        .unwrap();
    drop(conn);

    let tree = LibraryBrowserService::new(pool).fetch_library_tree().await;

    assert_eq!(tree[0].materials[0].name, "Ice Core A");
    assert!(tree[0].materials[0].spectra.is_empty());
}

#[tokio::test]
async fn storage_failure_degrades_to_empty_tree() {
    // A database without the schema applied: every query fails, the browser
    // must still return an empty hierarchy
    let temp_dir = TempDir::new().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(temp_dir.path().join("bare.db"))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    let tree = LibraryBrowserService::new(pool).fetch_library_tree().await;

    assert!(tree.is_empty());
}
