use crate::storage::ImageStorage;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::{path::Path, sync::Arc};
use tempfile::TempDir;

/// A migrated SQLite file and an image directory inside one scratch directory.
pub(crate) struct TestContext {
    pub(crate) db: Arc<DatabaseConnection>,
    pub(crate) images: ImageStorage,
    _root: TempDir,
}

impl TestContext {
    pub(crate) async fn new() -> Self {
        let root = tempfile::tempdir().expect("scratch directory");
        let database_url = format!(
            "sqlite://{}?mode=rwc",
            root.path().join("fishmarket-test.db").display()
        );

        let db = Database::connect(&database_url)
            .await
            .expect("sqlite connection");
        Migrator::up(&db, None).await.expect("migrations");

        Self {
            db: Arc::new(db),
            images: ImageStorage::new(root.path().join("images")),
            _root: root,
        }
    }
}

pub(crate) fn count_files(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(Result::ok).count(),
        Err(_) => 0,
    }
}
