use crate::persistence::{FishActiveModel, FishModel, join_file_names};
use crate::repository::fish_repository::FishRepository;
use crate::service::error::{ServiceError, map_db_error};
use crate::storage::ImageStorage;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, DatabaseConnection, Order};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) const MIN_IMAGES: usize = 1;
pub(crate) const MAX_IMAGES: usize = 3;
const FALLBACK_IMAGE_NAME: &str = "image";

pub(crate) struct ImageUpload {
    pub(crate) original_filename: String,
    pub(crate) bytes: Vec<u8>,
}

pub(crate) struct CreateFishRequest {
    pub(crate) name: String,
    pub(crate) price: f64,
    pub(crate) images: Vec<ImageUpload>,
}

fn validate_create_request(request: &CreateFishRequest) -> Result<String, ServiceError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation(
            "field `name` must be a non-empty string",
        ));
    }

    if !request.price.is_finite() || request.price < 0.0 {
        return Err(ServiceError::validation(
            "field `price` must be a non-negative number",
        ));
    }

    let count = request.images.len();
    if !(MIN_IMAGES..=MAX_IMAGES).contains(&count) {
        return Err(ServiceError::validation(format!(
            "an entry needs between {MIN_IMAGES} and {MAX_IMAGES} images, got {count}"
        )));
    }

    if let Some(position) = request.images.iter().position(|image| image.bytes.is_empty()) {
        return Err(ServiceError::validation(format!(
            "image #{} is empty",
            position + 1
        )));
    }

    Ok(name.to_string())
}

/// Keeps only the last path component and strips the list separator so the
/// joined `image_file_names` column splits back into the same names.
fn sanitize_original_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|ch| if ch == ',' || ch.is_control() { '_' } else { ch })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_IMAGE_NAME.to_string()
    } else {
        cleaned
    }
}

fn storage_file_name(timestamp_millis: i64, index: usize, original_filename: &str) -> String {
    format!(
        "{timestamp_millis}_{index}_{}",
        sanitize_original_name(original_filename)
    )
}

#[derive(Clone)]
pub(crate) struct FishService {
    db: Arc<DatabaseConnection>,
    images: ImageStorage,
}

impl FishService {
    pub(crate) fn new(db: Arc<DatabaseConnection>, images: ImageStorage) -> Self {
        Self { db, images }
    }

    pub(crate) async fn list(&self) -> Result<Vec<FishModel>, ServiceError> {
        FishRepository::list_records(self.db.as_ref(), Order::Desc)
            .await
            .map_err(map_db_error)
    }

    pub(crate) async fn create(&self, request: CreateFishRequest) -> Result<FishModel, ServiceError> {
        self.create_caught_at(request, Utc::now()).await
    }

    /// `stored` only ever holds files this call created, so a failed create
    /// cannot remove an image that belongs to another entry.
    async fn create_caught_at(
        &self,
        request: CreateFishRequest,
        catch_date: DateTime<Utc>,
    ) -> Result<FishModel, ServiceError> {
        let name = validate_create_request(&request)?;

        let timestamp_millis = catch_date.timestamp_millis();
        let mut stored = Vec::with_capacity(request.images.len());

        for (index, image) in request.images.iter().enumerate() {
            let file_name = storage_file_name(timestamp_millis, index, &image.original_filename);

            if let Err(error) = self.images.write(&file_name, &image.bytes).await {
                self.discard_images(&stored).await;
                return Err(ServiceError::storage(
                    format!("failed to store image {file_name}"),
                    error,
                ));
            }

            stored.push(file_name);
        }

        let active_model = FishActiveModel {
            name: Set(name),
            price: Set(request.price),
            catch_date: Set(catch_date.into()),
            image_file_names: Set(join_file_names(&stored)),
            ..Default::default()
        };

        match FishRepository::insert(self.db.as_ref(), active_model).await {
            Ok(model) => {
                info!(
                    fish_id = model.id,
                    image_count = stored.len(),
                    "Fish entry created"
                );
                Ok(model)
            }
            Err(error) => {
                self.discard_images(&stored).await;
                Err(map_db_error(error))
            }
        }
    }

    /// Removes the image files first; the row is only deleted once every
    /// file is gone, so a failed cleanup never leaves a half-deleted entry.
    pub(crate) async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let existing = FishRepository::find_model_by_id(self.db.as_ref(), id)
            .await
            .map_err(map_db_error)?;
        let Some(existing) = existing else {
            return Err(ServiceError::not_found(id));
        };

        for file_name in existing.image_file_names_list() {
            let removed = self
                .images
                .delete_if_exists(&file_name)
                .await
                .map_err(|error| {
                    ServiceError::storage(format!("failed to delete image {file_name}"), error)
                })?;
            if !removed {
                warn!(fish_id = id, file_name = %file_name, "Image was already missing");
            }
        }

        let rows_affected = FishRepository::delete_by_id(self.db.as_ref(), id)
            .await
            .map_err(map_db_error)?;
        if rows_affected == 0 {
            return Err(ServiceError::not_found(id));
        }

        info!(fish_id = id, "Fish entry deleted");
        Ok(())
    }

    async fn discard_images(&self, file_names: &[String]) {
        for file_name in file_names {
            if let Err(error) = self.images.delete_if_exists(file_name).await {
                warn!(
                    file_name = %file_name,
                    error = %error,
                    "Failed to remove image of aborted create, file is orphaned"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::error::ServiceErrorKind;
    use crate::test_support::{TestContext, count_files};
    use sea_orm::ConnectionTrait;

    fn upload(name: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            original_filename: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn request(name: &str, price: f64, images: Vec<ImageUpload>) -> CreateFishRequest {
        CreateFishRequest {
            name: name.to_string(),
            price,
            images,
        }
    }

    fn service(context: &TestContext) -> FishService {
        FishService::new(context.db.clone(), context.images.clone())
    }

    #[tokio::test]
    async fn creates_salmon_with_one_image() {
        let context = TestContext::new().await;
        let service = service(&context);

        let created = service
            .create(request("Salmon", 25.99, vec![upload("salmon.jpg", b"jpeg")]))
            .await
            .expect("valid entry should be created");

        assert_eq!(created.name, "Salmon");
        assert_eq!(created.price, 25.99);
        assert_eq!(created.image_file_names_list().len(), 1);
        assert_eq!(count_files(context.images.base_dir()), 1);

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn file_names_share_timestamp_and_carry_index() {
        let context = TestContext::new().await;
        let service = service(&context);

        for count in MIN_IMAGES..=MAX_IMAGES {
            let images = (0..count)
                .map(|position| upload(&format!("photo{position}.png"), b"png"))
                .collect();
            let before = Utc::now().timestamp_millis();
            let created = service
                .create(request("Carp", 10.0, images))
                .await
                .unwrap();
            let after = Utc::now().timestamp_millis();

            let names = created.image_file_names_list();
            assert_eq!(names.len(), count);

            let timestamp = names[0].split('_').next().unwrap().to_string();
            let millis: i64 = timestamp.parse().unwrap();
            assert!((before..=after).contains(&millis));

            for (index, file_name) in names.iter().enumerate() {
                assert_eq!(file_name, &format!("{timestamp}_{index}_photo{index}.png"));
                assert!(context.images.exists(file_name).await.unwrap());
            }
        }
    }

    #[tokio::test]
    async fn rejects_image_count_outside_range_without_writes() {
        let context = TestContext::new().await;
        let service = service(&context);

        let error = service
            .create(request("Pike", 5.0, vec![]))
            .await
            .expect_err("zero images must be rejected");
        assert_eq!(error.kind(), ServiceErrorKind::Validation);

        let four = (0..4).map(|i| upload(&format!("{i}.jpg"), b"x")).collect();
        let error = service
            .create(request("Pike", 5.0, four))
            .await
            .expect_err("four images must be rejected");
        assert_eq!(error.kind(), ServiceErrorKind::Validation);

        assert_eq!(count_files(context.images.base_dir()), 0);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_payload_without_writes() {
        let context = TestContext::new().await;
        let service = service(&context);

        let error = service
            .create(request(
                "Trout",
                12.5,
                vec![upload("a.jpg", b"bytes"), upload("b.jpg", b"")],
            ))
            .await
            .expect_err("empty payload must be rejected");

        assert_eq!(error.kind(), ServiceErrorKind::Validation);
        assert_eq!(count_files(context.images.base_dir()), 0);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_missing_name_and_negative_price() {
        let context = TestContext::new().await;
        let service = service(&context);

        let error = service
            .create(request("   ", 1.0, vec![upload("a.jpg", b"x")]))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ServiceErrorKind::Validation);

        let error = service
            .create(request("Eel", -0.01, vec![upload("a.jpg", b"x")]))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ServiceErrorKind::Validation);

        let error = service
            .create(request("Eel", f64::NAN, vec![upload("a.jpg", b"x")]))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ServiceErrorKind::Validation);

        assert_eq!(count_files(context.images.base_dir()), 0);
    }

    #[tokio::test]
    async fn failed_write_removes_images_of_the_same_request() {
        let context = TestContext::new().await;
        let service = service(&context);
        let too_long = format!("{}.jpg", "x".repeat(300));

        let error = service
            .create(request(
                "Perch",
                3.0,
                vec![upload("ok.jpg", b"first"), upload(&too_long, b"second")],
            ))
            .await
            .expect_err("unwritable file name must fail");

        assert_eq!(error.kind(), ServiceErrorKind::Storage);
        assert_eq!(count_files(context.images.base_dir()), 0);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn name_collision_leaves_existing_entry_images_alone() {
        let context = TestContext::new().await;
        let service = service(&context);
        let caught = Utc::now();

        let first = service
            .create_caught_at(request("Salmon", 25.99, vec![upload("x.jpg", b"first")]), caught)
            .await
            .unwrap();
        let kept = first.image_file_names_list()[0].clone();

        let error = service
            .create_caught_at(request("Salmon", 19.0, vec![upload("x.jpg", b"second")]), caught)
            .await
            .expect_err("colliding file name must not be overwritten");
        assert_eq!(error.kind(), ServiceErrorKind::Storage);

        let error = service
            .create_caught_at(
                request(
                    "Trout",
                    11.0,
                    vec![upload("other.jpg", b"other"), upload("x.jpg", b"third")],
                ),
                caught,
            )
            .await
            .expect_err("second image collides with the first entry");
        assert_eq!(error.kind(), ServiceErrorKind::Storage);

        assert_eq!(
            std::fs::read(context.images.path_for(&kept)).unwrap(),
            b"first"
        );
        assert_eq!(count_files(context.images.base_dir()), 1);
        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, first.id);
    }

    #[tokio::test]
    async fn failed_insert_removes_written_images() {
        let context = TestContext::new().await;
        let service = service(&context);
        context
            .db
            .execute_unprepared("DROP TABLE fish")
            .await
            .unwrap();

        let error = service
            .create(request(
                "Mackerel",
                6.5,
                vec![upload("a.jpg", b"a"), upload("b.jpg", b"b")],
            ))
            .await
            .expect_err("insert into a missing table must fail");

        assert_eq!(error.kind(), ServiceErrorKind::Database);
        assert_eq!(count_files(context.images.base_dir()), 0);
    }

    #[tokio::test]
    async fn unusable_image_directory_is_a_storage_error() {
        let context = TestContext::new().await;
        std::fs::write(context.images.base_dir(), b"not a directory").unwrap();
        let service = service(&context);

        let error = service
            .create(request("Cod", 8.0, vec![upload("cod.jpg", b"x")]))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ServiceErrorKind::Storage);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let context = TestContext::new().await;
        let service = service(&context);

        for name in ["Bream", "Roach", "Tench"] {
            service
                .create(request(name, 1.0, vec![upload("f.jpg", b"x")]))
                .await
                .unwrap();
        }

        let ids: Vec<i32> = service.list().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn delete_removes_images_and_row() {
        let context = TestContext::new().await;
        let service = service(&context);
        let created = service
            .create(request(
                "Sturgeon",
                99.0,
                vec![upload("a.jpg", b"a"), upload("b.jpg", b"b")],
            ))
            .await
            .unwrap();

        service.delete(created.id).await.expect("delete should succeed");

        assert_eq!(count_files(context.images.base_dir()), 0);
        let found = FishRepository::find_model_by_id(context.db.as_ref(), created.id)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn delete_tolerates_already_removed_images() {
        let context = TestContext::new().await;
        let service = service(&context);
        let created = service
            .create(request(
                "Catfish",
                14.0,
                vec![upload("a.jpg", b"a"), upload("b.jpg", b"b")],
            ))
            .await
            .unwrap();
        let first = &created.image_file_names_list()[0];
        std::fs::remove_file(context.images.path_for(first)).unwrap();

        service.delete(created.id).await.unwrap();

        assert_eq!(count_files(context.images.base_dir()), 0);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found_and_changes_nothing() {
        let context = TestContext::new().await;
        let service = service(&context);
        service
            .create(request("Zander", 20.0, vec![upload("z.jpg", b"z")]))
            .await
            .unwrap();

        let error = service.delete(404).await.unwrap_err();

        assert_eq!(error.kind(), ServiceErrorKind::NotFound);
        assert_eq!(count_files(context.images.base_dir()), 1);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_image_delete_keeps_the_row() {
        let context = TestContext::new().await;
        let service = service(&context);
        let created = service
            .create(request("Herring", 2.0, vec![upload("h.jpg", b"h")]))
            .await
            .unwrap();
        let file_name = &created.image_file_names_list()[0];
        let path = context.images.path_for(file_name);
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let error = service.delete(created.id).await.unwrap_err();

        assert_eq!(error.kind(), ServiceErrorKind::Storage);
        let found = FishRepository::find_model_by_id(context.db.as_ref(), created.id)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn sanitizes_uploaded_names() {
        assert_eq!(sanitize_original_name("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_original_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_original_name("C:\\Users\\me\\fish.png"), "fish.png");
        assert_eq!(sanitize_original_name("a,b.jpg"), "a_b.jpg");
        assert_eq!(sanitize_original_name(""), FALLBACK_IMAGE_NAME);
        assert_eq!(sanitize_original_name("dir/"), FALLBACK_IMAGE_NAME);
        assert_eq!(storage_file_name(17, 2, "x.png"), "17_2_x.png");
    }
}
