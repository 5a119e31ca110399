use crate::config::AppSettings;
use crate::handler::{IMAGES_ROUTE, api_v1_router, health_handler};
use crate::http::{
    app::AppBuilder,
    auth::AuthConfig,
    logging::init_logging,
    server::{Server, ServerConfig},
};
use crate::service::fish_service::FishService;
use crate::storage::ImageStorage;
use axum::routing::get;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

fn build_server(
    server_config: ServerConfig,
    db: Arc<DatabaseConnection>,
    images: ImageStorage,
    auth_config: AuthConfig,
) -> Server {
    let service = FishService::new(db.clone(), images.clone());
    let health_images = images.clone();

    let app_builder = AppBuilder::new()
        .route("/ping", get(health_handler::ping))
        .route(
            "/health",
            get(move || health_handler::health(db.clone(), health_images.clone())),
        )
        .nest("/api/v1", api_v1_router(service, auth_config.shared()))
        .static_dir(IMAGES_ROUTE, ServeDir::new(images.base_dir()));

    Server::new(server_config, app_builder)
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = AppSettings::from_env()?;
    init_logging(&settings.logging)?;

    let images = ImageStorage::open(&settings.image_dir)?;
    info!(image_dir = %images.base_dir().display(), "Image directory ready");

    let db = Database::connect(&settings.database_url).await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations applied");

    let auth_config = AuthConfig::catalog_users(
        &settings.admin_password,
        &settings.user_password,
        settings.bcrypt_cost,
    )?;

    build_server(settings.server, Arc::new(db), images, auth_config)
        .start()
        .await
}
