use crate::handler::{IMAGES_ROUTE, success_response};
use crate::http::auth::{
    AuthUser, ROLE_ADMIN, SharedAuthConfig, basic_auth_middleware, require_roles,
};
use crate::persistence::FishModel;
use crate::service::error::ServiceError;
use crate::service::fish_service::{CreateFishRequest, FishService, ImageUpload};
use axum::{
    Extension, Router,
    extract::{
        Multipart, Path,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{Instrument, info_span};

const FIELD_NAME: &str = "name";
const FIELD_PRICE: &str = "price";
const FIELD_IMAGE_FILES: &str = "imageFiles";

#[derive(Debug, Serialize)]
pub(crate) struct FishView {
    id: i32,
    name: String,
    price: f64,
    catch_date: DateTime<FixedOffset>,
    image_file_names: Vec<String>,
    image_urls: Vec<String>,
}

impl From<FishModel> for FishView {
    fn from(model: FishModel) -> Self {
        let image_file_names = model.image_file_names_list();
        let image_urls = image_file_names
            .iter()
            .map(|file_name| format!("{IMAGES_ROUTE}/{}", urlencoding::encode(file_name)))
            .collect();

        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            catch_date: model.catch_date,
            image_file_names,
            image_urls,
        }
    }
}

fn multipart_error(context: &str, error: MultipartError) -> ServiceError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::payload_too_large(error.body_text())
    } else {
        ServiceError::validation(format!("{context}: {error}"))
    }
}

async fn read_text(field: Field<'_>, field_name: &str) -> Result<String, ServiceError> {
    field
        .text()
        .await
        .map_err(|error| multipart_error(&format!("failed to read field `{field_name}`"), error))
}

fn parse_price(raw: &str) -> Result<f64, ServiceError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ServiceError::validation("field `price` must be a number"))
}

async fn parse_create_request(mut multipart: Multipart) -> Result<CreateFishRequest, ServiceError> {
    let mut name = None;
    let mut price = None;
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| multipart_error("invalid multipart payload", error))?
    {
        let field_name = field.name().map(str::to_owned).unwrap_or_default();
        match field_name.as_str() {
            FIELD_NAME => name = Some(read_text(field, FIELD_NAME).await?),
            FIELD_PRICE => price = Some(parse_price(&read_text(field, FIELD_PRICE).await?)?),
            FIELD_IMAGE_FILES => {
                let original_filename = field.file_name().map(str::to_owned).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| multipart_error("failed to read upload", error))?;
                images.push(ImageUpload {
                    original_filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ServiceError::validation("missing required field `name`"))?;
    let price = price.ok_or_else(|| ServiceError::validation("missing required field `price`"))?;

    Ok(CreateFishRequest {
        name,
        price,
        images,
    })
}

/// Browsing needs any account, changing the catalog needs the admin role.
pub(crate) fn router(service: FishService, auth_config: SharedAuthConfig) -> Router {
    let list_service = service.clone();
    let create_service = service.clone();
    let delete_service = service;

    let manage = Router::new()
        .route(
            "/fish",
            post(
                move |Extension(user): Extension<AuthUser>, multipart: Multipart| {
                    create_fish(create_service.clone(), user, multipart)
                },
            ),
        )
        .route(
            "/fish/{id}",
            delete(
                move |Extension(user): Extension<AuthUser>, Path(id): Path<i32>| {
                    delete_fish(delete_service.clone(), user, id)
                },
            ),
        )
        .layer(middleware::from_fn(require_roles(&[ROLE_ADMIN])));

    Router::new()
        .route("/fish", get(move || list_fish(list_service.clone())))
        .merge(manage)
        .layer(middleware::from_fn_with_state(
            auth_config,
            basic_auth_middleware,
        ))
}

async fn list_fish(service: FishService) -> Result<Response, ServiceError> {
    let data: Vec<FishView> = service
        .list()
        .await?
        .into_iter()
        .map(FishView::from)
        .collect();
    Ok(success_response(StatusCode::OK, data))
}

async fn create_fish(
    service: FishService,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let request = parse_create_request(multipart).await?;
    let created = service
        .create(request)
        .instrument(info_span!("catalog_change", username = %user.username))
        .await?;
    Ok(success_response(StatusCode::CREATED, FishView::from(created)))
}

async fn delete_fish(service: FishService, user: AuthUser, id: i32) -> Result<Response, ServiceError> {
    service
        .delete(id)
        .instrument(info_span!("catalog_change", username = %user.username))
        .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
