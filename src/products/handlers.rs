use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::PathRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::ProductForm;
use super::repo_types::Product;
use super::services;
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/images/:name", get(get_product_image))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(services::list_products(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Product>> {
    let Path(id) = path?;
    services::get_product(&state, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product with ID {id} not found.")))
}

#[instrument(skip(state))]
pub async fn get_product_image(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(name) = path?;
    let (body, content_type) = services::load_image(&state, &name).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], body))
}

/// POST /products (multipart: product fields + `image` file)
#[instrument(skip(state, mp))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, [(header::HeaderName, String); 1], Json<Product>)> {
    let (fields, image) = ProductForm::from_multipart(mp?).await?.into_parts()?;
    let product = services::create_product(&state, fields, image).await?;
    info!(%principal, product_id = product.id, "product created via api");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/products/{}", product.id))],
        Json(product),
    ))
}

/// PUT /products/{id} (multipart, `image` optional)
#[instrument(skip(state, mp))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    let form = ProductForm::from_multipart(mp?).await?;
    if form.id()?.is_some_and(|body_id| body_id != id) {
        return Err(AppError::InvalidPayload("Product ID mismatch".into()));
    }
    let (fields, image) = form.into_parts()?;
    services::update_product(&state, id, fields, image).await?;
    info!(%principal, product_id = id, "product updated via api");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    services::delete_product(&state, id).await?;
    info!(%principal, product_id = id, "product deleted via api");
    Ok(StatusCode::NO_CONTENT)
}
