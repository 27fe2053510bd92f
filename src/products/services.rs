use anyhow::Context;
use bytes::Bytes;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::dto::UploadItem;
use super::repo_types::{Product, ProductFields};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::{content_type_for, upload_file_name};

const DUPLICATE_CODE: &str = "Product with this code already exists.";

fn validate_fields(fields: &ProductFields) -> AppResult<()> {
    if fields.price < Decimal::ZERO {
        return Err(AppError::InvalidPayload("price must not be negative".into()));
    }
    if fields.minimum_quantity.is_some_and(|q| q < 0) {
        return Err(AppError::InvalidPayload(
            "minimumQuantity must not be negative".into(),
        ));
    }
    if fields
        .discount_rate
        .is_some_and(|r| !(0.0..=1.0).contains(&r))
    {
        return Err(AppError::InvalidPayload(
            "discountRate must be between 0 and 1".into(),
        ));
    }
    Ok(())
}

/// Writes the image and returns the stored path.
async fn store_image(st: &AppState, image: UploadItem) -> AppResult<String> {
    let name = upload_file_name(&image.file_name)
        .ok_or_else(|| AppError::InvalidPayload("Image needs a file name.".into()))?
        .to_string();
    let path = st
        .images
        .put_image(&name, image.body)
        .await
        .with_context(|| format!("store image {name}"))?;
    Ok(path)
}

pub async fn list_products(st: &AppState) -> AppResult<Vec<Product>> {
    st.products.list().await
}

pub async fn get_product(st: &AppState, id: i64) -> AppResult<Option<Product>> {
    st.products.find_by_id(id).await
}

/// The code check runs before the image is written so a rejected product
/// leaves no file behind.
pub async fn create_product(
    st: &AppState,
    fields: ProductFields,
    image: Option<UploadItem>,
) -> AppResult<Product> {
    validate_fields(&fields)?;
    let image = image
        .filter(|img| !img.body.is_empty())
        .ok_or_else(|| AppError::InvalidPayload("Upload a file.".into()))?;

    if st.products.code_taken(&fields.product_code, None).await? {
        warn!(product_code = %fields.product_code, "duplicate product code");
        return Err(AppError::DuplicateField(DUPLICATE_CODE.into()));
    }

    let image_path = store_image(st, image).await?;
    let product = st.products.insert(fields, Some(image_path)).await?;

    info!(product_id = product.id, product_code = %product.product_code, "product created");
    Ok(product)
}

/// Overwrites every field. The image path only changes when a new image is
/// supplied; the replaced file stays on disk.
pub async fn update_product(
    st: &AppState,
    id: i64,
    fields: ProductFields,
    image: Option<UploadItem>,
) -> AppResult<Product> {
    let mut existing = st
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with ID {id} not found.")))?;

    validate_fields(&fields)?;
    if fields.product_code != existing.product_code
        && st.products.code_taken(&fields.product_code, Some(id)).await?
    {
        warn!(product_id = id, product_code = %fields.product_code, "duplicate product code");
        return Err(AppError::DuplicateField(DUPLICATE_CODE.into()));
    }

    if let Some(image) = image.filter(|img| !img.body.is_empty()) {
        existing.image_path = Some(store_image(st, image).await?);
    }
    existing.apply(fields);

    let product = st.products.update(&existing).await?;
    info!(product_id = product.id, "product updated");
    Ok(product)
}

/// Removes the record only; its image file is left in place.
pub async fn delete_product(st: &AppState, id: i64) -> AppResult<()> {
    if !st.products.delete(id).await? {
        return Err(AppError::NotFound(format!("Product with ID {id} not found.")));
    }
    info!(product_id = id, "product deleted");
    Ok(())
}

/// Resolves an image name to its bytes and content type. Unsupported
/// extensions are not found even if the file exists.
pub async fn load_image(st: &AppState, name: &str) -> AppResult<(Bytes, &'static str)> {
    let not_found = || AppError::NotFound(format!("Image {name} not found."));
    let content_type = content_type_for(name).ok_or_else(not_found)?;
    let body = st.images.get_image(name).await?.ok_or_else(not_found)?;
    Ok((body, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn fields(code: &str) -> ProductFields {
        ProductFields {
            category: Some("kitchen".into()),
            product_code: code.into(),
            name: "Kettle".into(),
            price: Decimal::from_str("19.99").unwrap(),
            minimum_quantity: Some(1),
            discount_rate: Some(0.1),
        }
    }

    fn image(name: &str, body: &'static [u8]) -> Option<UploadItem> {
        Some(UploadItem {
            file_name: name.into(),
            body: Bytes::from_static(body),
        })
    }

    #[tokio::test]
    async fn create_stores_image_and_attaches_path() {
        let st = AppState::fake();
        let product = create_product(&st, fields("X"), image("kettle.png", b"png"))
            .await
            .unwrap();
        assert!(product.image_path.as_deref().unwrap().ends_with("kettle.png"));
        assert_eq!(st.images.get_image("kettle.png").await.unwrap().unwrap(), "png");
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected_and_other_code_is_fine() {
        let st = AppState::fake();
        create_product(&st, fields("X"), image("a.png", b"a")).await.unwrap();

        let err = create_product(&st, fields("X"), image("b.png", b"b"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateField(_)));
        assert!(st.images.get_image("b.png").await.unwrap().is_none());

        create_product(&st, fields("Y"), image("c.png", b"c")).await.unwrap();
        assert_eq!(list_products(&st).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_without_image_is_invalid_payload() {
        let st = AppState::fake();
        let err = create_product(&st, fields("X"), None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
        let err = create_product(&st, fields("X"), image("a.png", b""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn out_of_range_values_are_invalid_payload() {
        let st = AppState::fake();
        let mut f = fields("X");
        f.discount_rate = Some(1.5);
        let err = create_product(&st, f, image("a.png", b"a")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));

        let mut f = fields("X");
        f.price = Decimal::from_str("-1").unwrap();
        let err = create_product(&st, f, image("a.png", b"a")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn update_keeps_image_unless_a_new_one_is_sent() {
        let st = AppState::fake();
        let created = create_product(&st, fields("X"), image("a.png", b"a")).await.unwrap();

        let mut f = fields("X");
        f.name = "Steel kettle".into();
        let updated = update_product(&st, created.id, f, None).await.unwrap();
        assert_eq!(updated.name, "Steel kettle");
        assert_eq!(updated.image_path, created.image_path);

        let replaced = update_product(&st, created.id, fields("X"), image("b.jpg", b"b"))
            .await
            .unwrap();
        assert!(replaced.image_path.as_deref().unwrap().ends_with("b.jpg"));
        // The old file is not cleaned up.
        assert!(st.images.get_image("a.png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_overwrites_optional_fields() {
        let st = AppState::fake();
        let created = create_product(&st, fields("X"), image("a.png", b"a")).await.unwrap();
        let mut f = fields("X");
        f.category = None;
        f.discount_rate = None;
        let updated = update_product(&st, created.id, f, None).await.unwrap();
        assert_eq!(updated.category, None);
        assert_eq!(updated.discount_rate, None);
    }

    #[tokio::test]
    async fn update_rechecks_code_against_other_products() {
        let st = AppState::fake();
        create_product(&st, fields("X"), image("a.png", b"a")).await.unwrap();
        let y = create_product(&st, fields("Y"), image("b.png", b"b")).await.unwrap();
        let err = update_product(&st, y.id, fields("X"), None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateField(_)));
    }

    #[tokio::test]
    async fn update_missing_product_is_not_found() {
        let st = AppState::fake();
        let err = update_product(&st, 42, fields("X"), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_from_list_and_second_delete_is_not_found() {
        let st = AppState::fake();
        let p = create_product(&st, fields("X"), image("a.png", b"a")).await.unwrap();
        delete_product(&st, p.id).await.unwrap();
        assert!(list_products(&st).await.unwrap().is_empty());
        assert!(matches!(
            delete_product(&st, p.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        // Orphaned image stays.
        assert!(st.images.get_image("a.png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn load_image_enforces_extension_allow_list() {
        let st = AppState::fake();
        st.images
            .put_image("evil.exe", Bytes::from_static(b"MZ"))
            .await
            .unwrap();
        st.images
            .put_image("ok.jpeg", Bytes::from_static(b"jpg"))
            .await
            .unwrap();

        assert!(matches!(
            load_image(&st, "evil.exe").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            load_image(&st, "missing.png").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        let (body, ct) = load_image(&st, "ok.jpeg").await.unwrap();
        assert_eq!(body, "jpg");
        assert_eq!(ct, "image/jpeg");
    }
}
