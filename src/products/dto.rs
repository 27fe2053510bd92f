use std::str::FromStr;

use axum::extract::Multipart;
use bytes::Bytes;
use rust_decimal::Decimal;

use super::repo_types::ProductFields;
use crate::error::{AppError, AppResult};

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub file_name: String,
    pub body: Bytes,
}

/// Raw multipart product form. Text fields may be prefixed with `product.`
/// and are matched case-insensitively.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub id: Option<String>,
    pub category: Option<String>,
    pub product_code: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub minimum_quantity: Option<String>,
    pub discount_rate: Option<String>,
    pub image: Option<UploadItem>,
}

fn field_key(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    lower
        .strip_prefix("product.")
        .unwrap_or(&lower)
        .replace('_', "")
}

/// Blank text counts as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_opt<T: FromStr>(value: Option<String>, field: &str) -> AppResult<Option<T>> {
    non_blank(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| AppError::InvalidPayload(format!("Invalid {field}: {v}")))
        })
        .transpose()
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    non_blank(value).ok_or_else(|| AppError::InvalidPayload(format!("{field} is required")))
}

impl ProductForm {
    pub async fn from_multipart(mut mp: Multipart) -> AppResult<Self> {
        let mut form = ProductForm::default();
        while let Some(field) = mp.next_field().await? {
            let key = field.name().map(field_key).unwrap_or_default();
            if key == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let body = field.bytes().await?;
                form.image = Some(UploadItem { file_name, body });
                continue;
            }
            let slot = match key.as_str() {
                "id" => &mut form.id,
                "category" => &mut form.category,
                "productcode" => &mut form.product_code,
                "name" => &mut form.name,
                "price" => &mut form.price,
                "minimumquantity" => &mut form.minimum_quantity,
                "discountrate" => &mut form.discount_rate,
                _ => continue,
            };
            *slot = Some(field.text().await?);
        }
        Ok(form)
    }

    /// Parsed `id` field, if the client sent one.
    pub fn id(&self) -> AppResult<Option<i64>> {
        parse_opt(self.id.clone(), "id")
    }

    /// Splits the form into typed product fields and the optional image.
    pub fn into_parts(self) -> AppResult<(ProductFields, Option<UploadItem>)> {
        let price = required(self.price, "price")?;
        let fields = ProductFields {
            category: non_blank(self.category),
            product_code: required(self.product_code, "productCode")?,
            name: required(self.name, "name")?,
            price: Decimal::from_str(&price)
                .map_err(|_| AppError::InvalidPayload(format!("Invalid price: {price}")))?,
            minimum_quantity: parse_opt(self.minimum_quantity, "minimumQuantity")?,
            discount_rate: parse_opt(self.discount_rate, "discountRate")?,
        };
        Ok((fields, self.image))
    }
}
