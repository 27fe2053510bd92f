use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Product record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub category: Option<String>,
    pub product_code: String,
    pub name: String,
    pub image_path: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub minimum_quantity: Option<i32>,
    pub discount_rate: Option<f64>,
}

/// Mutable product fields as submitted by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub category: Option<String>,
    pub product_code: String,
    pub name: String,
    pub price: Decimal,
    pub minimum_quantity: Option<i32>,
    pub discount_rate: Option<f64>,
}

impl Product {
    /// Overwrites every mutable column; `image_path` is handled separately.
    pub fn apply(&mut self, fields: ProductFields) {
        self.category = fields.category;
        self.product_code = fields.product_code;
        self.name = fields.name;
        self.price = fields.price;
        self.minimum_quantity = fields.minimum_quantity;
        self.discount_rate = fields.discount_rate;
    }
}
