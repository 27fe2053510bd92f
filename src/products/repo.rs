use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Product, ProductFields};
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Product>>;
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>>;
    /// True when another product (not `except`) already uses `code`.
    async fn code_taken(&self, code: &str, except: Option<i64>) -> AppResult<bool>;
    async fn insert(&self, fields: ProductFields, image_path: Option<String>) -> AppResult<Product>;
    async fn update(&self, product: &Product) -> AppResult<Product>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgProductRepository {
    db: PgPool,
}

impl PgProductRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category, product_code, name, image_path, price,
                   minimum_quantity, discount_rate
              FROM products
             ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category, product_code, name, image_path, price,
                   minimum_quantity, discount_rate
              FROM products
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn code_taken(&self, code: &str, except: Option<i64>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM products
                 WHERE product_code = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(code)
        .bind(except)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, fields: ProductFields, image_path: Option<String>) -> AppResult<Product> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (category, product_code, name, image_path, price,
                                  minimum_quantity, discount_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, category, product_code, name, image_path, price,
                      minimum_quantity, discount_rate
            "#,
        )
        .bind(fields.category)
        .bind(fields.product_code)
        .bind(fields.name)
        .bind(image_path)
        .bind(fields.price)
        .bind(fields.minimum_quantity)
        .bind(fields.discount_rate)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET category = $2, product_code = $3, name = $4, image_path = $5,
                   price = $6, minimum_quantity = $7, discount_rate = $8
             WHERE id = $1
            RETURNING id, category, product_code, name, image_path, price,
                      minimum_quantity, discount_rate
            "#,
        )
        .bind(product.id)
        .bind(&product.category)
        .bind(&product.product_code)
        .bind(&product.name)
        .bind(&product.image_path)
        .bind(product.price)
        .bind(product.minimum_quantity)
        .bind(product.discount_rate)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product.id)))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
