//! In-memory stand-ins for the database and image directory, used by unit
//! and router tests. Inserts and updates enforce the same unique columns the
//! migrations declare.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};
use crate::products::repo::ProductRepository;
use crate::products::repo_types::{Product, ProductFields};
use crate::storage::ImageStore;
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User};

struct Table<T> {
    rows: Vec<T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    table: Mutex<Table<User>>,
}

fn user_conflict(rows: &[User], user_name: &str, email: &str, except: Option<i64>) -> bool {
    rows.iter()
        .filter(|u| Some(u.id) != except)
        .any(|u| u.user_name == user_name || u.email == email)
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.table.lock().unwrap().rows.clone())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> AppResult<Option<User>> {
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.user_name == user_name).cloned())
    }

    async fn user_name_taken(&self, user_name: &str, except: Option<i64>) -> AppResult<bool> {
        let table = self.table.lock().unwrap();
        Ok(table
            .rows
            .iter()
            .any(|u| u.user_name == user_name && Some(u.id) != except))
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> AppResult<bool> {
        let table = self.table.lock().unwrap();
        Ok(table
            .rows
            .iter()
            .any(|u| u.email == email && Some(u.id) != except))
    }

    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let mut table = self.table.lock().unwrap();
        if user_conflict(&table.rows, &user.user_name, &user.email, None) {
            return Err(AppError::DuplicateField("duplicate user".into()));
        }
        let row = User {
            id: table.next_id(),
            user_name: user.user_name,
            password_hash: user.password_hash,
            email: user.email,
            last_login_time: user.last_login_time,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut table = self.table.lock().unwrap();
        if user_conflict(&table.rows, &user.user_name, &user.email, Some(user.id)) {
            return Err(AppError::DuplicateField("duplicate user".into()));
        }
        let row = table
            .rows
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found.", user.id)))?;
        *row = user.clone();
        Ok(row.clone())
    }

    async fn record_login(&self, id: i64, at: OffsetDateTime) -> AppResult<()> {
        let mut table = self.table.lock().unwrap();
        if let Some(row) = table.rows.iter_mut().find(|u| u.id == id) {
            row.last_login_time = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut table = self.table.lock().unwrap();
        let before = table.rows.len();
        table.rows.retain(|u| u.id != id);
        Ok(table.rows.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryProductRepository {
    table: Mutex<Table<Product>>,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn list(&self) -> AppResult<Vec<Product>> {
        Ok(self.table.lock().unwrap().rows.clone())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>> {
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().find(|p| p.id == id).cloned())
    }

    async fn code_taken(&self, code: &str, except: Option<i64>) -> AppResult<bool> {
        let table = self.table.lock().unwrap();
        Ok(table
            .rows
            .iter()
            .any(|p| p.product_code == code && Some(p.id) != except))
    }

    async fn insert(&self, fields: ProductFields, image_path: Option<String>) -> AppResult<Product> {
        let mut table = self.table.lock().unwrap();
        if table.rows.iter().any(|p| p.product_code == fields.product_code) {
            return Err(AppError::DuplicateField("duplicate product code".into()));
        }
        let mut row = Product {
            id: table.next_id(),
            category: None,
            product_code: String::new(),
            name: String::new(),
            image_path,
            price: Default::default(),
            minimum_quantity: None,
            discount_rate: None,
        };
        row.apply(fields);
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let mut table = self.table.lock().unwrap();
        if table
            .rows
            .iter()
            .any(|p| p.product_code == product.product_code && p.id != product.id)
        {
            return Err(AppError::DuplicateField("duplicate product code".into()));
        }
        let row = table
            .rows
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product.id)))?;
        *row = product.clone();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut table = self.table.lock().unwrap();
        let before = table.rows.len();
        table.rows.retain(|p| p.id != id);
        Ok(table.rows.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    files: Mutex<HashMap<String, Bytes>>,
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put_image(&self, name: &str, body: Bytes) -> anyhow::Result<String> {
        self.files.lock().unwrap().insert(name.to_string(), body);
        Ok(format!("images/{name}"))
    }

    async fn get_image(&self, name: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.files.lock().unwrap().get(name).cloned())
    }
}
