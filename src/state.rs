use std::sync::Arc;

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, JwtConfig};
use crate::db;
use crate::products::repo::{PgProductRepository, ProductRepository};
use crate::storage::{ImageStore, LocalImageStore};
use crate::users::repo::{PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(config).await?;
        let images = Arc::new(LocalImageStore::new(&config.images_dir).await?) as Arc<dyn ImageStore>;

        Ok(Self::from_parts(
            &config.jwt,
            Arc::new(PgUserRepository::new(db.clone())),
            Arc::new(PgProductRepository::new(db)),
            images,
        ))
    }

    pub fn from_parts(
        jwt: &JwtConfig,
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            jwt: JwtKeys::new(jwt),
            users,
            products,
            images,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::testing::{MemoryImageStore, MemoryProductRepository, MemoryUserRepository};

        let jwt = JwtConfig {
            secret: "test".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
        };

        Self::from_parts(
            &jwt,
            Arc::new(MemoryUserRepository::default()),
            Arc::new(MemoryProductRepository::default()),
            Arc::new(MemoryImageStore::default()),
        )
    }
}
