use crate::config::AppConfig;
use crate::users::repo::{MongoUserStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = Arc::new(
            MongoUserStore::connect(&config.mongo.uri, config.mongo.database.as_deref()).await?,
        ) as Arc<dyn UserStore>;

        Ok(Self::from_parts(users, config))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::MongoConfig;
        use crate::users::memory::InMemoryUserStore;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            mongo: MongoConfig {
                uri: "mongodb://localhost:27017".into(),
                database: Some("test".into()),
            },
        });

        let users = Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>;
        Self::from_parts(users, config)
    }
}
