use log::{info, warn};
use std::sync::Arc;

use crate::auth::{Credentials, TokenService};
use crate::config::Config;
use crate::error::AppError;
use crate::store::{MemoryStore, PgStore, TodoStore, UserStore};
use crate::todos::TodoRepository;

/// Everything a handler needs, shared across workers through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Credentials,
    pub todos: TodoRepository,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, tokens: TokenService, bcrypt_cost: u32) -> Self
    where
        S: UserStore + TodoStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let todos: Arc<dyn TodoStore> = store;
        Self {
            credentials: Credentials::new(users, tokens, bcrypt_cost),
            todos: TodoRepository::new(todos),
        }
    }

    /// State backed by the in-process store.
    pub fn in_memory(jwt_secret: &str, bcrypt_cost: u32) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            TokenService::new(jwt_secret),
            bcrypt_cost,
        )
    }

    /// Opens the configured store.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let tokens = TokenService::new(&config.jwt_secret);
        match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url).await?;
                info!("Connected to PostgreSQL");
                Ok(Self::new(Arc::new(store), tokens, config.bcrypt_cost))
            }
            None => {
                warn!("DATABASE_URL not set, data is kept in memory and lost on exit");
                Ok(Self::new(
                    Arc::new(MemoryStore::new()),
                    tokens,
                    config.bcrypt_cost,
                ))
            }
        }
    }

    /// Releases the store. Call once after the server has stopped.
    pub async fn shutdown(&self) {
        self.credentials.close().await;
        info!("Store closed");
    }
}
