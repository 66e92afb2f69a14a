use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, storage::AssetStorage};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub storage: Arc<dyn AssetStorage>,
    pub config: Arc<AppConfig>,
}
