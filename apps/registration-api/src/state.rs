use crate::config::Config;
use sea_orm::DatabaseConnection;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
}
