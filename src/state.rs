use std::sync::Arc;

use sqlx::SqlitePool;

use crate::geocoding::{Geocoder, NoopGeocoder};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    /// State without an external geocoder, used by tests and offline runs.
    pub fn offline(db: SqlitePool) -> Self {
        Self {
            db,
            geocoder: Arc::new(NoopGeocoder),
        }
    }
}
