use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::profiles;
use crate::error::{AppError, conflict_on_unique};
use crate::geo::Coordinate;
use crate::geocoding::Geocoder;
use crate::models::{NewProfileRequest, Profile, UpdateProfileRequest, UserRole};

pub struct ProfileService {
    db: SqlitePool,
    geocoder: Arc<dyn Geocoder>,
}

impl ProfileService {
    pub fn new(db: SqlitePool, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { db, geocoder }
    }

    pub async fn register(&self, req: NewProfileRequest) -> Result<Profile, AppError> {
        if req.id.trim().is_empty() || !req.email.contains('@') {
            return Err(AppError::BadRequest("id and a valid email are required".to_string()));
        }
        let profile = profiles::insert_profile(&self.db, req)
            .await
            .map_err(|e| conflict_on_unique(e, "profile already exists"))?;
        info!("Registered profile {} as {}", profile.id, profile.role.as_str());
        Ok(profile)
    }

    /// Updates contact details and home address.
    ///
    /// A new address without explicit coordinates is geocoded; when that
    /// fails the address is stored without coordinates.
    pub async fn update(&self, id: &str, mut req: UpdateProfileRequest) -> Result<Profile, AppError> {
        let current = profiles::find_profile(&self.db, id)
            .await?
            .ok_or(AppError::NotFound)?;

        match (req.home_latitude, req.home_longitude) {
            (Some(lat), Some(lng)) => {
                if !Coordinate::new(lat, lng).is_valid() {
                    return Err(AppError::BadRequest(format!("invalid coordinate {}, {}", lat, lng)));
                }
            }
            (None, None) => {}
            _ => {
                return Err(AppError::BadRequest(
                    "home_latitude and home_longitude must be given together".to_string(),
                ));
            }
        }

        let address_changed = req
            .home_address
            .as_deref()
            .map(str::trim)
            .is_some_and(|a| !a.is_empty() && current.home_address.as_deref() != Some(a));

        if address_changed && req.home_latitude.is_none() {
            let address = req.home_address.clone().unwrap_or_default();
            match self.geocoder.geocode(&address).await {
                Ok(Some(point)) => {
                    req.home_latitude = Some(point.latitude);
                    req.home_longitude = Some(point.longitude);
                }
                Ok(None) => warn!("No geocoding match for address of profile {}", id),
                Err(e) => warn!("Geocoding failed for profile {}: {}", id, e),
            }
        } else if req.home_address.is_some() && req.home_latitude.is_none() {
            req.home_latitude = current.home_latitude;
            req.home_longitude = current.home_longitude;
        }

        let profile = profiles::update_profile(&self.db, id, req)
            .await?
            .ok_or(AppError::NotFound)?;
        info!("Updated profile {}", id);
        Ok(profile)
    }

    pub async fn change_role(&self, id: &str, role: UserRole) -> Result<Profile, AppError> {
        if !profiles::update_role(&self.db, id, role).await? {
            return Err(AppError::NotFound);
        }
        info!("Changed role of {} to {}", id, role.as_str());
        profiles::find_profile(&self.db, id)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::db::connect_in_memory;
    use crate::geocoding::NoopGeocoder;

    struct FixedGeocoder(Coordinate);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinate>, AppError> {
            Ok(Some(self.0))
        }
    }

    struct FailingGeocoder;

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinate>, AppError> {
            Err(AppError::InternalServerError)
        }
    }

    async fn service_with(geocoder: Arc<dyn Geocoder>) -> ProfileService {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let service = ProfileService::new(pool, geocoder);
        service
            .register(NewProfileRequest {
                id: "s1".to_string(),
                email: "s1@example.com".to_string(),
                role: None,
                full_name: Some("Amani".to_string()),
                phone: None,
            })
            .await
            .unwrap();
        service
    }

    fn address(value: &str) -> UpdateProfileRequest {
        UpdateProfileRequest {
            home_address: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_address_is_geocoded() {
        let service = service_with(Arc::new(FixedGeocoder(Coordinate::new(-4.3, 15.3)))).await;
        let profile = service.update("s1", address("Boulevard du 30 Juin")).await.unwrap();
        assert_eq!(profile.home_latitude, Some(-4.3));
        assert_eq!(profile.home_longitude, Some(15.3));
    }

    #[tokio::test]
    async fn test_explicit_coordinates_win() {
        let service = service_with(Arc::new(FixedGeocoder(Coordinate::new(-4.3, 15.3)))).await;
        let mut req = address("Boulevard du 30 Juin");
        req.home_latitude = Some(1.0);
        req.home_longitude = Some(2.0);
        let profile = service.update("s1", req).await.unwrap();
        assert_eq!(profile.home_latitude, Some(1.0));
    }

    #[tokio::test]
    async fn test_failed_geocoding_keeps_address() {
        let service = service_with(Arc::new(FailingGeocoder)).await;
        let profile = service.update("s1", address("Nowhere Road")).await.unwrap();
        assert_eq!(profile.home_address.as_deref(), Some("Nowhere Road"));
        assert!(profile.home_latitude.is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_coordinates_and_duplicates() {
        let service = service_with(Arc::new(NoopGeocoder)).await;
        let req = UpdateProfileRequest {
            home_latitude: Some(123.0),
            home_longitude: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(service.update("s1", req).await, Err(AppError::BadRequest(_))));

        let dup = service
            .register(NewProfileRequest {
                id: "s1".to_string(),
                email: "other@example.com".to_string(),
                role: None,
                full_name: None,
                phone: None,
            })
            .await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_change_role() {
        let service = service_with(Arc::new(NoopGeocoder)).await;
        let profile = service.change_role("s1", UserRole::Teacher).await.unwrap();
        assert_eq!(profile.role, UserRole::Teacher);
        assert!(matches!(
            service.change_role("ghost", UserRole::Teacher).await,
            Err(AppError::NotFound)
        ));
    }
}
