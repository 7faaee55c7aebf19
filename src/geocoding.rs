use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::geo::Coordinate;

const MAPBOX_PLACES_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Resolves a free-text address to a coordinate through an external service.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, AppError>;
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    place_name: String,
    /// `[longitude, latitude]`
    center: [f64; 2],
}

pub struct MapboxGeocoder {
    client: Client,
    token: String,
    country: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(token: String, country: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            token,
            country,
        })
    }

    fn places_url(&self, address: &str) -> Result<Url, AppError> {
        let mut params = vec![("access_token", self.token.as_str()), ("limit", "1")];
        if let Some(country) = &self.country {
            params.push(("country", country.as_str()));
        }
        let mut url = Url::parse_with_params(MAPBOX_PLACES_URL, &params)
            .map_err(|e| AppError::Config(format!("Invalid geocoding url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::InternalServerError)?
            .push(&format!("{}.json", address));
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, AppError> {
        let address = address.trim();
        if address.len() < 3 {
            return Ok(None);
        }

        let response = self
            .client
            .get(self.places_url(address)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Mapbox geocoding returned {} for {:?}", status, address);
            return Ok(None);
        }

        let places: PlacesResponse = response.json().await?;
        Ok(places.features.first().map(|f| {
            tracing::debug!("geocoded {:?} -> {}", address, f.place_name);
            Coordinate::new(f.center[1], f.center[0])
        }))
    }
}

pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Option<Coordinate>, AppError> {
        Ok(None)
    }
}

/// Picks the Mapbox client when a token is configured.
pub fn from_config(config: &AppConfig) -> Result<std::sync::Arc<dyn Geocoder>, AppError> {
    match &config.mapbox_token {
        Some(token) => Ok(std::sync::Arc::new(MapboxGeocoder::new(
            token.clone(),
            config.geocoding_country.clone(),
        )?)),
        None => {
            tracing::info!("MAPBOX_TOKEN not set, geocoding disabled");
            Ok(std::sync::Arc::new(NoopGeocoder))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_url_encodes_address_as_path_segment() {
        let geocoder = MapboxGeocoder::new("tok".to_string(), Some("cd".to_string())).unwrap();
        let url = geocoder.places_url("12 Av. de la Paix, Kinshasa").unwrap();
        assert!(url.path().ends_with("/mapbox.places/12%20Av.%20de%20la%20Paix,%20Kinshasa.json"));
        assert!(url.query().unwrap().contains("access_token=tok"));
        assert!(url.query().unwrap().contains("country=cd"));
    }

    #[tokio::test]
    async fn noop_geocoder_resolves_nothing() {
        assert_eq!(NoopGeocoder.geocode("anywhere").await.unwrap(), None);
    }
}
