//! Flat-rate fare quotes between the cities Freedom operates in.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

pub const BASE_FARE_GHS: f64 = 5.0;
pub const RATE_PER_KM_GHS: f64 = 1.2;
pub const CURRENCY: &str = "GHS";

const KM_PER_DEGREE: f64 = 111.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Straight-line distance on the degree grid, rounded to whole kilometres.
    pub fn distance_km(self, other: Coordinates) -> u32 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        ((dlat * dlat + dlng * dlng).sqrt() * KM_PER_DEGREE).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FareError {
    #[error("{0} location is required")]
    MissingLocation(&'static str),
    #[error("no coordinates known for '{location}' (known: {known})")]
    UnknownLocation { location: String, known: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FareRequest {
    pub pickup: String,
    pub dropoff: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareQuote {
    pub pickup: String,
    pub dropoff: String,
    pub distance_km: u32,
    pub price: f64,
    pub currency: &'static str,
}

/// Price in cedis for a trip of `distance_km`, rounded to one decimal place.
pub fn price_for_distance(distance_km: u32) -> f64 {
    let raw = BASE_FARE_GHS + f64::from(distance_km) * RATE_PER_KM_GHS;
    (raw * 10.0).round() / 10.0
}

/// Looks up city coordinates and prices the trip between them.
#[derive(Debug, Clone)]
pub struct FareEstimator {
    locations: Vec<(String, Coordinates)>,
}

impl Default for FareEstimator {
    fn default() -> Self {
        Self::new([
            ("accra", Coordinates::new(5.6037, -0.1870)),
            ("kumasi", Coordinates::new(6.6885, -1.6244)),
            ("tamale", Coordinates::new(9.4075, -0.8533)),
            ("takoradi", Coordinates::new(4.9047, -1.7740)),
        ])
    }
}

impl FareEstimator {
    pub fn new<'a>(locations: impl IntoIterator<Item = (&'a str, Coordinates)>) -> Self {
        Self {
            locations: locations
                .into_iter()
                .map(|(name, coordinates)| (name.to_ascii_lowercase(), coordinates))
                .collect(),
        }
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> + '_ {
        self.locations.iter().map(|(name, _)| name.as_str())
    }

    pub fn locate(&self, name: &str) -> Option<Coordinates> {
        let wanted = name.trim().to_ascii_lowercase();
        self.locations
            .iter()
            .find(|(known, _)| *known == wanted)
            .map(|(_, coordinates)| *coordinates)
    }

    pub fn estimate(&self, pickup: &str, dropoff: &str) -> Result<FareQuote, FareError> {
        let from = self.resolve(pickup, "pickup")?;
        let to = self.resolve(dropoff, "dropoff")?;

        let distance_km = from.distance_km(to);
        let quote = FareQuote {
            pickup: pickup.trim().to_string(),
            dropoff: dropoff.trim().to_string(),
            distance_km,
            price: price_for_distance(distance_km),
            currency: CURRENCY,
        };
        debug!(
            pickup = %quote.pickup,
            dropoff = %quote.dropoff,
            distance_km,
            price = quote.price,
            "fare estimated"
        );
        Ok(quote)
    }

    fn resolve(&self, name: &str, role: &'static str) -> Result<Coordinates, FareError> {
        if name.trim().is_empty() {
            return Err(FareError::MissingLocation(role));
        }
        self.locate(name)
            .ok_or_else(|| FareError::UnknownLocation {
                location: name.trim().to_string(),
                known: self.locations().collect::<Vec<_>>().join(", "),
            })
    }
}

pub fn fare_router(estimator: Arc<FareEstimator>) -> Router {
    Router::new()
        .route("/api/v1/fares/estimate", post(estimate_handler))
        .with_state(estimator)
}

pub(crate) async fn estimate_handler(
    State(estimator): State<Arc<FareEstimator>>,
    axum::Json(request): axum::Json<FareRequest>,
) -> Response {
    match estimator.estimate(&request.pickup, &request.dropoff) {
        Ok(quote) => (StatusCode::OK, axum::Json(quote)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
