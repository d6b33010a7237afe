use crate::domain::model::Location;
use crate::domain::ports::Geocoder;
use crate::utils::error::{DispatchError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// 參考地理服務對任何地址都回傳 (3, 3)
pub const DEFAULT_FALLBACK: Location = Location::new_const(3, 3);

/// 以固定街道表解析地址的地理編碼器，查無街道時回傳預設座標。
#[derive(Debug, Clone)]
pub struct StaticGeocoder {
    streets: HashMap<String, Location>,
    fallback: Location,
}

impl StaticGeocoder {
    pub fn new(fallback: Location) -> Self {
        Self {
            streets: HashMap::new(),
            fallback,
        }
    }

    pub fn with_street(mut self, street: &str, location: Location) -> Self {
        self.streets.insert(normalize(street), location);
        self
    }

    pub fn with_streets<'a, I>(mut self, streets: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Location)>,
    {
        for (street, location) in streets {
            self.streets.insert(normalize(street), *location);
        }
        self
    }
}

fn normalize(street: &str) -> String {
    street.trim().to_lowercase()
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn resolve(&self, street: &str, cancel: &CancellationToken) -> Result<Location> {
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        if street.trim().is_empty() {
            return Err(DispatchError::GeocodingError {
                street: street.to_string(),
                message: "street is blank".to_string(),
            });
        }

        match self.streets.get(&normalize(street)) {
            Some(location) => Ok(*location),
            None => {
                tracing::debug!("Street '{}' not in table, using fallback {}", street, self.fallback);
                Ok(self.fallback)
            }
        }
    }
}
