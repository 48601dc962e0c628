//! The seam between [`Client`](crate::Client) and whatever answers soil
//! queries: the public SoilGrids service, a test double, or another dataset.

use crate::dataset::GriddedDataset;
use crate::error::{Error, Result};
use crate::location::BoundingBox;
use crate::point::SoilProperties;
use crate::property::{Depth, SoilProperty};

/// Value statistics the REST endpoint can return.
pub const VALUE_STATISTICS: [&str; 5] = ["Q0.05", "Q0.5", "Q0.95", "mean", "uncertainty"];

pub trait SoilSource {
    /// Soil properties at one WGS84 point. Must make at most one outbound
    /// request.
    fn query_point(&self, lon: f64, lat: f64, request: &PointRequest) -> Result<SoilProperties>;

    /// Gridded soil properties covering `bbox`.
    fn fetch_region(&self, bbox: &BoundingBox, request: &RegionRequest) -> Result<GriddedDataset>;
}

impl<S: SoilSource + ?Sized> SoilSource for &S {
    fn query_point(&self, lon: f64, lat: f64, request: &PointRequest) -> Result<SoilProperties> {
        (**self).query_point(lon, lat, request)
    }

    fn fetch_region(&self, bbox: &BoundingBox, request: &RegionRequest) -> Result<GriddedDataset> {
        (**self).fetch_region(bbox, request)
    }
}

/// What a point query asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRequest {
    pub properties: Vec<SoilProperty>,
    pub depths: Vec<Depth>,
    /// Statistics, see [`VALUE_STATISTICS`].
    pub values: Vec<String>,
}

impl Default for PointRequest {
    fn default() -> Self {
        Self {
            properties: SoilProperty::ALL.to_vec(),
            depths: Depth::STANDARD.to_vec(),
            values: vec!["mean".to_string()],
        }
    }
}

impl PointRequest {
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = SoilProperty>) -> Self {
        self.properties = properties.into_iter().collect();
        self
    }

    pub fn with_depths(mut self, depths: impl IntoIterator<Item = Depth>) -> Self {
        self.depths = depths.into_iter().collect();
        self
    }

    pub fn with_values<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.properties.is_empty() {
            return Err(Error::invalid("properties", "at least one property is required"));
        }
        if self.depths.is_empty() {
            return Err(Error::invalid("depths", "at least one depth is required"));
        }
        if self.values.is_empty() {
            return Err(Error::invalid("values", "at least one value statistic is required"));
        }
        if let Some(bad) = self
            .values
            .iter()
            .find(|v| !VALUE_STATISTICS.contains(&v.as_str()))
        {
            return Err(Error::invalid(
                "values",
                format!("unknown statistic '{bad}' (expected one of {VALUE_STATISTICS:?})"),
            ));
        }
        Ok(())
    }
}

/// What a bulk download asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRequest {
    pub properties: Vec<SoilProperty>,
}

impl Default for RegionRequest {
    fn default() -> Self {
        Self {
            properties: SoilProperty::ALL.to_vec(),
        }
    }
}

impl RegionRequest {
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = SoilProperty>) -> Self {
        let mut properties: Vec<_> = properties.into_iter().collect();
        properties.sort();
        properties.dedup();
        self.properties = properties;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.properties.is_empty() {
            return Err(Error::invalid("properties", "at least one property is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_are_valid() {
        assert!(PointRequest::default().validate().is_ok());
        assert!(RegionRequest::default().validate().is_ok());
    }

    #[test]
    fn unknown_statistics_are_rejected() {
        let req = PointRequest::default().with_values(["mean", "median"]);
        let err = req.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { field: "values", .. }));
    }

    #[test]
    fn region_properties_are_deduplicated() {
        let req = RegionRequest::default().with_properties([
            SoilProperty::Sand,
            SoilProperty::Clay,
            SoilProperty::Sand,
        ]);
        assert_eq!(req.properties, vec![SoilProperty::Clay, SoilProperty::Sand]);
        assert!(RegionRequest::default().with_properties([]).validate().is_err());
    }
}
