//! Response model of the SoilGrids REST `properties/query` endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProperties {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub geometry: PointGeometry,
    pub properties: LayerCollection,
    /// Server side processing time, in seconds.
    #[serde(default)]
    pub query_time_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// `[lon, lat]`
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCollection {
    #[serde(default)]
    pub layers: Vec<SoilLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilLayer {
    pub name: String,
    pub unit_measure: UnitMeasure,
    #[serde(default)]
    pub depths: Vec<DepthValues>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMeasure {
    /// Divisor from `mapped_units` to `target_units`.
    pub d_factor: f64,
    pub mapped_units: String,
    pub target_units: String,
    #[serde(default)]
    pub uncertainty_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthValues {
    pub range: DepthRange,
    /// e.g. `0-5cm`
    pub label: String,
    /// Statistic name (`mean`, `Q0.5`, `uncertainty`, ...) to mapped value;
    /// `None` where the cell has no data.
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub top_depth: f64,
    pub bottom_depth: f64,
    pub unit_depth: String,
}

impl SoilProperties {
    /// Queried `(lon, lat)` as echoed by the service.
    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        match self.geometry.coordinates.as_slice() {
            [lon, lat, ..] => Some((*lon, *lat)),
            _ => None,
        }
    }

    pub fn layers(&self) -> &[SoilLayer] {
        &self.properties.layers
    }

    pub fn is_empty(&self) -> bool {
        self.properties.layers.is_empty()
    }

    pub fn layer(&self, name: &str) -> Option<&SoilLayer> {
        self.properties.layers.iter().find(|l| l.name == name)
    }

    /// Mapped (integer-scaled) value of `stat` for `property` at depth
    /// `label` (`"0-5cm"` or `"0-5"`).
    pub fn value(&self, property: &str, label: &str, stat: &str) -> Option<f64> {
        self.layer(property)?.value(label, stat)
    }
}

impl SoilLayer {
    pub fn value(&self, label: &str, stat: &str) -> Option<f64> {
        let bare = label.trim_end_matches("cm");
        self.depths
            .iter()
            .find(|d| d.label.trim_end_matches("cm") == bare)
            .and_then(|d| d.values.get(stat).copied().flatten())
    }

    /// Like [`Self::value`] but divided by `d_factor` into target units.
    pub fn converted(&self, label: &str, stat: &str) -> Option<f64> {
        let v = self.value(label, stat)?;
        if self.unit_measure.d_factor == 0.0 {
            return Some(v);
        }
        Some(v / self.unit_measure.d_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [-3.5, 50.7]},
        "properties": {
            "layers": [
                {
                    "name": "clay",
                    "unit_measure": {"d_factor": 10, "mapped_units": "g/kg", "target_units": "%", "uncertainty_unit": ""},
                    "depths": [
                        {"range": {"top_depth": 0, "bottom_depth": 5, "unit_depth": "cm"}, "label": "0-5cm", "values": {"mean": 231, "Q0.5": 226}},
                        {"range": {"top_depth": 5, "bottom_depth": 15, "unit_depth": "cm"}, "label": "5-15cm", "values": {"mean": null}}
                    ]
                }
            ]
        },
        "query_time_s": 0.82
    }"#;

    #[test]
    fn parses_rest_reply() {
        let props: SoilProperties = serde_json::from_str(REPLY).unwrap();
        assert_eq!(props.lon_lat(), Some((-3.5, 50.7)));
        assert!(!props.is_empty());
        assert_eq!(props.value("clay", "0-5cm", "mean"), Some(231.0));
        assert_eq!(props.value("clay", "0-5", "Q0.5"), Some(226.0));
        assert_eq!(props.value("clay", "5-15cm", "mean"), None);
        assert_eq!(props.value("sand", "0-5cm", "mean"), None);
        assert_eq!(props.layer("clay").unwrap().converted("0-5", "mean"), Some(23.1));
        assert_eq!(props.query_time_s, Some(0.82));
    }

    #[test]
    fn missing_layers_parse_as_empty() {
        let props: SoilProperties = serde_json::from_str(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{}}"#,
        )
        .unwrap();
        assert!(props.is_empty());
    }
}
