#![allow(dead_code)]

pub mod server;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use soilgrids::{
    BoundingBox, Error, Grid, GriddedDataset, PointRequest, RegionRequest, Result, SoilProperties,
    SoilSource,
};

/// Canned replies plus a record of every call made.
pub struct FakeSource {
    pub point_calls: AtomicUsize,
    pub region_calls: AtomicUsize,
    pub last_point: Mutex<Option<(f64, f64)>>,
    pub fail: bool,
    pub empty: bool,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            point_calls: AtomicUsize::new(0),
            region_calls: AtomicUsize::new(0),
            last_point: Mutex::new(None),
            fail: false,
            empty: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::new()
        }
    }

    pub fn point_calls(&self) -> usize {
        self.point_calls.load(Ordering::SeqCst)
    }

    pub fn region_calls(&self) -> usize {
        self.region_calls.load(Ordering::SeqCst)
    }
}

impl SoilSource for FakeSource {
    fn query_point(&self, lon: f64, lat: f64, _request: &PointRequest) -> Result<SoilProperties> {
        self.point_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_point.lock().unwrap() = Some((lon, lat));
        if self.fail {
            return Err(Error::ExternalService {
                url: "fake://rest".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        let layers = if self.empty {
            "[]"
        } else {
            r#"[{"name":"clay","unit_measure":{"d_factor":10,"mapped_units":"g/kg","target_units":"%","uncertainty_unit":""},
                "depths":[{"range":{"top_depth":0,"bottom_depth":5,"unit_depth":"cm"},"label":"0-5cm","values":{"mean":231}}]}]"#
        };
        let body = format!(
            r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{lon},{lat}]}},"properties":{{"layers":{layers}}},"query_time_s":0.1}}"#
        );
        Ok(serde_json::from_str(&body).unwrap())
    }

    fn fetch_region(&self, bbox: &BoundingBox, request: &RegionRequest) -> Result<GriddedDataset> {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::ExternalService {
                url: "fake://wcs".to_string(),
                reason: "connection reset".to_string(),
            });
        }
        let mut ds = GriddedDataset::new(*bbox, 2, 2);
        for property in &request.properties {
            let grid = Grid::new(2, 2, vec![23.1, 24.0, f64::NAN, 22.5])
                .unwrap()
                .with_units(property.target_units())
                .with_long_name(property.long_name());
            ds.insert(property.name(), grid).unwrap();
        }
        Ok(ds)
    }
}
