//! HTTP access to the public SoilGrids services: the REST API for point
//! queries and the MapServer WCS for coverages.

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::ClientConfig;
use crate::coverage::{Coverage, GeoTransform, decode_geotiff};
use crate::dataset::{Grid, GriddedDataset, depth_weighted_mean};
use crate::error::{Error, Result, format_api_error};
use crate::location::BoundingBox;
use crate::point::SoilProperties;
use crate::property::{Depth, SoilProperty};
use crate::source::{PointRequest, RegionRequest, SoilSource};
use crate::util::{ows_exception_text, truncate, urljoin};

const EPSG_4326_URI: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";

/// [`SoilSource`] backed by the SoilGrids web services.
#[derive(Debug, Clone)]
pub struct SoilGridsApi {
    rest_url: String,
    wcs_url: String,
    timeout: Duration,
    progress: bool,
    http: HttpClient,
}

impl SoilGridsApi {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("soilgrids-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("soilgrids-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(cfg.timeout);

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::external(&cfg.rest_url, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rest_url: cfg.rest_url.clone(),
            wcs_url: cfg.wcs_url.clone(),
            timeout: cfg.timeout,
            progress: cfg.progress,
            http,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let req = self.http.get(url).query(query).timeout(self.timeout);
        if let Some(built) = req.try_clone().and_then(|r| r.build().ok()) {
            debug!(url = %built.url(), "GET");
        }

        let resp = req.send().map_err(|e| {
            if e.is_timeout() {
                Error::external(url, format!("timed out after {:?}", self.timeout))
            } else {
                Error::external(url, format!("could not connect: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(format_api_error(status, url, &body));
        }
        Ok(resp)
    }

    fn coverage(&self, bbox: &BoundingBox, property: SoilProperty, depth: Depth) -> Result<Coverage> {
        let coverage_id = format!("{}_{}cm_mean", property.name(), depth.label());
        let query = [
            ("map", format!("/map/{}.map", property.name())),
            ("SERVICE", "WCS".to_string()),
            ("VERSION", "2.0.1".to_string()),
            ("REQUEST", "GetCoverage".to_string()),
            ("COVERAGEID", coverage_id.clone()),
            ("FORMAT", "GEOTIFF_INT16".to_string()),
            ("SUBSET", format!("long({},{})", bbox.xmin, bbox.xmax)),
            ("SUBSET", format!("lat({},{})", bbox.ymin, bbox.ymax)),
            ("SUBSETTINGCRS", EPSG_4326_URI.to_string()),
            ("OUTPUTCRS", EPSG_4326_URI.to_string()),
        ];

        let resp = self.get(&self.wcs_url, &query)?;
        let is_xml = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("xml") || ct.starts_with("text/"));
        let bytes = resp
            .bytes()
            .map_err(|e| Error::external(&self.wcs_url, format!("download of {coverage_id} interrupted: {e}")))?;

        // MapServer reports WCS failures as an XML document under HTTP 200.
        if is_xml || bytes.starts_with(b"<") {
            let text = String::from_utf8_lossy(&bytes);
            let reason = ows_exception_text(&text).unwrap_or_else(|| truncate(text.trim(), 300));
            return Err(Error::external(
                &self.wcs_url,
                format!("coverage {coverage_id} rejected: {reason}"),
            ));
        }

        decode_geotiff(&bytes)
            .map_err(|e| Error::external(&self.wcs_url, format!("coverage {coverage_id}: {e}")))
    }

    /// One property reduced to its aggregated layer in target units.
    fn property_layer(
        &self,
        bbox: &BoundingBox,
        property: SoilProperty,
        pb: Option<&ProgressBar>,
    ) -> Result<(Grid, Option<GeoTransform>)> {
        let mut layers = Vec::new();
        let mut transform = None;
        for &(depth, weight) in property.aggregation_depths() {
            if let Some(pb) = pb {
                pb.set_message(format!("{property} {depth}"));
            }
            let coverage = self.coverage(bbox, property, depth)?;
            transform = transform.or(coverage.transform);

            let mut grid = coverage.grid;
            for v in grid.data.iter_mut() {
                *v = property.convert(*v);
            }
            layers.push((grid, weight));
            if let Some(pb) = pb {
                pb.inc(1);
            }
        }

        let grid = match property {
            SoilProperty::Ocs => layers
                .pop()
                .map(|(grid, _)| grid)
                .ok_or_else(|| Error::invalid("properties", "ocs has no depth layer"))?,
            _ => depth_weighted_mean(&layers).map_err(|e| {
                Error::external(&self.wcs_url, format!("inconsistent {property} layers: {e}"))
            })?,
        };

        let grid = grid
            .with_units(property.target_units())
            .with_long_name(format!(
                "{} ({}, depth-weighted mean)",
                property.long_name(),
                property.aggregation_interval()
            ));
        Ok((grid, transform))
    }
}

impl SoilSource for SoilGridsApi {
    fn query_point(&self, lon: f64, lat: f64, request: &PointRequest) -> Result<SoilProperties> {
        let url = urljoin(&self.rest_url, "properties/query");

        let mut query = vec![("lon", lon.to_string()), ("lat", lat.to_string())];
        query.extend(request.properties.iter().map(|p| ("property", p.name().to_string())));
        query.extend(request.depths.iter().map(|d| ("depth", d.to_string())));
        query.extend(request.values.iter().map(|v| ("value", v.clone())));

        let text = self
            .get(&url, &query)?
            .text()
            .map_err(|e| Error::external(&url, format!("failed to read reply: {e}")))?;

        serde_json::from_str::<SoilProperties>(&text).map_err(|e| {
            Error::external(&url, format!("unparseable reply ({e}): {}", truncate(&text, 200)))
        })
    }

    fn fetch_region(&self, bbox: &BoundingBox, request: &RegionRequest) -> Result<GriddedDataset> {
        let total: usize = request
            .properties
            .iter()
            .map(|p| p.aggregation_depths().len())
            .sum();

        let pb = if self.progress {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {wide_bar} {msg} {eta}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut dataset: Option<GriddedDataset> = None;
        for (n, &property) in request.properties.iter().enumerate() {
            info!(
                property = property.name(),
                "processing variable {} of {}",
                n + 1,
                request.properties.len()
            );
            let (grid, transform) = self.property_layer(bbox, property, pb.as_ref())?;
            if grid.valid_count() == 0 {
                warn!(property = property.name(), "layer holds no data inside the box");
            }

            let ds = dataset.get_or_insert_with(|| match transform {
                Some(t) => GriddedDataset::with_geotransform(
                    *bbox, t.x0, t.dx, t.y0, t.dy, grid.width, grid.height,
                ),
                None => GriddedDataset::new(*bbox, grid.width, grid.height),
            });
            ds.insert(property.name(), grid).map_err(|e| {
                Error::external(&self.wcs_url, format!("coverage shape mismatch: {e}"))
            })?;
        }

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        let mut dataset = dataset
            .ok_or_else(|| Error::invalid("properties", "at least one property is required"))?;
        dataset.attributes.insert(
            "title".to_string(),
            "SoilGrids soil properties".to_string(),
        );
        dataset.attributes.insert(
            "source".to_string(),
            format!("ISRIC SoilGrids 2.0 WCS ({})", self.wcs_url),
        );
        dataset.attributes.insert(
            "depth_interval".to_string(),
            "0-60cm depth-weighted mean; ocs 0-30cm".to_string(),
        );
        Ok(dataset)
    }
}
