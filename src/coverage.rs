//! Decoding of WCS `GetCoverage` GeoTIFF replies.

use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::dataset::Grid;

/// Value SoilGrids uses for cells without a prediction in its int16 coverages.
pub(crate) const SOILGRIDS_NODATA: f64 = -32768.0;

/// North-west corner and cell size of a raster, in CRS units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GeoTransform {
    pub(crate) x0: f64,
    pub(crate) y0: f64,
    pub(crate) dx: f64,
    pub(crate) dy: f64,
}

#[derive(Debug)]
pub(crate) struct Coverage {
    /// Mapped values with nodata already replaced by `NaN`.
    pub(crate) grid: Grid,
    pub(crate) transform: Option<GeoTransform>,
}

/// Decodes a single-band GeoTIFF held in memory.
pub(crate) fn decode_geotiff(bytes: &[u8]) -> Result<Coverage, String> {
    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| format!("not a GeoTIFF: {e}"))?;

    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;
    decoder = decoder.with_limits(limits);

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| format!("missing raster dimensions: {e}"))?;

    let transform = read_geotransform(&mut decoder);
    let nodata = read_nodata(&mut decoder).unwrap_or(SOILGRIDS_NODATA);

    let image = decoder
        .read_image()
        .map_err(|e| format!("failed to decode raster: {e}"))?;

    let grid = to_grid(width as usize, height as usize, image, nodata)?;
    Ok(Coverage { grid, transform })
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    if tiepoint.len() < 6 || scale.len() < 2 {
        return None;
    }
    // tie point [i, j, k, x, y, z] maps raster (i, j) to model (x, y)
    let (dx, dy) = (scale[0], scale[1]);
    Some(GeoTransform {
        x0: tiepoint[3] - tiepoint[0] * dx,
        y0: tiepoint[4] + tiepoint[1] * dy,
        dx,
        dy,
    })
}

fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse().ok())
}

pub(crate) fn to_grid(
    width: usize,
    height: usize,
    image: DecodingResult,
    nodata: f64,
) -> Result<Grid, String> {
    let values: Vec<f64> = match image {
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
    };

    if values.len() != width * height {
        return Err(format!(
            "raster holds {} sample(s), expected {}x{} single band",
            values.len(),
            width,
            height
        ));
    }

    let data = values
        .into_iter()
        .map(|v| if v == nodata || v.is_nan() { f64::NAN } else { v })
        .collect();
    Grid::new(width, height, data).map_err(|e| e.to_string())
}
