use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::location::BoundingBox;
use crate::netcdf::write_dataset;
use crate::source::{RegionRequest, SoilSource};
use crate::util::format_bound;

/// Name of the file written for `bbox`; identical boxes give identical names.
pub fn output_file_name(bbox: &BoundingBox) -> String {
    format!(
        "soilgrids_{}_{}_{}_{}.nc",
        format_bound(bbox.xmin),
        format_bound(bbox.xmax),
        format_bound(bbox.ymin),
        format_bound(bbox.ymax)
    )
}

fn prepare_dir(save_path: &Path) -> Result<PathBuf> {
    if save_path.as_os_str().is_empty() {
        return Err(Error::invalid("save_path", "output directory must not be empty"));
    }
    if save_path.exists() && !save_path.is_dir() {
        return Err(Error::invalid(
            "save_path",
            format!("{} exists and is not a directory", save_path.display()),
        ));
    }
    std::fs::create_dir_all(save_path).map_err(|e| {
        Error::invalid(
            "save_path",
            format!("cannot create directory {}: {e}", save_path.display()),
        )
    })?;
    Ok(save_path.to_path_buf())
}

/// Fetches `bbox` from `source` and writes it under `save_path`.
///
/// The file is assembled in a private staging directory next to the target
/// and renamed into place, so a failure at any step leaves the target path
/// untouched.
pub(crate) fn bulk_download<S: SoilSource>(
    source: &S,
    bbox: &BoundingBox,
    save_path: &Path,
    request: &RegionRequest,
) -> Result<PathBuf> {
    let bbox = BoundingBox::new(bbox.xmin, bbox.xmax, bbox.ymin, bbox.ymax)?;
    request.validate()?;
    let dir = prepare_dir(save_path)?;

    // Creating the staging directory doubles as the writability check.
    let staging = tempfile::Builder::new()
        .prefix(".soilgrids-")
        .tempdir_in(&dir)
        .map_err(|e| {
            Error::invalid(
                "save_path",
                format!("{} is not writable: {e}", dir.display()),
            )
        })?;

    let file_name = output_file_name(&bbox);
    let target = dir.join(&file_name);

    info!(
        xmin = bbox.xmin,
        xmax = bbox.xmax,
        ymin = bbox.ymin,
        ymax = bbox.ymax,
        "requesting region"
    );
    let dataset = source.fetch_region(&bbox, request)?;
    if dataset.variables.is_empty() {
        return Err(Error::external(
            "bulk download",
            "soil source returned a dataset without variables",
        ));
    }

    let staged = staging.path().join(&file_name);
    write_dataset(&staged, &dataset)?;
    std::fs::rename(&staged, &target).map_err(|e| Error::io(&target, e))?;
    drop(staging);

    info!(
        path = %target.display(),
        variables = dataset.variables.len(),
        width = dataset.width(),
        height = dataset.height(),
        "wrote region"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_deterministic() {
        let bbox = BoundingBox::new(-3.6, -3.4, 50.6, 50.8).unwrap();
        assert_eq!(
            output_file_name(&bbox),
            "soilgrids_-3.6_-3.4_50.6_50.8.nc"
        );
        let again = BoundingBox::new(-3.6, -3.4, 50.6, 50.8).unwrap();
        assert_eq!(output_file_name(&bbox), output_file_name(&again));

        let nudged = BoundingBox::new(-3.600_000_4, -3.4, 50.6, 50.8).unwrap();
        assert_ne!(output_file_name(&bbox), output_file_name(&nudged));
    }

    #[test]
    fn regular_file_is_not_a_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, b"x").unwrap();
        let err = prepare_dir(&file).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { field: "save_path", .. }));
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        assert_eq!(prepare_dir(&nested).unwrap(), nested);
        assert!(nested.is_dir());
    }
}
