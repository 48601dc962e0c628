use anyhow::Result;
use soilgrids::{BoundingBox, Client, RegionRequest, SoilProperty};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = Client::from_env()?;
    let out = std::env::temp_dir().join("soilgrids");

    // Texture only; `client.bulk_download(..)` fetches all eleven properties.
    let bbox = BoundingBox::new(-3.6, -3.4, 50.6, 50.8)?;
    let request = RegionRequest::default().with_properties([
        SoilProperty::Clay,
        SoilProperty::Sand,
        SoilProperty::Silt,
    ]);
    let path = client.bulk_download_with(&bbox, &out, &request)?;

    let ds = soilgrids::netcdf::read_dataset(&path)?;
    println!(
        "{}: {}x{} cells, variables {:?}",
        path.display(),
        ds.width(),
        ds.height(),
        ds.variables.keys().collect::<Vec<_>>()
    );
    Ok(())
}
