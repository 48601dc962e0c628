use anyhow::Result;
use soilgrids::{Client, Location, LocationParams};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Configure endpoints via env vars or a `.soilgridsrc` file.
    let client = Client::from_env()?;

    let exeter = Location::coordinate(-3.53, 50.72)?;
    let props = client.point_query(&exeter)?;
    for layer in props.layers() {
        let topsoil = layer.converted("0-5cm", "mean");
        println!(
            "{:<9} {:>8} {}",
            layer.name,
            topsoil.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into()),
            layer.unit_measure.target_units
        );
    }

    // The same query keyed by an Ordnance Survey grid reference.
    let params: LocationParams = serde_json::from_str(r#"{"OS_code": "SX 925 925"}"#)?;
    let props = client.point_query_params(&params)?;
    println!("SX 925 925 -> {:?}", props.lon_lat());
    Ok(())
}
