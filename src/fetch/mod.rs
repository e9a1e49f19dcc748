// src/fetch/mod.rs

pub mod csv;
pub mod parquet;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;
use url::Url;

/// Trip parquet source. Fixed, not configurable.
pub static TRIP_DATA_URL: &str =
    "https://d37ci6vzurychx.cloudfront.net/trip-data/green_tripdata_2025-11.parquet";

/// Zone lookup CSV source. Fixed, not configurable.
pub static ZONE_LOOKUP_URL: &str =
    "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/misc/taxi_zone_lookup.csv";

/// Download `url_str` and return the full body. The payload is held
/// entirely in memory; both sources are decoded from the buffered bytes.
pub async fn download(client: &Client, url_str: &str) -> Result<Bytes> {
    let url = Url::parse(url_str).with_context(|| format!("parsing URL {}", url_str))?;

    let resp = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("fetching {}", url))?;

    resp.bytes()
        .await
        .with_context(|| format!("reading body from {}", url))
}
