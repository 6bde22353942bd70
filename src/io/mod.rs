//! Artifact boundary: GeoJSON input, CSV/JSON/GeoJSON output, publishing.

pub mod export;
pub mod geojson;
pub mod publish;
