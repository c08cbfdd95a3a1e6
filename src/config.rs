use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use h3o::Resolution;
use serde::{Deserialize, Serialize};

use crate::census::SexRatio;

/// Inclusive range of administrative (department) codes that belong to the target city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeRange {
    pub min: f64,
    pub max: f64,
}

impl CodeRange {
    #[inline] pub fn contains(&self, code: f64) -> bool { code >= self.min && code <= self.max }
}

impl Default for CodeRange {
    /// Department codes of the City of Buenos Aires.
    fn default() -> Self { Self { min: 2000.0, max: 5999.0 } }
}

/// Column names of the raw trip-leg table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TripColumns {
    pub card_id: String,
    pub expansion_factor: String,
    pub age: String,
    pub gender: String,
    pub origin_lat: String,
    pub origin_lon: String,
    pub destination_lat: String,
    pub destination_lon: String,
    pub origin_code: String,
    pub destination_code: String,
}

impl Default for TripColumns {
    fn default() -> Self {
        Self {
            card_id: "id_tarjeta".into(),
            expansion_factor: "factor_expansion_viaje".into(),
            age: "grupo_edad".into(),
            gender: "genero".into(),
            origin_lat: "latitud_origen_viaje".into(),
            origin_lon: "longitud_origen_viaje".into(),
            destination_lat: "latitud_destino_viaje".into(),
            destination_lon: "longitud_destino_viaje".into(),
            origin_code: "departamento_origen_viaje".into(),
            destination_code: "departamento_destino_viaje".into(),
        }
    }
}

/// Column names of the census tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusColumns {
    /// Polygon identifier, shared by the geometry layer and the age table.
    pub radio_id: String,
    /// WKB geometry column of the geometry layer.
    pub geometry: String,
    /// Age bracket label column of the age table.
    pub age_bracket: String,
    /// Head count column of the age table.
    pub count: String,
}

impl Default for CensusColumns {
    fn default() -> Self {
        Self {
            radio_id: "cod_indec".into(),
            geometry: "geometry".into(),
            age_bracket: "tramo_edad".into(),
            count: "total_conteo".into(),
        }
    }
}

/// Explicit configuration for a reach run. Every stage receives what it needs from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachConfig {
    /// Resolution of the output grid.
    pub resolution: u8,
    /// Resolution used to locate trip endpoints before rolling up to `resolution`.
    pub fine_resolution: u8,
    /// Hex-grid distance of the neighborhood expansion.
    pub ring_radius: u32,
    /// Administrative code range that counts as "inside the city".
    pub city_codes: CodeRange,

    /// City boundary (GeoJSON).
    pub boundary_path: PathBuf,
    /// Census polygons (Parquet with WKB geometry).
    pub census_geometry_path: PathBuf,
    /// Census head counts per polygon and age bracket (Parquet or CSV).
    pub census_ages_path: PathBuf,
    /// Directory where downloaded source files are cached.
    pub external_dir: PathBuf,
    /// Trip-leg table (CSV). Relative names are resolved inside `external_dir`.
    pub trips_path: PathBuf,
    /// Source of the trip-leg table, fetched when `trips_path` does not exist.
    pub trips_url: Option<String>,
    /// Final reach table (Parquet).
    pub output_path: PathBuf,

    /// PROJ.4 definition of the equal-area CRS used to measure areas.
    /// Defaults to a Lambert azimuthal equal-area projection centered on the data.
    pub equal_area_proj: Option<String>,
    /// Women per 100 men for each age bracket; defaults to the built-in census table.
    pub sex_ratios: Option<Vec<SexRatio>>,

    pub census_columns: CensusColumns,
    pub trip_columns: TripColumns,
}

impl Default for ReachConfig {
    fn default() -> Self { Self::with_data_dir(Path::new("data")) }
}

impl ReachConfig {
    /// Default layout rooted at a data directory (`external/`, `processed/`).
    pub fn with_data_dir(data_dir: &Path) -> Self {
        let external_dir = data_dir.join("external");
        let processed_dir = data_dir.join("processed");
        Self {
            resolution: 9,
            fine_resolution: 10,
            ring_radius: 1,
            city_codes: CodeRange::default(),
            boundary_path: external_dir.join("caba_boundary.geojson"),
            census_geometry_path: external_dir.join("radios_censales.parquet"),
            census_ages_path: external_dir.join("censo_edades.parquet"),
            trips_path: PathBuf::from("viajes_BAdata_20241016.csv"),
            trips_url: Some("https://cdn.buenosaires.gob.ar/datosabiertos/datasets/transporte-y-obras-publicas/viajes-etapas-transporte-publico/viajes_BAdata_20241016.csv".into()),
            external_dir,
            output_path: processed_dir.join("population_reach_h3.parquet"),
            equal_area_proj: None,
            sex_ratios: None,
            census_columns: CensusColumns::default(),
            trip_columns: TripColumns::default(),
        }
    }

    /// Load a configuration from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("[config] Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("[config] Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check resolutions and ranges before any stage runs.
    pub fn validate(&self) -> Result<()> {
        self.grid_resolution()?;
        self.endpoint_resolution()?;
        ensure!(
            self.fine_resolution >= self.resolution,
            "[config] fine_resolution ({}) must not be coarser than resolution ({})",
            self.fine_resolution, self.resolution
        );
        ensure!(
            self.city_codes.min <= self.city_codes.max,
            "[config] empty city code range: {:?}", self.city_codes
        );
        Ok(())
    }

    /// Output grid resolution.
    pub fn grid_resolution(&self) -> Result<Resolution> {
        Resolution::try_from(self.resolution)
            .with_context(|| format!("[config] invalid grid resolution: {}", self.resolution))
    }

    /// Resolution at which trip endpoints are first located.
    pub fn endpoint_resolution(&self) -> Result<Resolution> {
        Resolution::try_from(self.fine_resolution)
            .with_context(|| format!("[config] invalid fine resolution: {}", self.fine_resolution))
    }

    /// Location of the trip-leg table, resolving relative names inside the cache directory.
    pub fn trips_file(&self) -> PathBuf {
        if self.trips_path.is_absolute() || self.trips_path.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
            self.trips_path.clone()
        } else {
            self.external_dir.join(&self.trips_path)
        }
    }
}
