// File-based runs: GeoJSON boundary, Parquet census layer with WKB geometry, CSV ages and trips,
// Parquet output.

use std::{fs::File, io::Write, path::Path};

use geo::{BooleanOps, MultiPolygon};
use h3o::{CellIndex, LatLng, Resolution};
use hexreach::{
    grid::cell_polygon,
    io::{read_table, write_geojson},
    HexGrid, ReachConfig,
};
use polars::prelude::{Column, DataFrame, NamedFrom, ParquetWriter, Series};

/// Little-endian WKB for a multi-polygon without holes.
fn wkb(shape: &MultiPolygon<f64>) -> Vec<u8> {
    let mut out = vec![1u8];
    out.extend(6u32.to_le_bytes());
    out.extend((shape.0.len() as u32).to_le_bytes());
    for polygon in &shape.0 {
        out.push(1);
        out.extend(3u32.to_le_bytes());
        out.extend(1u32.to_le_bytes());
        out.extend((polygon.exterior().0.len() as u32).to_le_bytes());
        for c in &polygon.exterior().0 {
            out.extend(c.x.to_le_bytes());
            out.extend(c.y.to_le_bytes());
        }
    }
    out
}

fn cells() -> Vec<CellIndex> {
    let center = LatLng::new(-34.6037, -58.3816).unwrap().to_cell(Resolution::Nine);
    let mut cells = vec![center];
    cells.extend(center.grid_disk::<Vec<_>>(1).into_iter().filter(|&c| c != center));
    cells
}

fn write_lines(path: &Path, lines: &[String]) {
    let mut file = File::create(path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

/// Lay out a small data directory and return its configuration.
fn fixture(root: &Path) -> ReachConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = ReachConfig {
        trips_url: None,
        ..ReachConfig::with_data_dir(root)
    };
    std::fs::create_dir_all(&config.external_dir).unwrap();
    let cells = cells();

    let grid = HexGrid::from_indices(Resolution::Nine, cells.iter().copied()).unwrap();
    write_geojson(&grid.to_geojson(), &config.boundary_path).unwrap();

    let radio = cells[..2].iter()
        .map(|&cell| MultiPolygon::new(vec![cell_polygon(cell)]))
        .reduce(|a, b| a.union(&b))
        .unwrap();
    let blob = wkb(&radio);
    let mut census = DataFrame::new(vec![
        Column::new("cod_indec".into(), &["020010101"]),
        Series::new("geometry".into(), vec![Some(blob.as_slice())]).into(),
        Column::new("pob_tot_p".into(), &[100i64]),
    ]).unwrap();
    ParquetWriter::new(File::create(&config.census_geometry_path).unwrap())
        .finish(&mut census)
        .unwrap();

    let ages_path = config.external_dir.join("censo_edades.csv");
    write_lines(&ages_path, &[
        "cod_indec,tramo_edad,total_conteo".into(),
        "020010101,20 A 24,100".into(),
        "020010101,Total,100".into(),
    ]);

    let destination = LatLng::from(cells[3]);
    write_lines(&config.trips_file(), &[
        "id_tarjeta,factor_expansion_viaje,grupo_edad,genero,latitud_origen_viaje,longitud_origen_viaje,latitud_destino_viaje,longitud_destino_viaje,departamento_origen_viaje,departamento_destino_viaje".into(),
        format!("7,1.0,21,M,-34.70,-58.60,{},{},6412,2001", destination.lat(), destination.lng()),
        format!("7,1.0,21,M,-34.70,-58.60,{},{},6412,2001", destination.lat(), destination.lng()),
    ]);

    ReachConfig { census_ages_path: ages_path, ..config }
}

#[test]
fn run_writes_the_reach_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());

    let summary = hexreach::run(&config).unwrap();
    assert_eq!(summary.output.as_deref(), Some(config.output_path.as_path()));
    assert_eq!(summary.totals.total_residents, 100);
    assert_eq!(summary.totals.total_circulating, 1);
    assert_eq!(summary.unmatched_age_rows, 1);

    let df = read_table(&config.output_path).unwrap();
    assert_eq!(df.width(), 22);
    for name in ["h3_index", "tramo_edad", "total_residentes", "otros_circulante", "total_reach", "total_reach_1ring"] {
        assert!(df.column(name).is_ok(), "missing column {name}");
    }
    let total = df.column("total_reach").unwrap().i64().unwrap().into_no_null_iter().sum::<i64>();
    assert_eq!(total, 101);
}

#[test]
fn missing_boundary_fails_without_writing_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    std::fs::remove_file(&config.boundary_path).unwrap();

    assert!(hexreach::run(&config).is_err());
    assert!(!config.output_path.exists());
}

#[test]
fn missing_trip_table_is_an_error_without_a_source_url() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    std::fs::remove_file(config.trips_file()).unwrap();

    let err = hexreach::run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("Trip table not found"));
    assert!(!config.output_path.exists());
}
