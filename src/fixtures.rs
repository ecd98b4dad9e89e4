/// Test fixtures: small climate data files on disk.
///
/// The sample set is a slice of the Honolulu station data, trimmed to the
/// rows that exercise window boundaries, duplicate dates, and a missing
/// precipitation value. The latest stored date is 2017-08-23.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tempfile::TempDir;

use crate::model::{Measurement, Station};

pub const STATION_DDL: &str = "CREATE TABLE station (
    id INTEGER NOT NULL PRIMARY KEY,
    station TEXT,
    name TEXT,
    latitude FLOAT,
    longitude FLOAT,
    elevation FLOAT
)";

pub const MEASUREMENT_DDL: &str = "CREATE TABLE measurement (
    id INTEGER NOT NULL PRIMARY KEY,
    station TEXT,
    date TEXT,
    prcp FLOAT,
    tobs FLOAT
)";

pub fn sample_stations() -> Vec<Station> {
    vec![
        station(1, "USC00519397", "WAIKIKI 717.2, HI US", 21.2716, -157.8168, 3.0),
        station(2, "USC00513117", "KANEOHE 838.1, HI US", 21.4234, -157.8015, 14.6),
        station(3, "USC00519281", "WAIHEE 837.5, HI US", 21.45167, -157.84889, 32.9),
    ]
}

pub fn sample_measurements() -> Vec<Measurement> {
    vec![
        measurement(1, "USC00519397", "2016-08-21", Some(0.10), 80.0),
        measurement(2, "USC00519397", "2016-08-22", Some(0.08), 79.0),
        measurement(3, "USC00519397", "2016-08-23", Some(0.00), 81.0),
        measurement(4, "USC00513117", "2016-08-23", Some(0.15), 76.0),
        measurement(5, "USC00519397", "2017-01-01", Some(0.00), 62.0),
        measurement(6, "USC00513117", "2017-01-01", None, 70.0),
        measurement(7, "USC00519281", "2017-01-01", Some(0.29), 77.0),
        measurement(8, "USC00519397", "2017-01-02", Some(0.00), 66.0),
        measurement(9, "USC00519281", "2017-08-23", Some(0.45), 82.0),
        measurement(10, "USC00519397", "2017-08-23", Some(0.00), 81.0),
    ]
}

pub fn station(id: i64, code: &str, name: &str, latitude: f64, longitude: f64, elevation: f64) -> Station {
    Station {
        id,
        station: code.to_string(),
        name: name.to_string(),
        latitude,
        longitude,
        elevation,
    }
}

pub fn measurement(id: i64, station: &str, date: &str, prcp: Option<f64>, tobs: f64) -> Measurement {
    Measurement {
        id,
        station: station.to_string(),
        date: date.to_string(),
        prcp,
        tobs,
    }
}

/// Writes both tables with the given rows to `path`.
pub fn write_database(path: &Path, stations: &[Station], measurements: &[Measurement]) {
    let conn = Connection::open(path).expect("fixture database should open");
    conn.execute(STATION_DDL, []).expect("station table should be created");
    conn.execute(MEASUREMENT_DDL, []).expect("measurement table should be created");

    for s in stations {
        conn.execute(
            "INSERT INTO station (id, station, name, latitude, longitude, elevation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![s.id, s.station, s.name, s.latitude, s.longitude, s.elevation],
        )
        .expect("station row should insert");
    }

    for m in measurements {
        conn.execute(
            "INSERT INTO measurement (id, station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![m.id, m.station, m.date, m.prcp, m.tobs],
        )
        .expect("measurement row should insert");
    }
}

/// Creates a temporary data file holding the sample rows.
///
/// Keep the returned `TempDir` alive for as long as the path is used.
pub fn sample_database() -> (TempDir, PathBuf) {
    database_with(&sample_stations(), &sample_measurements())
}

pub fn database_with(stations: &[Station], measurements: &[Measurement]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join("climate.sqlite");
    write_database(&path, stations, measurements);
    (dir, path)
}
