/// Data file connection and schema validation utilities
///
/// The climate data file is opened read-only. Startup validation checks that
/// both tables the service reads exist with the expected columns, so a wrong
/// or truncated file stops the process before it starts listening.

use crate::model::{Measurement, Station, Table};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Data file connection or schema validation error
#[derive(Debug)]
pub enum DbError {
    /// Data file does not exist
    MissingDataFile(PathBuf),
    /// Opening or querying the data file failed
    ConnectionFailed(rusqlite::Error),
    /// Required table missing
    MissingTable(String),
    /// Required column missing from an existing table
    MissingColumn { table: String, column: String },
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::MissingDataFile(path) => {
                write!(f, "Climate data file not found: {}\n\n", path.display())?;
                write!(f, "  Point the service at the SQLite file with one of:\n")?;
                write!(f, "  - --database <PATH> on the command line\n")?;
                write!(f, "  - DATABASE_PATH=<PATH> in the environment or .env\n")?;
                write!(f, "  - database_path = \"<PATH>\" in climate_api.toml")
            }
            DbError::ConnectionFailed(e) => {
                write!(f, "Failed to read climate data file.\n\n")?;
                write!(f, "  Error: {}\n\n", e)?;
                write!(f, "  Common causes:\n")?;
                write!(f, "  - The file is not a SQLite database\n")?;
                write!(f, "  - The file is not readable by the service user")
            }
            DbError::MissingTable(table) => {
                write!(f, "Required table '{}' does not exist in the climate data file.\n\n", table)?;
                write!(f, "  Expected tables: {}, {}", Station::NAME, Measurement::NAME)
            }
            DbError::MissingColumn { table, column } => {
                write!(f, "Table '{}' is missing required column '{}'.\n\n", table, column)?;
                write!(f, "  The service reads these columns from '{}': {}", table, expected_columns(table))
            }
        }
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DbError::ConnectionFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        DbError::ConnectionFailed(e)
    }
}

fn expected_columns(table: &str) -> String {
    let columns = if table == Station::NAME {
        Station::COLUMNS
    } else {
        Measurement::COLUMNS
    };
    columns.join(", ")
}

/// Open a read-only connection to the data file.
///
/// Handlers call this once per request and drop the connection when the
/// response is built.
pub fn open_read_only(path: &Path) -> Result<Connection, DbError> {
    if !path.exists() {
        return Err(DbError::MissingDataFile(path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    Ok(conn)
}

/// Verify a table exists and carries every column its record type reads
pub fn verify_table<T: Table>(conn: &Connection) -> Result<(), DbError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([T::NAME], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    // pragma_table_info yields nothing for an unknown table
    if columns.is_empty() {
        return Err(DbError::MissingTable(T::NAME.to_string()));
    }

    for expected in T::COLUMNS {
        if !columns.iter().any(|c| c.eq_ignore_ascii_case(expected)) {
            return Err(DbError::MissingColumn {
                table: T::NAME.to_string(),
                column: expected.to_string(),
            });
        }
    }

    Ok(())
}

/// Open the data file and validate both tables
pub fn connect_and_verify(path: &Path) -> Result<Connection, DbError> {
    let conn = open_read_only(path)?;

    verify_table::<Station>(&conn)?;
    verify_table::<Measurement>(&conn)?;

    Ok(conn)
}

/// Load every station row, ordered by id
pub fn load_stations(conn: &Connection) -> Result<Vec<Station>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, station, name, latitude, longitude, elevation
         FROM station
         ORDER BY id",
    )?;

    let stations = stmt
        .query_map([], |row| {
            Ok(Station {
                id: row.get(0)?,
                station: row.get(1)?,
                name: row.get(2)?,
                latitude: row.get(3)?,
                longitude: row.get(4)?,
                elevation: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(stations)
}

/// Station identifiers referenced by measurements but absent from `station`.
///
/// The data source is expected to keep these in sync; the service only
/// reports the drift.
pub fn orphan_station_ids(conn: &Connection) -> Result<Vec<String>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT station
         FROM measurement
         WHERE station NOT IN (SELECT station FROM station WHERE station IS NOT NULL)
         ORDER BY station",
    )?;

    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids)
}
