/// Core data types for the climate observation API.
///
/// Record shapes mirror the two tables of the climate data file. They are
/// declared here rather than discovered at runtime, so a schema change shows
/// up as a startup failure in `db::verify_table` instead of a missing field
/// deep inside a handler.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Table descriptions
// ---------------------------------------------------------------------------

/// A persisted table backing one of the record types.
pub trait Table {
    /// Table name in the data file.
    const NAME: &'static str;
    /// Columns the service reads. Extra columns in the data file are ignored.
    const COLUMNS: &'static [&'static str];
}

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Weather station metadata. Reference data, never written by this service.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: i64,
    /// Station identifier, e.g. "USC00519397".
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl Table for Station {
    const NAME: &'static str = "station";
    const COLUMNS: &'static [&'static str] =
        &["id", "station", "name", "latitude", "longitude", "elevation"];
}

/// A single daily observation for one station.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: i64,
    pub station: String,
    pub date: String,       // "YYYY-MM-DD"
    pub prcp: Option<f64>,  // inches, missing on some days
    pub tobs: f64,          // observed temperature, °F
}

impl Table for Measurement {
    const NAME: &'static str = "measurement";
    const COLUMNS: &'static [&'static str] = &["id", "station", "date", "prcp", "tobs"];
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// Min/avg/max of the temperature observations recorded on one date.
///
/// Serializes as a `[date, min, avg, max]` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTemperature(pub String, pub f64, pub f64, pub f64);

impl DailyTemperature {
    pub fn date(&self) -> &str {
        &self.0
    }

    pub fn min(&self) -> f64 {
        self.1
    }

    pub fn avg(&self) -> f64 {
        self.2
    }

    pub fn max(&self) -> f64 {
        self.3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_temperature_serializes_as_array() {
        let row = DailyTemperature("2017-01-01".to_string(), 62.0, 69.5, 77.0);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!(["2017-01-01", 62.0, 69.5, 77.0]));
    }

    #[test]
    fn test_table_columns_include_keys() {
        assert!(Station::COLUMNS.contains(&"station"));
        assert!(Measurement::COLUMNS.contains(&"date"));
        assert!(Measurement::COLUMNS.contains(&"tobs"));
    }
}
