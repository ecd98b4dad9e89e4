/// Read queries against the measurement table.
///
/// Every function takes a borrowed connection and returns owned rows; the
/// caller decides how long the connection lives. Date bounds are bound as
/// text and compared by the storage engine as strings, which matches
/// chronological order for `YYYY-MM-DD` values. Malformed bounds are not
/// rejected here: they simply match whatever the string comparison matches,
/// usually nothing.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ApiError, Result};
use crate::model::DailyTemperature;

/// Length of the "last 12 months" window. 366 rather than 365 so a window
/// spanning February 29th still reaches back a full calendar year.
pub const WINDOW_DAYS: i64 = 366;

/// Storage format of a timestamp bound, matching the engine's datetime text.
const CUTOFF_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// ---------------------------------------------------------------------------
// Window anchor
// ---------------------------------------------------------------------------

/// The most recent date present in `measurement`, or `None` if it is empty.
pub fn latest_date(conn: &Connection) -> Result<Option<String>> {
    let latest = conn
        .query_row(
            "SELECT date FROM measurement ORDER BY date DESC LIMIT 1",
            [],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?;

    Ok(latest.flatten())
}

/// Start of the trailing window ending at `latest`: midnight `WINDOW_DAYS`
/// days earlier.
///
/// The bound is a timestamp, and a bare `YYYY-MM-DD` sorts before its own
/// midnight timestamp, so rows dated on the cutoff day fall outside the
/// window. For a latest date of 2017-08-23 the cutoff is
/// `2016-08-22 00:00:00.000000` and the first row kept is from 2016-08-23.
pub fn window_cutoff(latest: &str) -> Result<NaiveDateTime> {
    let anchor = NaiveDate::parse_from_str(latest, "%Y-%m-%d").map_err(|source| {
        ApiError::AnchorDate {
            date: latest.to_string(),
            source,
        }
    })?;

    Ok(anchor.and_time(NaiveTime::MIN) - Duration::days(WINDOW_DAYS))
}

fn cutoff_text(cutoff: NaiveDateTime) -> String {
    cutoff.format(CUTOFF_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Windowed scans
// ---------------------------------------------------------------------------

/// `(date, prcp)` for every row on or after `cutoff`, in storage order.
pub fn precipitation_since(
    conn: &Connection,
    cutoff: NaiveDateTime,
) -> Result<Vec<(String, Option<f64>)>> {
    let mut stmt = conn.prepare(
        "SELECT date, prcp
         FROM measurement
         WHERE date >= ?1
         ORDER BY rowid",
    )?;

    let rows = stmt
        .query_map(params![cutoff_text(cutoff)], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// `(date, tobs)` for every row on or after `cutoff`, in storage order.
pub fn temperature_since(conn: &Connection, cutoff: NaiveDateTime) -> Result<Vec<(String, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT date, tobs
         FROM measurement
         WHERE date >= ?1
         ORDER BY rowid",
    )?;

    let rows = stmt
        .query_map(params![cutoff_text(cutoff)], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// Every distinct station identifier that has at least one measurement.
pub fn station_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT station
         FROM measurement
         GROUP BY station",
    )?;

    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ids)
}

// ---------------------------------------------------------------------------
// Range aggregate
// ---------------------------------------------------------------------------

/// Per-date min/avg/max temperature for `start <= date`, and `date <= end`
/// when an end is given. Dates without observations are absent.
pub fn temperature_summary(
    conn: &Connection,
    start: &str,
    end: Option<&str>,
) -> Result<Vec<DailyTemperature>> {
    let rows = match end {
        Some(end) => {
            let mut stmt = conn.prepare(
                "SELECT date, MIN(tobs), AVG(tobs), MAX(tobs)
                 FROM measurement
                 WHERE date >= ?1 AND date <= ?2
                 GROUP BY date
                 ORDER BY date",
            )?;
            let rows = stmt
                .query_map(params![start, end], daily_temperature)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT date, MIN(tobs), AVG(tobs), MAX(tobs)
                 FROM measurement
                 WHERE date >= ?1
                 GROUP BY date
                 ORDER BY date",
            )?;
            let rows = stmt
                .query_map(params![start], daily_temperature)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(rows)
}

fn daily_temperature(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyTemperature> {
    Ok(DailyTemperature(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
