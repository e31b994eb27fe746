//! Delimited-text input parsing.
//!
//! The dataset arrives as raw delimited text (TAB by default, CR-LF or LF
//! line endings), rows `id, year, month, day, x, y, value`. Rows with an
//! empty id or the literal header id `"id"` are skipped, as are rows that
//! fail to parse; parsing is permissive by contract, a malformed row is
//! logged and dropped rather than failing the job. A repeated id appends
//! a measurement to the existing point, so a point's series keeps the
//! input's (chronological) order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::time::TimeDomain;
use crate::{Location, Measurement, SensorPoint};

/// Parse dataset text into the point table, annotating each measurement
/// with its normalized time ordinate under `domain`.
pub fn parse_dataset(
    text: &str,
    delimiter: char,
    domain: TimeDomain,
) -> HashMap<String, SensorPoint> {
    // id -> (x, y, series); series stay mutable until the whole text is
    // consumed, then freeze behind Arc.
    let mut building: HashMap<String, (f64, f64, Vec<Measurement>)> = HashMap::new();

    for line in text.lines() {
        let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        let id = match fields.first() {
            Some(id) if !id.is_empty() && !id.eq_ignore_ascii_case("id") => *id,
            _ => continue,
        };
        if fields.len() < 7 {
            log::warn!("Skipping short dataset row for id '{}'", id);
            continue;
        }

        let parsed = (
            fields[1].parse::<i32>(),
            fields[2].parse::<u32>(),
            fields[3].parse::<u32>(),
            fields[4].parse::<f64>(),
            fields[5].parse::<f64>(),
            fields[6].parse::<f64>(),
        );
        let (year, month, day, x, y, value) = match parsed {
            // NaN/inf parse successfully as f64 but poison distances and
            // weights downstream; treat them as malformed.
            (Ok(year), Ok(month), Ok(day), Ok(x), Ok(y), Ok(value))
                if (1..=12).contains(&month)
                    && (1..=31).contains(&day)
                    && x.is_finite()
                    && y.is_finite()
                    && value.is_finite() =>
            {
                (year, month, day, x, y, value)
            }
            _ => {
                log::warn!("Skipping malformed dataset row: '{}'", line);
                continue;
            }
        };

        let measurement = Measurement {
            value,
            year,
            month,
            day,
            normalized: domain.normalize(year, month, day),
        };

        let entry = building
            .entry(id.to_string())
            .or_insert_with(|| (x, y, Vec::new()));
        // Input is assumed chronological per point; the ordinate sequence
        // must be non-decreasing for span checks to be meaningful.
        debug_assert!(
            entry.2.last().map_or(true, |m| m.normalized <= measurement.normalized),
            "out-of-order measurement for point '{}'",
            id
        );
        entry.2.push(measurement);
    }

    building
        .into_iter()
        .map(|(id, (x, y, measurements))| {
            let point = SensorPoint {
                id: id.clone(),
                x,
                y,
                measurements: Arc::new(measurements),
            };
            (id, point)
        })
        .collect()
}

/// Parse locations text, rows `id, x, y`, same skipping rules as the
/// dataset parser.
pub fn parse_locations(text: &str, delimiter: char) -> Vec<Location> {
    let mut locations = Vec::new();
    for line in text.lines() {
        let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        let id = match fields.first() {
            Some(id) if !id.is_empty() && !id.eq_ignore_ascii_case("id") => *id,
            _ => continue,
        };
        if fields.len() < 3 {
            log::warn!("Skipping short locations row for id '{}'", id);
            continue;
        }
        match (fields[1].parse::<f64>(), fields[2].parse::<f64>()) {
            (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => locations.push(Location {
                id: id.to_string(),
                x,
                y,
            }),
            _ => log::warn!("Skipping malformed locations row: '{}'", line),
        }
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = "id\tyear\tmonth\tday\tx\ty\tvalue\r\n\
                           s1\t2009\t1\t1\t-85.0\t30.0\t10.5\r\n\
                           s1\t2009\t6\t15\t-85.0\t30.0\t12.0\r\n\
                           s2\t2009\t1\t1\t-120.0\t42.0\t8.25\r\n\
                           \r\n\
                           bogus\trow\twith\ttext\tin\tnumeric\tfields\r\n";

    #[test]
    fn test_parse_dataset_groups_by_id() {
        let points = parse_dataset(DATASET, '\t', TimeDomain::YearMonthDay);
        assert_eq!(points.len(), 2);

        let s1 = &points["s1"];
        assert_eq!(s1.x, -85.0);
        assert_eq!(s1.y, 30.0);
        assert_eq!(s1.measurements.len(), 2);
        assert_eq!(s1.measurements[0].value, 10.5);
        assert_eq!(s1.measurements[1].month, 6);

        let s2 = &points["s2"];
        assert_eq!(s2.measurements.len(), 1);
        assert_eq!(s2.measurements[0].value, 8.25);
    }

    #[test]
    fn test_parse_dataset_annotates_normalized_ordinate() {
        let points = parse_dataset(DATASET, '\t', TimeDomain::YearMonthDay);
        let s1 = &points["s1"];
        let expected = TimeDomain::YearMonthDay.normalize(2009, 1, 1);
        assert_eq!(s1.measurements[0].normalized, expected);
        assert!(s1.measurements[0].normalized < s1.measurements[1].normalized);
    }

    #[test]
    fn test_parse_dataset_skips_header_blank_and_malformed() {
        let points = parse_dataset(DATASET, '\t', TimeDomain::YearMonthDay);
        assert!(!points.contains_key("id"));
        assert!(!points.contains_key("bogus"));
        assert!(!points.contains_key(""));
    }

    #[test]
    fn test_parse_dataset_rejects_out_of_range_calendar_fields() {
        let text = "s1\t2009\t13\t1\t0.0\t0.0\t1.0\n\
                    s1\t2009\t1\t32\t0.0\t0.0\t1.0\n\
                    s1\t2009\t2\t28\t0.0\t0.0\t1.0\n";
        let points = parse_dataset(text, '\t', TimeDomain::YearMonthDay);
        assert_eq!(points["s1"].measurements.len(), 1);
        assert_eq!(points["s1"].measurements[0].day, 28);
    }

    #[test]
    fn test_parse_dataset_rejects_non_finite_fields() {
        // "NaN" and "inf" parse as f64 but would poison distances and
        // weights; they must be dropped like any other malformed row.
        let text = "s1\t2009\t1\t1\tNaN\t0.0\t1.0\n\
                    s1\t2009\t2\t1\t0.0\tinf\t1.0\n\
                    s1\t2009\t3\t1\t0.0\t0.0\tNaN\n\
                    s1\t2009\t4\t1\t0.0\t0.0\t7.0\n";
        let points = parse_dataset(text, '\t', TimeDomain::YearMonthDay);
        assert_eq!(points["s1"].measurements.len(), 1);
        assert_eq!(points["s1"].measurements[0].value, 7.0);
    }

    #[test]
    fn test_parse_locations_rejects_non_finite_coordinates() {
        let text = "A\tNaN\t0.0\r\nB\t0.0\t-inf\r\nC\t1.0\t2.0\r\n";
        let locations = parse_locations(text, '\t');
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].id, "C");
    }

    #[test]
    fn test_parse_dataset_lf_and_comma_delimiter() {
        let text = "s1,2009,1,1,0.0,0.0,5.0\ns1,2009,2,1,0.0,0.0,6.0\n";
        let points = parse_dataset(text, ',', TimeDomain::YearMonthDay);
        assert_eq!(points["s1"].measurements.len(), 2);
    }

    #[test]
    fn test_parse_locations() {
        let text = "id\tx\ty\r\nA\t-85.0\t30.0\r\nB\t-120.0\t42.0\r\nbroken\tnot-a-number\t0\r\n";
        let locations = parse_locations(text, '\t');
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].id, "A");
        assert_eq!(locations[0].x, -85.0);
        assert_eq!(locations[1].id, "B");
    }

    #[test]
    fn test_parse_locations_empty_text() {
        assert!(parse_locations("", '\t').is_empty());
    }
}
