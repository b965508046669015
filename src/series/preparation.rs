use serde::Serialize;
use tracing::warn;

use super::validation::ValidatedTable;
use crate::common::types::{CanonicalSeries, SeriesPoint};

/// Non-fatal findings about the prepared series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SeriesWarning {
    /// Some timestamps occur more than once. They are kept as-is.
    DuplicateTimestamps { count: usize },
}

/// Project the validated selection into a canonical (ds, y) series.
///
/// Only the two selected columns survive. Rows are sorted ascending by
/// timestamp with a stable sort, so rows sharing a timestamp keep their
/// original relative order.
pub fn prepare(validated: &ValidatedTable<'_>) -> (CanonicalSeries, Vec<SeriesWarning>) {
    let mut points: Vec<SeriesPoint> = validated
        .dates
        .iter()
        .zip(validated.values.iter())
        .map(|(&timestamp, &value)| SeriesPoint { timestamp, value })
        .collect();

    points.sort_by_key(|p| p.timestamp);

    let duplicates = points
        .windows(2)
        .filter(|w| w[0].timestamp == w[1].timestamp)
        .count();

    let mut warnings = Vec::new();
    if duplicates > 0 {
        warn!(
            duplicates,
            date_column = %validated.selection.date_column,
            "series contains duplicate timestamps; keeping all rows"
        );
        warnings.push(SeriesWarning::DuplicateTimestamps { count: duplicates });
    }

    (CanonicalSeries { points }, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::table_reader::read_table;
    use crate::common::types::ColumnSelection;
    use crate::series::validation::validate;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sorted_and_projected() {
        let csv = b"Other,Calls,Date\nx,3,01/03/2024\ny,1,01/01/2024\nz,2,01/02/2024\n";
        let t = read_table(csv).unwrap();
        let v = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap();
        let (series, warnings) = prepare(&v);
        assert!(warnings.is_empty());
        assert_eq!(
            series.timestamps(),
            vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]
        );
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_stable_for_duplicates() {
        let csv = b"Date,Calls\n01/02/2024,5\n01/01/2024,9\n01/02/2024,6\n01/02/2024,7\n";
        let t = read_table(csv).unwrap();
        let v = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap();
        let (series, warnings) = prepare(&v);
        assert_eq!(series.values(), vec![9.0, 5.0, 6.0, 7.0]);
        assert_eq!(warnings, vec![SeriesWarning::DuplicateTimestamps { count: 2 }]);
    }

    #[test]
    fn test_empty_table_gives_empty_series() {
        let t = read_table(b"Date,Calls\n").unwrap();
        let v = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap();
        let (series, warnings) = prepare(&v);
        assert!(series.is_empty());
        assert!(warnings.is_empty());
    }
}
