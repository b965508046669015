use chrono::NaiveDate;

use crate::common::calendar::parse_day_first;
use crate::common::types::{Column, ColumnSelection, RawTable};
use crate::error::{PipelineError, Result};

/// A table whose column selection has been checked: the date column parsed
/// day-first and the target column confirmed numeric.
///
/// Borrows the source table; the table itself is never modified.
#[derive(Debug, Clone)]
pub struct ValidatedTable<'a> {
    pub table: &'a RawTable,
    pub selection: ColumnSelection,
    /// Parsed dates, one per row, in table order.
    pub dates: Vec<NaiveDate>,
    /// Target values, one per row, in table order.
    pub values: Vec<f64>,
}

/// Validate a column selection against a loaded table.
///
/// Checks, in order: both columns exist, every date cell parses day-first,
/// every target cell is numeric.
pub fn validate<'a>(
    table: &'a RawTable,
    selection: &ColumnSelection,
) -> Result<ValidatedTable<'a>> {
    let date_column = find_column(table, &selection.date_column)?;
    let target_column = find_column(table, &selection.target_column)?;

    let dates = parse_date_column(table, date_column)?;
    let values = numeric_values(table, target_column)?;

    Ok(ValidatedTable {
        table,
        selection: selection.clone(),
        dates,
        values,
    })
}

fn find_column<'a>(table: &'a RawTable, name: &str) -> Result<&'a Column> {
    table.column(name).ok_or_else(|| PipelineError::Selection {
        column: name.to_string(),
        available: table.column_names(),
    })
}

/// Parse every cell of the date column; the first failure names its file line.
pub fn parse_date_column(table: &RawTable, column: &Column) -> Result<Vec<NaiveDate>> {
    column
        .raw
        .iter()
        .enumerate()
        .map(|(row, text)| {
            parse_day_first(text).ok_or_else(|| PipelineError::DateParse {
                line: table.source_line(row),
                value: text.clone(),
            })
        })
        .collect()
}

/// Read the target column as numbers. Any missing, boolean or text cell
/// disqualifies the whole column.
pub fn numeric_values(table: &RawTable, column: &Column) -> Result<Vec<f64>> {
    column
        .cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            cell.as_f64().ok_or_else(|| PipelineError::Type {
                column: column.name.clone(),
                line: table.source_line(row),
                value: column.raw.get(row).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::table_reader::read_table;

    fn table(csv: &str) -> RawTable {
        read_table(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_valid_selection() {
        let t = table("Date,Calls\n03/04/2024,1\n04/04/2024,-2.5\n");
        let v = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap();
        assert_eq!(v.dates[0], NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
        assert_eq!(v.values, vec![1.0, -2.5]);
    }

    #[test]
    fn test_missing_column_is_selection_error() {
        let t = table("Date,Calls\n03/04/2024,1\n");
        let err = validate(&t, &ColumnSelection::new("Date", "Volume")).unwrap_err();
        assert_eq!(
            err,
            PipelineError::Selection {
                column: "Volume".into(),
                available: vec!["Date".into(), "Calls".into()],
            }
        );
        let err = validate(&t, &ColumnSelection::new("When", "Calls")).unwrap_err();
        assert!(matches!(err, PipelineError::Selection { ref column, .. } if column == "When"));
    }

    #[test]
    fn test_bad_date_names_row() {
        let t = table("Date,Calls\n03/04/2024,1\n2024-13-45,2\n");
        let err = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap_err();
        assert_eq!(
            err,
            PipelineError::DateParse {
                line: 3,
                value: "2024-13-45".into()
            }
        );
        assert!(err.to_string().starts_with("Line 3:"));
    }

    #[test]
    fn test_error_line_counts_blank_lines() {
        let t = table("Date,Calls\n03/04/2024,1\n\n04/04/2024,x\n");
        let err = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap_err();
        assert!(matches!(err, PipelineError::Type { line: 4, .. }), "{:?}", err);
    }

    #[test]
    fn test_empty_date_cell_rejected() {
        let t = table("Date,Calls\n,1\n");
        let err = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap_err();
        assert!(matches!(err, PipelineError::DateParse { line: 2, .. }));
    }

    #[test]
    fn test_non_numeric_target_rejected() {
        for bad in ["abc", "True", ""] {
            let csv = format!("Date,Calls\n03/04/2024,1\n04/04/2024,{}\n", bad);
            let t = table(&csv);
            let err = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap_err();
            assert!(
                matches!(err, PipelineError::Type { line: 3, .. }),
                "value {:?} gave {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_date_checked_before_target_type() {
        let t = table("Date,Calls\nnope,abc\n");
        let err = validate(&t, &ColumnSelection::new("Date", "Calls")).unwrap_err();
        assert!(matches!(err, PipelineError::DateParse { .. }));
    }

    #[test]
    fn test_same_column_for_both_roles() {
        // Dates are not numeric, so this is a type error rather than a crash
        let t = table("Date,Calls\n03/04/2024,1\n");
        let err = validate(&t, &ColumnSelection::new("Date", "Date")).unwrap_err();
        assert!(matches!(err, PipelineError::Type { .. }));
    }
}
