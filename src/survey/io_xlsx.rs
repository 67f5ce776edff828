// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::survey::{io_common::cell_to_string, *};

/// Reads the worksheet of each question, in order.
pub fn read_xlsx_sheets(
    path: &str,
    worksheets: &[(String, String)],
) -> SurveyResult<Vec<(String, Vec<Vec<String>>)>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    debug!(
        "read_xlsx_sheets: path: {:?} worksheets: {:?}",
        path,
        workbook.sheet_names()
    );

    let mut res: Vec<(String, Vec<Vec<String>>)> = Vec::new();
    for (question_id, worksheet) in worksheets.iter() {
        let wrange = workbook
            .worksheet_range(worksheet)
            .context(MissingWorksheetSnafu { worksheet, path })?
            .context(OpeningExcelSnafu { path })?;
        let grid = range_to_grid(&wrange);
        info!(
            "read_xlsx_sheets: question {}: worksheet {:?}: {} rows",
            question_id,
            worksheet,
            grid.len()
        );
        res.push((question_id.clone(), grid));
    }
    Ok(res)
}

// The range starts at the first used cell. Pad it so that the row and column
// positions match the worksheet.
fn range_to_grid(wrange: &Range<DataType>) -> Vec<Vec<String>> {
    let (first_row, first_col) = wrange.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<String>> = (0..first_row).map(|_| Vec::new()).collect();
    for row in wrange.rows() {
        let mut cells: Vec<String> = vec![String::new(); first_col as usize];
        cells.extend(row.iter().map(cell_to_string));
        grid.push(cells);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_offsets() {
        let mut wrange: Range<DataType> = Range::new((2, 1), (3, 2));
        wrange.set_value((2, 1), DataType::String("Yes".to_string()));
        wrange.set_value((2, 2), DataType::Float(12.0));
        wrange.set_value((3, 1), DataType::String("Prefer not to say".to_string()));
        let grid = range_to_grid(&wrange);
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty());
        assert_eq!(grid[2], vec!["", "Yes", "12"]);
        assert_eq!(grid[3], vec!["", "Prefer not to say", ""]);
    }
}
