// Primitives for reading CSV files.

use crate::survey::{io_common::sheet_file_path, *};

/// Reads the sheet of each question from `<dir>/<worksheet>.csv`, in order.
pub fn read_csv_sheets(
    dir: &str,
    worksheets: &[(String, String)],
) -> SurveyResult<Vec<(String, Vec<Vec<String>>)>> {
    let mut res: Vec<(String, Vec<Vec<String>>)> = Vec::new();
    for (question_id, worksheet) in worksheets.iter() {
        let path = sheet_file_path(dir, worksheet, "csv");
        let grid = read_csv_grid(&path)?;
        info!(
            "read_csv_sheets: question {}: file {:?}: {} rows",
            question_id,
            path,
            grid.len()
        );
        res.push((question_id.clone(), grid));
    }
    Ok(res)
}

/// All the lines of the file, without any header handling. The lines may have
/// different lengths.
fn read_csv_grid(path: &str) -> SurveyResult<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut grid: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_grid: {:?} {:?}", lineno, line);
        grid.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(grid)
}
