use std::path::{Path, PathBuf};

use calamine::DataType;

/// The raw text of a spreadsheet cell.
pub fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.clone(),
        // Counts are stored as floats by Excel: 12.0 is written 12.
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// The file holding a worksheet, for the providers that store one worksheet per file.
pub fn sheet_file_path(dir: &str, worksheet: &str, extension: &str) -> String {
    let p: PathBuf = [Path::new(dir), Path::new(&format!("{}.{}", worksheet, extension))]
        .iter()
        .collect();
    p.as_path().display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(cell_to_string(&DataType::String("*".to_string())), "*");
        assert_eq!(cell_to_string(&DataType::Float(1234.0)), "1234");
        assert_eq!(cell_to_string(&DataType::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&DataType::Int(7)), "7");
    }

    #[test]
    fn sheet_files() {
        assert_eq!(sheet_file_path("data", "T1", "csv"), "data/T1.csv");
        assert_eq!(sheet_file_path("", "T1", "csv"), "T1.csv");
    }
}
