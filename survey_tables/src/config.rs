// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The name of the column holding the response label of each row.
pub const LABEL_COLUMN: &str = "label";

/// The schema used by the survey exports when none is provided.
///
/// The first column is the response label, followed by the whole population,
/// the survey administration modes (dropped during extraction) and one column
/// per demographic subgroup, named `<parameter>_<subgroup>`.
pub const DEFAULT_COLUMNS: [&str; 37] = [
    "label",
    "overall",
    "mode_online",
    "mode_telephone",
    "mode_paper",
    "mode_inperson",
    "gender_man",
    "gender_woman",
    "age_16to24",
    "age_25to34",
    "age_35to44",
    "age_45to54",
    "age_55to64",
    "age_65plus",
    "income_under20k",
    "income_20kto40k",
    "income_40kto60k",
    "income_over60k",
    "region_north",
    "region_midlands",
    "region_south",
    "region_london",
    "ethnicity_white",
    "ethnicity_asian",
    "ethnicity_black",
    "ethnicity_mixedother",
    "disability_disabled",
    "disability_nondisabled",
    "tenure_owner",
    "tenure_renter",
    "tenure_social",
    "employment_employed",
    "employment_unemployed",
    "employment_retired",
    "employment_student",
    "education_degree",
    "education_nodegree",
];

/// The column layout of every question sheet.
///
/// The layout is supplied from outside: the header rows of the exports are
/// not machine readable and are skipped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetSchema {
    columns: Vec<String>,
    label_index: usize,
}

impl SheetSchema {
    /// Validates a list of column names.
    ///
    /// The names must be unique and non-empty, and exactly one of them must be
    /// the label column.
    pub fn new(columns: &[String]) -> Result<SheetSchema, TableErrors> {
        if columns.is_empty() {
            return Err(TableErrors::InvalidSchema {
                reason: "no column provided".to_string(),
            });
        }
        let mut label_index: Option<usize> = None;
        for (idx, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(TableErrors::InvalidSchema {
                    reason: format!("column {} has an empty name", idx + 1),
                });
            }
            if columns[..idx].contains(name) {
                return Err(TableErrors::InvalidSchema {
                    reason: format!("column {:?} appears more than once", name),
                });
            }
            if name == LABEL_COLUMN {
                label_index = Some(idx);
            }
        }
        let label_index = label_index.ok_or_else(|| TableErrors::InvalidSchema {
            reason: format!("missing the {:?} column", LABEL_COLUMN),
        })?;
        Ok(SheetSchema {
            columns: columns.to_vec(),
            label_index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn label_index(&self) -> usize {
        self.label_index
    }

    /// The columns carrying subgroup counts, with their position in the sheet.
    /// Everything but the label and the columns starting with `dropped_prefix`.
    pub fn demographic_columns(&self, dropped_prefix: &str) -> Vec<(usize, String)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, name)| {
                *idx != self.label_index
                    && (dropped_prefix.is_empty() || !name.starts_with(dropped_prefix))
            })
            .map(|(idx, name)| (idx, name.clone()))
            .collect()
    }
}

impl Default for SheetSchema {
    fn default() -> SheetSchema {
        SheetSchema {
            columns: DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect(),
            label_index: 0,
        }
    }
}

/// One response option of one question, as read from the sheet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawSheetRow {
    pub question_id: String,
    /// The row number in the spreadsheet (starting at 1).
    pub source_row: usize,
    pub label: String,
    /// The raw cells, aligned with the demographic columns of the sheet.
    pub values: Vec<String>,
}

/// The rows of one question, after the header, empty labels and the trailing
/// rows have been removed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionSheet {
    pub question_id: String,
    /// The demographic columns, in sheet order.
    pub columns: Vec<String>,
    pub rows: Vec<RawSheetRow>,
    pub stats: SheetStats,
}

/// All the question sheets, concatenated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawSheetRow>,
    pub sheet_stats: Vec<SheetStats>,
}

/// One cell of the survey table, after the pivot from columns to rows.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MeltedRecord {
    pub question_id: String,
    pub response_category: String,
    /// The schema column the value comes from.
    pub column: String,
    pub demographic_parameter: String,
    pub subgroup: Option<String>,
    pub source_row: usize,
    pub value: String,
}

/// The denominator of a question for one subgroup.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BaseTotalRecord {
    pub question_id: String,
    pub demographic_parameter: String,
    pub subgroup: Option<String>,
    pub column: String,
    pub source_row: usize,
    pub base_sub_total: String,
}

/// A response cell with its denominator, if one was found.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct JoinedRecord {
    pub response: MeltedRecord,
    pub base: Option<BaseTotalRecord>,
}

/// The content of a count cell.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum CellValue {
    /// Nothing in the cell.
    Missing,
    /// The count was withheld (one of the suppression markers).
    Suppressed,
    Count(f64),
}

impl CellValue {
    pub fn count(&self) -> Option<f64> {
        match self {
            CellValue::Count(x) => Some(*x),
            CellValue::Missing | CellValue::Suppressed => None,
        }
    }
}

// ******** Output data structures *********

/// One row of the final table.
#[derive(PartialEq, Debug, Clone)]
pub struct LongRecord {
    pub question_id: String,
    pub response_category: String,
    pub demographic_parameter: String,
    pub subgroup: Option<String>,
    pub responders_n: Option<f64>,
    pub base_sub_total: Option<f64>,
    pub freq: Option<f64>,
}

/// Statistics about the extraction of one sheet.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SheetStats {
    pub question_id: String,
    pub retained_rows: usize,
    pub empty_label_rows: usize,
    /// The rows dropped after the sentinel (sentinel row included).
    pub trailing_rows: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TableStats {
    pub sheets: Vec<SheetStats>,
    pub melted_records: usize,
    pub base_totals: usize,
    pub suppressed_cells: usize,
    pub responses_without_base: usize,
    pub records: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TableResult {
    pub records: Vec<LongRecord>,
    pub stats: TableStats,
}

/// Faults that abort the processing of a survey.
///
/// None of them is transient: running again on the same input gives the same
/// fault.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TableErrors {
    EmptySurvey,
    /// The schema itself is not usable.
    InvalidSchema { reason: String },
    /// The content of a sheet does not fit the schema.
    SchemaMismatch { question_id: String, reason: String },
    SentinelNotFound {
        question_id: String,
        sentinel: String,
    },
    /// More than one base/total row for the same question and subgroup.
    AmbiguousBaseTotal {
        question_id: String,
        demographic_parameter: String,
        subgroup: Option<String>,
        matches: usize,
    },
    UnparseableValue {
        question_id: String,
        source_row: usize,
        column: String,
        value: String,
    },
}

impl Error for TableErrors {}

impl Display for TableErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableErrors::EmptySurvey => write!(f, "no question sheet to process"),
            TableErrors::InvalidSchema { reason } => write!(f, "invalid column schema: {}", reason),
            TableErrors::SchemaMismatch {
                question_id,
                reason,
            } => write!(
                f,
                "sheet {}: content does not match the column schema: {}",
                question_id, reason
            ),
            TableErrors::SentinelNotFound {
                question_id,
                sentinel,
            } => write!(
                f,
                "sheet {}: could not find the closing row {:?}",
                question_id, sentinel
            ),
            TableErrors::AmbiguousBaseTotal {
                question_id,
                demographic_parameter,
                subgroup,
                matches,
            } => write!(
                f,
                "sheet {}: {} base/total rows match {} / {}, expected one",
                question_id,
                matches,
                demographic_parameter,
                subgroup.as_deref().unwrap_or("(none)")
            ),
            TableErrors::UnparseableValue {
                question_id,
                source_row,
                column,
                value,
            } => write!(
                f,
                "sheet {}: row {}, column {}: {:?} is neither a number nor a suppression marker",
                question_id, source_row, column, value
            ),
        }
    }
}

// ********* Configuration **********

pub const DEFAULT_HEADER_ROWS: usize = 15;
pub const DEFAULT_SENTINEL_LABEL: &str = "Prefer not to say";
pub const DEFAULT_BASE_PREFIX: &str = "Base";
pub const DEFAULT_DROPPED_COLUMN_PREFIX: &str = "mode";
pub const DEFAULT_SUPPRESSION_MARKERS: [&str; 3] = ["-", "*", "**"];

/// The rules that govern the extraction of the sheets.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TableRules {
    /// The number of rows to skip at the top of every sheet.
    pub header_rows: usize,
    /// The label of the last response option. This row and everything below
    /// it is discarded.
    pub sentinel_label: String,
    /// Rows whose label starts with this prefix hold the denominators.
    pub base_prefix: String,
    /// Columns whose name starts with this prefix are not demographic data.
    pub dropped_column_prefix: String,
    pub suppression_markers: Vec<String>,
}

impl Default for TableRules {
    fn default() -> TableRules {
        TableRules {
            header_rows: DEFAULT_HEADER_ROWS,
            sentinel_label: DEFAULT_SENTINEL_LABEL.to_string(),
            base_prefix: DEFAULT_BASE_PREFIX.to_string(),
            dropped_column_prefix: DEFAULT_DROPPED_COLUMN_PREFIX.to_string(),
            suppression_markers: DEFAULT_SUPPRESSION_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
