pub use crate::config::*;
use crate::labels::LabelTables;
use crate::{extract_sheet, tabulate};

/// A builder for adding question sheets one at a time.
///
/// Each sheet is extracted when it is added, so that a broken sheet is
/// reported as early as possible.
///
/// ```
/// pub use survey_tables::builder::Builder;
/// pub use survey_tables::TableRules;
/// # use survey_tables::TableErrors;
///
/// let rules = TableRules {
///     header_rows: 1,
///     ..TableRules::default()
/// };
/// let mut builder = Builder::new(&rules)?
///     .columns(&["label".to_string(), "gender_man".to_string()])?;
///
/// builder.add_sheet_simple(
///     "T1",
///     &[
///         &["Do you cycle?", ""],
///         &["Base: all men", "40"],
///         &["Yes", "10"],
///         &["Prefer not to say", "2"],
///     ],
/// )?;
///
/// let res = builder.build()?;
/// assert_eq!(res.records[0].subgroup.as_deref(), Some("Men"));
/// assert_eq!(res.records[0].freq, Some(25.0));
///
/// # Ok::<(), TableErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: TableRules,
    pub(crate) _schema: SheetSchema,
    pub(crate) _labels: LabelTables,
    pub(crate) _sheets: Vec<QuestionSheet>,
}

impl Builder {
    pub fn new(rules: &TableRules) -> Result<Builder, TableErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _schema: SheetSchema::default(),
            _labels: LabelTables::default(),
            _sheets: Vec::new(),
        })
    }

    /// Replaces the default column schema.
    pub fn columns(self, cols: &[String]) -> Result<Builder, TableErrors> {
        Ok(Builder {
            _schema: SheetSchema::new(cols)?,
            _sheets: Vec::new(),
            ..self
        })
    }

    pub fn labels(self, labels: LabelTables) -> Builder {
        Builder {
            _labels: labels,
            ..self
        }
    }

    /// Adds the raw content of the sheet of a question, header rows included.
    pub fn add_sheet(&mut self, question_id: &str, grid: &[Vec<String>]) -> Result<(), TableErrors> {
        let sheet = extract_sheet(question_id, grid, &self._schema, &self._rules)?;
        self._sheets.push(sheet);
        Ok(())
    }

    /// Same as `add_sheet`, for literal content.
    pub fn add_sheet_simple(&mut self, question_id: &str, rows: &[&[&str]]) -> Result<(), TableErrors> {
        let grid: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect();
        self.add_sheet(question_id, &grid)
    }

    pub fn num_sheets(&self) -> usize {
        self._sheets.len()
    }

    /// Runs the remaining stages on all the sheets added so far.
    pub fn build(&self) -> Result<TableResult, TableErrors> {
        tabulate(self._sheets.clone(), &self._rules, &self._labels)
    }
}
