use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_tables::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_output;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Could not find the worksheet {worksheet} in {path}"))]
    MissingWorksheet { worksheet: String, path: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a positive number in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Could not find the directory of {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Missing setting: {what}"))]
    MissingSetting { what: String },
    #[snafu(display("Unknown input type {provider:?}, expected xlsx or csv"))]
    UnknownProvider { provider: String },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error rendering the output table"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error flushing the output table"))]
    FlushingOutput { source: std::io::Error },
    #[snafu(display("The directory of the output {path} does not exist"))]
    MissingOutputDir { path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("{source}"))]
    Pipeline { source: TableErrors },
    #[snafu(display("Error reading the reference {path}"))]
    ReadingReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The produced table differs from the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

fn read_sheets(settings: &SurveySettings) -> SurveyResult<Vec<(String, Vec<Vec<String>>)>> {
    info!(
        "Attempting to read {} sheets from {:?}",
        settings.worksheets.len(),
        settings.input_path
    );
    match settings.provider {
        InputProvider::Xlsx => io_xlsx::read_xlsx_sheets(&settings.input_path, &settings.worksheets),
        InputProvider::Csv => io_csv::read_csv_sheets(&settings.input_path, &settings.worksheets),
    }
}

fn build_summary_js(settings: &SurveySettings, stats: &TableStats) -> JSValue {
    let sheets: Vec<JSValue> = stats
        .sheets
        .iter()
        .map(|s| {
            json!({
                "question": s.question_id,
                "retainedRows": s.retained_rows,
                "emptyLabelRows": s.empty_label_rows,
                "trailingRows": s.trailing_rows,
            })
        })
        .collect();
    json!({
        "survey": settings.survey_name,
        "input": settings.input_path,
        "output": settings.output,
        "sheets": sheets,
        "longRecords": stats.melted_records,
        "baseTotals": stats.base_totals,
        "suppressedCells": stats.suppressed_cells,
        "responsesWithoutBase": stats.responses_without_base,
        "records": stats.records,
    })
}

/// Compares the rendered table with the content of a reference file.
fn check_reference(reference_path: &str, rendered: &str) -> SurveyResult<()> {
    let reference = fs::read_to_string(reference_path).context(ReadingReferenceSnafu {
        path: reference_path,
    })?;
    if reference != rendered {
        warn!("Found differences with the reference {:?}", reference_path);
        print_diff(reference.as_str(), rendered, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("The table matches the reference {:?}", reference_path);
    Ok(())
}

/// Runs the survey described by the arguments.
///
/// Nothing is written before all the checks passed: the table and the summary
/// are rendered in memory and their destinations are checked first.
pub fn run_survey(args: &Args) -> SurveyResult<()> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);

    let sheets = read_sheets(&settings)?;
    debug!("read {} sheets", sheets.len());

    let res = run_pipeline(&sheets, &settings.schema, &settings.rules, &settings.labels)
        .context(PipelineSnafu {})?;
    let rendered = io_output::render_long_csv(&res.records)?;

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &settings.reference {
        check_reference(reference_p, &rendered)?;
    }

    let summary_js = build_summary_js(&settings, &res.stats);
    let pretty_summary = whatever!(
        serde_json::to_string_pretty(&summary_js),
        "Could not serialize the run summary"
    );

    io_output::check_destination(&settings.output)?;
    if let Some(p) = &settings.summary {
        io_output::check_destination(p)?;
    }

    io_output::write_output(&settings.output, &rendered)?;
    match &settings.summary {
        Some(p) => io_output::write_output(p, &format!("{}\n", pretty_summary))?,
        None => info!("summary: {}", pretty_summary),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> String {
        option_env!("SURVEY_TEST_DIR")
            .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"))
            .to_string()
    }

    fn empty_args() -> Args {
        Args {
            config: None,
            reference: None,
            out: None,
            input: None,
            input_type: None,
            questions: None,
            header_rows: None,
            summary: None,
            verbose: false,
        }
    }

    fn fixture_args(test_name: &str) -> Args {
        let dir = format!("{}/{}", test_dir(), test_name);
        let out_dir = std::env::temp_dir();
        Args {
            config: Some(format!("{}/{}_config.json", dir, test_name)),
            reference: Some(format!("{}/{}_expected.csv", dir, test_name)),
            out: Some(out_dir.join(format!("surveytab_{}.csv", test_name)).display().to_string()),
            summary: Some(
                out_dir
                    .join(format!("surveytab_{}_summary.json", test_name))
                    .display()
                    .to_string(),
            ),
            ..empty_args()
        }
    }

    fn test_wrapper(test_name: &str) -> SurveyResult<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        info!("Running test {}", test_name);
        let args = fixture_args(test_name);
        let res = run_survey(&args);
        if let Err(e) = &res {
            warn!("Error occured {:?}", e);
        }
        res
    }

    #[test]
    fn basic() {
        test_wrapper("basic").unwrap();

        let args = fixture_args("basic");
        let written = fs::read_to_string(args.out.unwrap()).unwrap();
        let expected = fs::read_to_string(args.reference.unwrap()).unwrap();
        assert_eq!(written, expected);

        let summary: JSValue =
            serde_json::from_str(&fs::read_to_string(args.summary.unwrap()).unwrap()).unwrap();
        assert_eq!(summary["survey"], json!("Cycling survey fixture"));
        assert_eq!(summary["records"], json!(20));
        assert_eq!(summary["baseTotals"], json!(10));
        assert_eq!(summary["sheets"][1]["question"], json!("T2"));
        assert_eq!(summary["sheets"][1]["emptyLabelRows"], json!(1));
    }

    #[test]
    fn idempotent() {
        let mut args = fixture_args("basic");
        let out = std::env::temp_dir()
            .join("surveytab_basic_rerun.csv")
            .display()
            .to_string();
        args.out = Some(out.clone());
        args.summary = None;
        run_survey(&args).unwrap();
        let first = fs::read(&out).unwrap();
        run_survey(&args).unwrap();
        let second = fs::read(&out).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_sentinel() {
        let mut args = fixture_args("missing_sentinel");
        args.reference = None;
        let _ = fs::remove_file(args.out.clone().unwrap());
        let res = run_survey(&args);
        assert!(matches!(
            res,
            Err(SurveyError::Pipeline {
                source: TableErrors::SentinelNotFound { .. }
            })
        ));
        // Nothing is written when the run fails.
        assert!(!Path::new(&args.out.unwrap()).exists());
    }

    #[test]
    fn reference_mismatch() {
        let mut args = fixture_args("basic");
        args.reference = Some(format!("{}/missing_sentinel/T1.csv", test_dir()));
        args.out = Some("stdout".to_string());
        args.summary = None;
        let res = run_survey(&args);
        assert!(matches!(res, Err(SurveyError::ReferenceMismatch { .. })));
    }

    #[test]
    fn questions_from_the_command_line() {
        let mut args = fixture_args("basic");
        args.questions = Some(vec!["T1".to_string()]);
        args.reference = None;
        args.out = Some("stdout".to_string());
        args.summary = None;
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.worksheets, vec![("T1".to_string(), "T1".to_string())]);
        assert_eq!(settings.provider, InputProvider::Csv);
        assert_eq!(settings.rules.header_rows, 3);
        run_survey(&args).unwrap();
    }

    #[test]
    fn defaults_without_config() {
        let args = Args {
            input: Some("survey.xlsx".to_string()),
            questions: Some(vec!["T1".to_string(), "T2".to_string()]),
            ..empty_args()
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.provider, InputProvider::Xlsx);
        assert_eq!(settings.input_path, "survey.xlsx");
        assert_eq!(settings.rules, TableRules::default());
        assert_eq!(settings.schema, SheetSchema::default());
        assert_eq!(settings.output, "stdout");
        assert_eq!(settings.summary, None);
    }

    #[test]
    fn missing_settings() {
        let res = resolve_settings(&empty_args());
        assert!(matches!(res, Err(SurveyError::MissingSetting { .. })));

        let args = Args {
            input: Some("survey.xlsx".to_string()),
            ..empty_args()
        };
        let res = resolve_settings(&args);
        assert!(matches!(res, Err(SurveyError::MissingSetting { .. })));

        let args = Args {
            input: Some("survey.xlsx".to_string()),
            questions: Some(vec!["T1".to_string()]),
            input_type: Some("ods".to_string()),
            ..empty_args()
        };
        let res = resolve_settings(&args);
        assert!(matches!(res, Err(SurveyError::UnknownProvider { .. })));
    }

    #[test]
    fn missing_workbook() {
        let args = Args {
            input: Some(format!("{}/no_such_file.xlsx", test_dir())),
            questions: Some(vec!["T1".to_string()]),
            ..empty_args()
        };
        let res = run_survey(&args);
        assert!(matches!(res, Err(SurveyError::OpeningExcel { .. })));
    }

    #[test]
    fn failed_summary_leaves_no_output() {
        let mut args = fixture_args("basic");
        let out = std::env::temp_dir()
            .join("surveytab_basic_no_summary_dir.csv")
            .display()
            .to_string();
        let _ = fs::remove_file(&out);
        args.out = Some(out.clone());
        args.summary = Some("/no_such_surveytab_dir/summary.json".to_string());
        let res = run_survey(&args);
        assert!(matches!(res, Err(SurveyError::MissingOutputDir { .. })));
        assert!(!Path::new(&out).exists());
    }

    #[test]
    fn stdout_is_not_shared() {
        let mut args = fixture_args("basic");
        args.out = Some("stdout".to_string());
        args.summary = Some("stdout".to_string());
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.output, "stdout");
        assert_eq!(settings.summary, None);

        args.out = Some(
            std::env::temp_dir()
                .join("surveytab_basic_shared.csv")
                .display()
                .to_string(),
        );
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.summary, Some("stdout".to_string()));
    }

    #[test]
    fn xlsx_basic() {
        test_wrapper("xlsx_basic").unwrap();

        let args = fixture_args("xlsx_basic");
        let written = fs::read_to_string(args.out.unwrap()).unwrap();
        let expected = fs::read_to_string(args.reference.unwrap()).unwrap();
        assert_eq!(written, expected);

        let summary: JSValue =
            serde_json::from_str(&fs::read_to_string(args.summary.unwrap()).unwrap()).unwrap();
        assert_eq!(summary["records"], json!(20));
        assert_eq!(summary["sheets"][1]["emptyLabelRows"], json!(1));
    }

    #[test]
    fn missing_worksheet() {
        let mut args = fixture_args("xlsx_basic");
        args.questions = Some(vec!["T1".to_string(), "T9".to_string()]);
        args.reference = None;
        args.out = Some("stdout".to_string());
        args.summary = None;
        let res = run_survey(&args);
        assert!(matches!(res, Err(SurveyError::MissingWorksheet { .. })));
    }
}
