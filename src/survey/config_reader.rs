use crate::survey::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::HashMap;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "headerRowCount")]
    _header_row_count: Option<JSValue>,
    #[serde(rename = "worksheetNames")]
    pub worksheet_names: Option<HashMap<String, String>>,
}

impl SourceFile {
    pub fn header_row_count(&self) -> SurveyResult<Option<usize>> {
        if self._header_row_count.is_some() {
            read_js_int(&self._header_row_count).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyRules {
    #[serde(rename = "sentinelLabel")]
    pub sentinel_label: Option<String>,
    #[serde(rename = "basePrefix")]
    pub base_prefix: Option<String>,
    #[serde(rename = "droppedColumnPrefix")]
    pub dropped_column_prefix: Option<String>,
    #[serde(rename = "suppressionMarkers")]
    pub suppression_markers: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyLabels {
    pub parameters: Option<HashMap<String, String>>,
    pub subgroups: Option<HashMap<String, String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "sourceFile")]
    pub source_file: SourceFile,
    pub questions: Vec<String>,
    pub columns: Option<Vec<String>>,
    pub rules: Option<SurveyRules>,
    pub labels: Option<SurveyLabels>,
}

/// The kinds of survey exports that can be read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputProvider {
    /// One Excel workbook, one worksheet per question.
    Xlsx,
    /// One directory, one CSV file per question.
    Csv,
}

impl InputProvider {
    pub fn parse(provider: &str) -> SurveyResult<InputProvider> {
        match provider {
            "xlsx" => Ok(InputProvider::Xlsx),
            "csv" => Ok(InputProvider::Csv),
            x => UnknownProviderSnafu { provider: x }.fail(),
        }
    }
}

/// Everything needed for a run, after merging the configuration file and the
/// command line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveySettings {
    pub survey_name: Option<String>,
    pub provider: InputProvider,
    pub input_path: String,
    /// (question code, worksheet name), in processing order.
    pub worksheets: Vec<(String, String)>,
    pub schema: SheetSchema,
    pub rules: TableRules,
    pub labels: LabelTables,
    /// A file path or `stdout`.
    pub output: String,
    pub summary: Option<String>,
    pub reference: Option<String>,
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// Resolves a path of the configuration file against the directory of this file.
fn resolve_path(root: &Path, p: &str) -> String {
    if p == "stdout" {
        return p.to_string();
    }
    let full: PathBuf = [root, Path::new(p)].iter().collect();
    full.as_path().display().to_string()
}

/// Builds the settings of a run. The command line arguments win over the
/// configuration file.
pub fn resolve_settings(args: &Args) -> SurveyResult<SurveySettings> {
    let config: Option<SurveyConfig> = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    let root: PathBuf = match &args.config {
        Some(p) => Path::new(p)
            .parent()
            .context(MissingParentDirSnafu { path: p })?
            .to_path_buf(),
        None => PathBuf::new(),
    };
    info!("resolve_settings: config: {:?}", config);

    let source = config.as_ref().map(|c| &c.source_file);
    let output_settings = config.as_ref().and_then(|c| c.output_settings.clone());
    let config_rules = config.as_ref().and_then(|c| c.rules.clone());

    let input_path = match (&args.input, source) {
        (Some(p), _) => p.clone(),
        (None, Some(s)) => resolve_path(&root, &s.file_path),
        (None, None) => {
            return MissingSettingSnafu {
                what: "the input file (--input or sourceFile.filePath)",
            }
            .fail()
        }
    };

    let provider_name = args
        .input_type
        .clone()
        .or_else(|| source.and_then(|s| s.provider.clone()))
        .unwrap_or_else(|| "xlsx".to_string());
    let provider = InputProvider::parse(&provider_name)?;

    let questions: Vec<String> = match (&args.questions, &config) {
        (Some(qs), _) => qs.clone(),
        (None, Some(c)) => c.questions.clone(),
        (None, None) => vec![],
    };
    ensure!(
        !questions.is_empty(),
        MissingSettingSnafu {
            what: "the list of questions (--questions or questions)",
        }
    );
    let worksheet_names: HashMap<String, String> = source
        .and_then(|s| s.worksheet_names.clone())
        .unwrap_or_default();
    let worksheets: Vec<(String, String)> = questions
        .iter()
        .map(|q| {
            let ws = worksheet_names.get(q).cloned().unwrap_or_else(|| q.clone());
            (q.clone(), ws)
        })
        .collect();

    let schema = match config.as_ref().and_then(|c| c.columns.clone()) {
        Some(cols) => SheetSchema::new(&cols).context(PipelineSnafu {})?,
        None => SheetSchema::default(),
    };

    let defaults = TableRules::default();
    let header_rows = match (args.header_rows, source) {
        (Some(n), _) => n,
        (None, Some(s)) => s.header_row_count()?.unwrap_or(defaults.header_rows),
        (None, None) => defaults.header_rows,
    };
    let rules = match config_rules {
        Some(r) => TableRules {
            header_rows,
            sentinel_label: r.sentinel_label.unwrap_or(defaults.sentinel_label),
            base_prefix: r.base_prefix.unwrap_or(defaults.base_prefix),
            dropped_column_prefix: r
                .dropped_column_prefix
                .unwrap_or(defaults.dropped_column_prefix),
            suppression_markers: r
                .suppression_markers
                .unwrap_or(defaults.suppression_markers),
        },
        None => TableRules {
            header_rows,
            ..defaults
        },
    };

    let labels = match config.as_ref().and_then(|c| c.labels.clone()) {
        Some(l) => LabelTables::default().merge(
            &l.parameters.unwrap_or_default(),
            &l.subgroups.unwrap_or_default(),
        ),
        None => LabelTables::default(),
    };

    let output = match (&args.out, output_settings.as_ref().and_then(|o| o.output_path.clone())) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => resolve_path(&root, &p),
        (None, None) => "stdout".to_string(),
    };
    let summary = match (&args.summary, output_settings.as_ref().and_then(|o| o.summary_path.clone())) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) => Some(resolve_path(&root, &p)),
        (None, None) => None,
    };
    // The table and the summary cannot share the standard output.
    let summary = match summary {
        Some(p) if p == "stdout" && output == "stdout" => {
            warn!("resolve_settings: the table is written to stdout, the summary will be logged instead");
            None
        }
        x => x,
    };

    Ok(SurveySettings {
        survey_name: output_settings.and_then(|o| o.survey_name),
        provider,
        input_path,
        worksheets,
        schema,
        rules,
        labels,
        output,
        summary,
        reference: args.reference.clone(),
    })
}

fn read_js_int(x: &Option<JSValue>) -> SurveyResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
