mod config;
pub mod labels;
use log::{debug, info, warn};

use std::collections::HashMap;

pub use crate::config::*;
pub use crate::labels::{normalize_labels, LabelTables, OVERALL_LABEL};

pub mod builder;
pub mod manual;

// **** Private structures ****

// (question, parameter, subgroup)
type BaseKey = (String, String, Option<String>);

fn base_key(question_id: &str, parameter: &str, subgroup: &Option<String>) -> BaseKey {
    (question_id.to_string(), parameter.to_string(), subgroup.clone())
}

/// Runs the whole transformation on raw sheets.
///
/// Arguments:
/// * `sheets` the question identifiers with the raw content of their sheets,
/// header rows included. The output follows the order of this list.
/// * `schema` the column layout shared by all the sheets
/// * `rules` the rules that govern the extraction
/// * `labels` the display labels for the parameters and subgroups
pub fn run_pipeline(
    sheets: &[(String, Vec<Vec<String>>)],
    schema: &SheetSchema,
    rules: &TableRules,
    labels: &LabelTables,
) -> Result<TableResult, TableErrors> {
    info!(
        "Processing {:?} sheets, schema of {} columns, rules: {:?}",
        sheets.len(),
        schema.len(),
        rules
    );
    let mut extracted: Vec<QuestionSheet> = Vec::new();
    for (question_id, grid) in sheets.iter() {
        extracted.push(extract_sheet(question_id, grid, schema, rules)?);
    }
    tabulate(extracted, rules, labels)
}

/// Runs all the stages after the extraction.
pub fn tabulate(
    sheets: Vec<QuestionSheet>,
    rules: &TableRules,
    labels: &LabelTables,
) -> Result<TableResult, TableErrors> {
    let table = aggregate_sheets(sheets)?;
    info!(
        "tabulate: {} rows over {} demographic columns",
        table.rows.len(),
        table.columns.len()
    );

    let melted = reshape_long(&table);
    let melted_records = melted.len();
    let suppressed_cells = melted
        .iter()
        .filter(|m| classify_cell(&m.value, &rules.suppression_markers) == Some(CellValue::Suppressed))
        .count();
    info!(
        "tabulate: {} long records, {} suppressed cells",
        melted_records, suppressed_cells
    );

    let (responses, bases) = split_base_totals(melted, &rules.base_prefix);
    let base_totals = bases.len();
    info!(
        "tabulate: {} response records, {} base/total records",
        responses.len(),
        base_totals
    );

    let joined = join_base_totals(responses, bases)?;
    let responses_without_base = joined.iter().filter(|j| j.base.is_none()).count();
    if responses_without_base > 0 {
        warn!(
            "tabulate: {} response records without a base/total",
            responses_without_base
        );
    }

    let values = normalize_values(joined, &rules.suppression_markers)?;
    let records = normalize_labels(values, labels);
    info!("tabulate: {} records in the final table", records.len());

    Ok(TableResult {
        stats: TableStats {
            sheets: table.sheet_stats,
            melted_records,
            base_totals,
            suppressed_cells,
            responses_without_base,
            records: records.len(),
        },
        records,
    })
}

/// Extracts the response rows of one question from its raw sheet.
///
/// The header rows are skipped, the rows without a label are dropped, and the
/// sheet stops just before the first row labelled with the sentinel. Only the
/// demographic columns are kept.
pub fn extract_sheet(
    question_id: &str,
    grid: &[Vec<String>],
    schema: &SheetSchema,
    rules: &TableRules,
) -> Result<QuestionSheet, TableErrors> {
    let label_idx = schema.label_index();
    let demographic = schema.demographic_columns(&rules.dropped_column_prefix);
    debug!(
        "extract_sheet: {}: {} raw rows, demographic columns: {:?}",
        question_id,
        grid.len(),
        demographic
    );

    let mut rows: Vec<RawSheetRow> = Vec::new();
    let mut empty_label_rows: usize = 0;
    let mut sentinel_idx: Option<usize> = None;
    for (idx, row) in grid.iter().enumerate().skip(rules.header_rows) {
        let source_row = idx + 1;
        let label = row.get(label_idx).map(|s| s.trim()).unwrap_or("");
        if label.is_empty() {
            empty_label_rows += 1;
            continue;
        }
        if label == rules.sentinel_label {
            sentinel_idx = Some(idx);
            break;
        }
        if let Some((col_idx, cell)) = row
            .iter()
            .enumerate()
            .skip(schema.len())
            .find(|(_, c)| !c.trim().is_empty())
        {
            return Err(TableErrors::SchemaMismatch {
                question_id: question_id.to_string(),
                reason: format!(
                    "row {} has the value {:?} in column {}, beyond the {} expected columns",
                    source_row,
                    cell,
                    col_idx + 1,
                    schema.len()
                ),
            });
        }
        let values: Vec<String> = demographic
            .iter()
            .map(|(col_idx, _)| row.get(*col_idx).cloned().unwrap_or_default())
            .collect();
        debug!(
            "extract_sheet: {}: row {}: {:?} {:?}",
            question_id, source_row, label, values
        );
        rows.push(RawSheetRow {
            question_id: question_id.to_string(),
            source_row,
            label: label.to_string(),
            values,
        });
    }

    let sentinel_idx = sentinel_idx.ok_or_else(|| TableErrors::SentinelNotFound {
        question_id: question_id.to_string(),
        sentinel: rules.sentinel_label.clone(),
    })?;

    // The widest row of the data region tells how many columns the sheet has.
    let width = grid[rules.header_rows..=sentinel_idx]
        .iter()
        .map(|r| r.len())
        .max()
        .unwrap_or(0);
    if width < schema.len() {
        return Err(TableErrors::SchemaMismatch {
            question_id: question_id.to_string(),
            reason: format!(
                "the sheet has {} columns, expected {}",
                width,
                schema.len()
            ),
        });
    }

    let stats = SheetStats {
        question_id: question_id.to_string(),
        retained_rows: rows.len(),
        empty_label_rows,
        trailing_rows: grid.len() - sentinel_idx,
    };
    info!("extract_sheet: {:?}", stats);
    Ok(QuestionSheet {
        question_id: question_id.to_string(),
        columns: demographic.into_iter().map(|(_, name)| name).collect(),
        rows,
        stats,
    })
}

/// Concatenates the sheets, in the given order. All the sheets must share the
/// same columns.
pub fn aggregate_sheets(sheets: Vec<QuestionSheet>) -> Result<SurveyTable, TableErrors> {
    let columns = match sheets.first() {
        Some(s) => s.columns.clone(),
        None => return Err(TableErrors::EmptySurvey),
    };
    let mut rows: Vec<RawSheetRow> = Vec::new();
    let mut sheet_stats: Vec<SheetStats> = Vec::new();
    for sheet in sheets {
        if sheet.columns != columns {
            return Err(TableErrors::SchemaMismatch {
                question_id: sheet.question_id,
                reason: format!(
                    "columns {:?} differ from the columns of the other sheets {:?}",
                    sheet.columns, columns
                ),
            });
        }
        rows.extend(sheet.rows);
        sheet_stats.push(sheet.stats);
    }
    Ok(SurveyTable {
        columns,
        rows,
        sheet_stats,
    })
}

/// Splits a column name into its demographic parameter and subgroup codes.
///
/// The split happens on the first underscore. A name without underscore
/// describes a whole population and has no subgroup.
pub fn split_column_name(name: &str) -> (String, Option<String>) {
    match name.split_once('_') {
        Some((parameter, subgroup)) => (parameter.to_string(), Some(subgroup.to_string())),
        None => (name.to_string(), None),
    }
}

/// Pivots every demographic column into rows.
///
/// The records come column by column, and within a column in the order of the
/// table rows.
pub fn reshape_long(table: &SurveyTable) -> Vec<MeltedRecord> {
    let mut res: Vec<MeltedRecord> = Vec::with_capacity(table.columns.len() * table.rows.len());
    for (col_idx, column) in table.columns.iter().enumerate() {
        let (demographic_parameter, subgroup) = split_column_name(column);
        for row in table.rows.iter() {
            res.push(MeltedRecord {
                question_id: row.question_id.clone(),
                response_category: row.label.clone(),
                column: column.clone(),
                demographic_parameter: demographic_parameter.clone(),
                subgroup: subgroup.clone(),
                source_row: row.source_row,
                value: row.values.get(col_idx).cloned().unwrap_or_default(),
            });
        }
    }
    res
}

/// Separates the response records from the base/total records.
pub fn split_base_totals(
    records: Vec<MeltedRecord>,
    base_prefix: &str,
) -> (Vec<MeltedRecord>, Vec<BaseTotalRecord>) {
    let (bases, responses): (Vec<MeltedRecord>, Vec<MeltedRecord>) = records
        .into_iter()
        .partition(|r| r.response_category.starts_with(base_prefix));
    let bases = bases
        .into_iter()
        .map(|r| BaseTotalRecord {
            question_id: r.question_id,
            demographic_parameter: r.demographic_parameter,
            subgroup: r.subgroup,
            column: r.column,
            source_row: r.source_row,
            base_sub_total: r.value,
        })
        .collect();
    (responses, bases)
}

/// Attaches to each response record the base/total of its question and
/// subgroup.
///
/// A response without base/total is kept. Several base/totals for the same
/// response is a fault.
pub fn join_base_totals(
    responses: Vec<MeltedRecord>,
    bases: Vec<BaseTotalRecord>,
) -> Result<Vec<JoinedRecord>, TableErrors> {
    let mut index: HashMap<BaseKey, Vec<BaseTotalRecord>> = HashMap::new();
    for b in bases {
        index
            .entry(base_key(&b.question_id, &b.demographic_parameter, &b.subgroup))
            .or_insert_with(Vec::new)
            .push(b);
    }

    let mut res: Vec<JoinedRecord> = Vec::with_capacity(responses.len());
    for response in responses {
        let key = base_key(
            &response.question_id,
            &response.demographic_parameter,
            &response.subgroup,
        );
        let base = match index.get(&key).map(|v| v.as_slice()) {
            None | Some([]) => {
                debug!(
                    "join_base_totals: no base/total for {:?} (row {})",
                    key, response.source_row
                );
                None
            }
            Some([b]) => Some(b.clone()),
            Some(matches) => {
                return Err(TableErrors::AmbiguousBaseTotal {
                    question_id: response.question_id,
                    demographic_parameter: response.demographic_parameter,
                    subgroup: response.subgroup,
                    matches: matches.len(),
                });
            }
        };
        res.push(JoinedRecord { response, base });
    }
    Ok(res)
}

/// Reads the content of a count cell.
///
/// Returns `None` when the content is neither empty, nor a suppression marker,
/// nor a number. Thousands separators and spaces inside the number are
/// accepted.
pub fn classify_cell(raw: &str, suppression_markers: &[String]) -> Option<CellValue> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(CellValue::Missing);
    }
    if suppression_markers.iter().any(|m| m == s) {
        return Some(CellValue::Suppressed);
    }
    let cleaned: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(CellValue::Count)
}

/// Rounds to 2 decimals, using the exact binary value (ties to even).
pub fn round_ratio(x: f64) -> f64 {
    format!("{:.2}", x).parse::<f64>().unwrap_or(x)
}

/// The share of the base/total, in percent.
///
/// The ratio is rounded to 2 decimals before being scaled, and the result is
/// not rounded again.
pub fn compute_freq(responders_n: Option<f64>, base_sub_total: Option<f64>) -> Option<f64> {
    match (responders_n, base_sub_total) {
        (Some(n), Some(b)) if b != 0.0 => Some(round_ratio(n / b) * 100.0),
        _ => None,
    }
}

fn parse_value(
    raw: &str,
    question_id: &str,
    source_row: usize,
    column: &str,
    suppression_markers: &[String],
) -> Result<Option<f64>, TableErrors> {
    classify_cell(raw, suppression_markers)
        .map(|cv| cv.count())
        .ok_or_else(|| TableErrors::UnparseableValue {
            question_id: question_id.to_string(),
            source_row,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Parses the counts and computes the frequencies.
pub fn normalize_values(
    joined: Vec<JoinedRecord>,
    suppression_markers: &[String],
) -> Result<Vec<LongRecord>, TableErrors> {
    let mut res: Vec<LongRecord> = Vec::with_capacity(joined.len());
    for JoinedRecord { response, base } in joined {
        let responders_n = parse_value(
            &response.value,
            &response.question_id,
            response.source_row,
            &response.column,
            suppression_markers,
        )?;
        let base_sub_total = match base {
            Some(b) => parse_value(
                &b.base_sub_total,
                &b.question_id,
                b.source_row,
                &b.column,
                suppression_markers,
            )?,
            None => None,
        };
        let freq = compute_freq(responders_n, base_sub_total);
        if let Some(f) = freq {
            if !(0.0..=100.0).contains(&f) {
                warn!(
                    "normalize_values: sheet {} row {} column {}: frequency {} outside of [0, 100]",
                    response.question_id, response.source_row, response.column, f
                );
            }
        }
        res.push(LongRecord {
            question_id: response.question_id,
            response_category: response.response_category,
            demographic_parameter: response.demographic_parameter,
            subgroup: response.subgroup,
            responders_n,
            base_sub_total,
            freq,
        });
    }
    Ok(res)
}
