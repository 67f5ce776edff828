/*!

This is the long-form manual for `survey_tables` and `surveytab`.

## What it does

A survey export arrives as one spreadsheet with one sheet per question. Each
sheet is a crosstab: one row per response option and one column per
demographic subgroup, with counts in the cells. `surveytab` turns all of them
into a single long table, one row per (question, response, subgroup), with
the share of the subgroup that gave this response.

## Sheet layout

Every sheet must follow the same layout:

| row        | label              | overall | mode_online | gender_man | gender_woman | ... |
|------------|--------------------|---------|-------------|------------|--------------|-----|
| 1..15      | (title, notes)     |         |             |            |              |     |
| 16         | Base: all adults   | 2000    | 800         | 950        | 1050         |     |
| 17         | Agree              | 1,200   | 500         | 600        | 600          |     |
| 18         | Disagree           | 700     | -           | 300        | *            |     |
| 19         | Prefer not to say  | 100     | 40          | 50         | 50           |     |
| 20         | Source: ...        |         |             |            |              |     |

- the first 15 rows are skipped (`headerRowCount`)
- the column names are not read from the sheet. They come from the schema
  (`columns`), in order. The default schema has 37 columns.
- columns starting with `mode` describe how the survey was taken and are dropped
- rows with an empty label are dropped
- the sheet ends before the first `Prefer not to say` row. A sheet without
  this row is rejected.
- rows whose label starts with `Base` hold the denominators of the sheet.
  There must be at most one per question.
- `-`, `*` and `**` mark withheld counts. They become missing values, never
  zeros. Empty cells are missing values as well.
- counts may contain thousands separators (`1,200`)

A column name is split on its first underscore into a demographic parameter
and a subgroup: `age_16to24` is the subgroup `16to24` of the parameter `age`.
A name without underscore, such as `overall`, has no subgroup.

## Output

A UTF-8 CSV file with a header:

```text
question_number,response_category,demographic_parameter,subgroup,responders_n,base_sub_total,freq
T1,Agree,Overall Population,Overall Population,1200.0,2000.0,60.0
T1,Agree,Gender,Men,600.0,950.0,63.0
```

`freq` is `round(responders_n / base_sub_total, 2) * 100`. The ratio is
rounded, not the percentage, so some values carry floating point noise
(`28.999999999999996`). It is empty when a count is missing or the base is 0.

The parameter and subgroup codes are replaced by display labels (`man` becomes
`Men`). Codes without label are written as they are.

## Input formats

### `xlsx`

An Excel workbook with one worksheet per question. The worksheet of a question
has the name of the question (`T1`) unless `worksheetNames` says otherwise.

### `csv`

A directory with one CSV file per question, named after the worksheet name
(`T1.csv`). The files have the same layout as the worksheets, header rows
included.

## Configuration

`surveytab` accepts a configuration file in JSON. Only `sourceFile` and
`questions` are required:

```text
{
  "outputSettings": {
    "surveyName": "Transport survey 2023",
    "outputPath": "survey_long.csv",
    "summaryPath": "survey_summary.json"
  },
  "sourceFile": {
    "provider": "xlsx",
    "filePath": "transport_survey.xlsx",
    "headerRowCount": 15,
    "worksheetNames": { "T1": "Table 1" }
  },
  "questions": ["T1", "T2", "T3", "T4", "T5"],
  "rules": {
    "sentinelLabel": "Prefer not to say",
    "basePrefix": "Base",
    "droppedColumnPrefix": "mode",
    "suppressionMarkers": ["-", "*", "**"]
  },
  "labels": {
    "parameters": { "sexuality": "Sexual orientation" },
    "subgroups": { "nonbinary": "Non-binary" }
  }
}
```

Paths are relative to the directory of the configuration file. The options
given on the command line take precedence over the configuration file.

 */
