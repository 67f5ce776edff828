// Rendering of the long table.

use crate::survey::*;

pub const OUTPUT_HEADER: [&str; 7] = [
    "question_number",
    "response_category",
    "demographic_parameter",
    "subgroup",
    "responders_n",
    "base_sub_total",
    "freq",
];

/// Shortest representation that reads back to the same value, always with a
/// decimal part. Missing values are empty.
pub fn format_value(x: Option<f64>) -> String {
    match x {
        Some(v) => format!("{:?}", v),
        None => String::new(),
    }
}

pub fn render_long_csv(records: &[LongRecord]) -> SurveyResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record(OUTPUT_HEADER).context(CsvWriteSnafu {})?;
    for r in records.iter() {
        wtr.write_record(&[
            r.question_id.clone(),
            r.response_category.clone(),
            r.demographic_parameter.clone(),
            r.subgroup.clone().unwrap_or_default(),
            format_value(r.responders_n),
            format_value(r.base_sub_total),
            format_value(r.freq),
        ])
        .context(CsvWriteSnafu {})?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .context(FlushingOutputSnafu {})?;
    let rendered = whatever!(String::from_utf8(bytes), "The output table is not valid UTF-8");
    Ok(rendered)
}

/// Fails if the file could not be created because its directory is missing.
pub fn check_destination(dest: &str) -> SurveyResult<()> {
    if dest == "stdout" {
        return Ok(());
    }
    match Path::new(dest).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            MissingOutputDirSnafu { path: dest }.fail()
        }
        _ => Ok(()),
    }
}

/// Writes the content to a file, or to the standard output for `stdout`.
pub fn write_output(dest: &str, content: &str) -> SurveyResult<()> {
    if dest == "stdout" {
        print!("{}", content);
    } else {
        fs::write(dest, content).context(WritingOutputSnafu { path: dest })?;
        info!("Wrote {} bytes to {:?}", content.len(), dest);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values() {
        assert_eq!(format_value(Some(35.0)), "35.0");
        assert_eq!(format_value(Some(0.29 * 100.0)), "28.999999999999996");
        assert_eq!(format_value(Some(1234.5)), "1234.5");
        assert_eq!(format_value(None), "");
    }

    #[test]
    fn destinations() {
        assert!(check_destination("stdout").is_ok());
        assert!(check_destination("table.csv").is_ok());
        let tmp = std::env::temp_dir().join("table.csv").display().to_string();
        assert!(check_destination(&tmp).is_ok());
        assert!(matches!(
            check_destination("/no_such_surveytab_dir/table.csv"),
            Err(SurveyError::MissingOutputDir { .. })
        ));
    }

    #[test]
    fn render() {
        let records = vec![LongRecord {
            question_id: "T1".to_string(),
            response_category: "Yes, often".to_string(),
            demographic_parameter: "Household income".to_string(),
            subgroup: Some("£20,000-£39,999".to_string()),
            responders_n: Some(12.0),
            base_sub_total: None,
            freq: None,
        }];
        let rendered = render_long_csv(&records).unwrap();
        assert_eq!(
            rendered,
            "question_number,response_category,demographic_parameter,subgroup,responders_n,base_sub_total,freq\n\
             T1,\"Yes, often\",Household income,\"£20,000-£39,999\",12.0,,\n"
        );
    }
}
