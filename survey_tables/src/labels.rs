use log::warn;
use std::collections::{BTreeSet, HashMap};

use crate::config::LongRecord;

/// The display label of the whole population. Used for the `overall`
/// parameter and for every record without a subgroup.
pub const OVERALL_LABEL: &str = "Overall Population";

pub static PARAMETER_LABELS: [(&str, &str); 10] = [
    ("overall", OVERALL_LABEL),
    ("gender", "Gender"),
    ("age", "Age"),
    ("income", "Household income"),
    ("region", "Region"),
    ("ethnicity", "Ethnicity"),
    ("disability", "Disability"),
    ("tenure", "Housing tenure"),
    ("employment", "Employment status"),
    ("education", "Education"),
];

pub static SUBGROUP_LABELS: [(&str, &str); 31] = [
    ("man", "Men"),
    ("woman", "Women"),
    ("16to24", "16-24"),
    ("25to34", "25-34"),
    ("35to44", "35-44"),
    ("45to54", "45-54"),
    ("55to64", "55-64"),
    ("65plus", "65+"),
    ("under20k", "Under £20,000"),
    ("20kto40k", "£20,000-£39,999"),
    ("40kto60k", "£40,000-£59,999"),
    ("over60k", "£60,000 or more"),
    ("north", "North"),
    ("midlands", "Midlands"),
    ("south", "South"),
    ("london", "London"),
    ("white", "White"),
    ("asian", "Asian"),
    ("black", "Black"),
    ("mixedother", "Mixed or other"),
    ("disabled", "Disabled"),
    ("nondisabled", "Not disabled"),
    ("owner", "Owner occupier"),
    ("renter", "Private renter"),
    ("social", "Social renter"),
    ("employed", "Employed"),
    ("unemployed", "Unemployed"),
    ("retired", "Retired"),
    ("student", "Student"),
    ("degree", "Degree or above"),
    ("nodegree", "Below degree"),
];

/// Maps the parameter and subgroup codes found in the column names to the
/// labels expected by the dashboards.
///
/// Codes without an entry are kept as they are.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LabelTables {
    parameters: HashMap<String, String>,
    subgroups: HashMap<String, String>,
}

impl Default for LabelTables {
    fn default() -> LabelTables {
        LabelTables {
            parameters: to_map(&PARAMETER_LABELS),
            subgroups: to_map(&SUBGROUP_LABELS),
        }
    }
}

fn to_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(code, label)| (code.to_string(), label.to_string()))
        .collect()
}

impl LabelTables {
    /// Adds entries on top of the current tables. The new entries win.
    pub fn merge(
        mut self,
        parameters: &HashMap<String, String>,
        subgroups: &HashMap<String, String>,
    ) -> LabelTables {
        self.parameters
            .extend(parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.subgroups
            .extend(subgroups.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn parameter_label(&self, code: &str) -> Option<&str> {
        self.parameters.get(code).map(|s| s.as_str())
    }

    pub fn subgroup_label(&self, code: &str) -> Option<&str> {
        self.subgroups.get(code).map(|s| s.as_str())
    }

    pub fn display_parameter(&self, code: &str) -> String {
        self.parameter_label(code).unwrap_or(code).to_string()
    }

    pub fn display_subgroup(&self, code: Option<&str>) -> String {
        match code {
            None => OVERALL_LABEL.to_string(),
            Some(c) => self.subgroup_label(c).unwrap_or(c).to_string(),
        }
    }
}

/// Replaces the codes by their display labels.
///
/// After this step, every record has a subgroup.
pub fn normalize_labels(records: Vec<LongRecord>, labels: &LabelTables) -> Vec<LongRecord> {
    let mut unmapped: BTreeSet<String> = BTreeSet::new();
    let res: Vec<LongRecord> = records
        .into_iter()
        .map(|r| {
            if labels.parameter_label(&r.demographic_parameter).is_none() {
                unmapped.insert(format!("parameter {}", r.demographic_parameter));
            }
            if let Some(sub) = r.subgroup.as_deref() {
                if labels.subgroup_label(sub).is_none() {
                    unmapped.insert(format!("subgroup {}", sub));
                }
            }
            LongRecord {
                demographic_parameter: labels.display_parameter(&r.demographic_parameter),
                subgroup: Some(labels.display_subgroup(r.subgroup.as_deref())),
                ..r
            }
        })
        .collect();
    for code in unmapped.iter() {
        warn!("normalize_labels: no display label for {}, keeping it", code);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(parameter: &str, subgroup: Option<&str>) -> LongRecord {
        LongRecord {
            question_id: "T1".to_string(),
            response_category: "Yes".to_string(),
            demographic_parameter: parameter.to_string(),
            subgroup: subgroup.map(|s| s.to_string()),
            responders_n: Some(10.0),
            base_sub_total: Some(20.0),
            freq: Some(50.0),
        }
    }

    #[test]
    fn gender_codes() {
        let res = normalize_labels(
            vec![record("gender", Some("man")), record("gender", Some("woman"))],
            &LabelTables::default(),
        );
        assert_eq!(res[0].demographic_parameter, "Gender");
        assert_eq!(res[0].subgroup.as_deref(), Some("Men"));
        assert_eq!(res[1].subgroup.as_deref(), Some("Women"));
    }

    #[test]
    fn overall_without_subgroup() {
        let res = normalize_labels(vec![record("overall", None)], &LabelTables::default());
        assert_eq!(res[0].demographic_parameter, OVERALL_LABEL);
        assert_eq!(res[0].subgroup.as_deref(), Some(OVERALL_LABEL));
    }

    #[test]
    fn unmapped_codes_pass_through() {
        let res = normalize_labels(
            vec![record("gender", Some("nonbinary")), record("sexuality", Some("gay"))],
            &LabelTables::default(),
        );
        assert_eq!(res[0].demographic_parameter, "Gender");
        assert_eq!(res[0].subgroup.as_deref(), Some("nonbinary"));
        assert_eq!(res[1].demographic_parameter, "sexuality");
        assert_eq!(res[1].subgroup.as_deref(), Some("gay"));
        // Values are untouched.
        assert_eq!(res[1].freq, Some(50.0));
    }

    #[test]
    fn merged_entries_win() {
        let params: HashMap<String, String> =
            [("gender".to_string(), "Sex".to_string())].into_iter().collect();
        let subs: HashMap<String, String> = [("nonbinary".to_string(), "Non-binary".to_string())]
            .into_iter()
            .collect();
        let labels = LabelTables::default().merge(&params, &subs);
        assert_eq!(labels.display_parameter("gender"), "Sex");
        assert_eq!(labels.display_subgroup(Some("nonbinary")), "Non-binary");
        assert_eq!(labels.display_subgroup(Some("man")), "Men");
    }
}
