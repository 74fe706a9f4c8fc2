//! Result rows returned by the search backend, and the projection from the
//! backend's JSON table into [`SearchOutcome`].
//!
//! The backend is a dataframe-producing service, so cells are decoded
//! leniently: NaN arrives as `null`, scores may be floats or strings, and list
//! columns are occasionally flattened to a single string.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Link value the backend uses when a posting has no apply URL.
pub const MISSING_LINK: &str = "N/A";
/// Descriptions longer than this many characters are cut and get `...`.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 300;

/// One row of the backend's result table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMatchResult {
    #[serde(rename = "Job_title", default, deserialize_with = "text")]
    pub title: String,
    #[serde(rename = "Job_company", default, deserialize_with = "text")]
    pub company: String,
    #[serde(rename = "Job_location", default, deserialize_with = "text")]
    pub location: String,
    #[serde(rename = "Job_Type", default, deserialize_with = "text")]
    pub job_type: String,
    #[serde(rename = "Post_date", default, deserialize_with = "text")]
    pub post_date: String,
    #[serde(rename = "Post_link", default, deserialize_with = "text")]
    pub post_link: String,
    #[serde(rename = "Job_description", default, deserialize_with = "text")]
    pub description: String,
    #[serde(default, deserialize_with = "score")]
    pub score: u32,
    #[serde(default, deserialize_with = "text")]
    pub match_summary: String,
    #[serde(rename = "JD_exp", default, deserialize_with = "text")]
    pub jd_experience: String,
    #[serde(rename = "candidate_exp", default, deserialize_with = "text")]
    pub candidate_experience: String,
    #[serde(default, deserialize_with = "text_list")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub drawbacks: Vec<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub priority_needs: Vec<String>,
    #[serde(default, deserialize_with = "text")]
    pub domain: String,
    #[serde(default, deserialize_with = "text")]
    pub sponsorship: String,
}

impl JobMatchResult {
    /// The apply URL. `None` for the `N/A` sentinel, empty links and anything
    /// that is not an http(s) URL.
    pub fn apply_link(&self) -> Option<&str> {
        let link = self.post_link.trim();
        if link == MISSING_LINK {
            return None;
        }
        let is_web = ["http://", "https://"].iter().any(|scheme| {
            link.len() > scheme.len()
                && link
                    .get(..scheme.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        });
        is_web.then_some(link)
    }

    pub fn description_preview(&self) -> Cow<'_, str> {
        truncate_description(&self.description)
    }
}

/// First 300 characters of a description, with `...` only when something
/// was cut. Counts characters, not bytes.
pub fn truncate_description(description: &str) -> Cow<'_, str> {
    match description.char_indices().nth(DESCRIPTION_PREVIEW_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &description[..cut])),
        None => Cow::Borrowed(description),
    }
}

/// What a finished search produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Rows in the order the backend returned them.
    Table(Vec<JobMatchResult>),
    NoJobs,
}

impl SearchOutcome {
    /// Projects a backend JSON payload onto an outcome.
    ///
    /// Accepts the records orientation (`[{..}, {..}]`) and the split
    /// orientation (`{"columns": [..], "data": [[..], ..]}`). Anything else
    /// that is not a table, including `null` and `false`, means no jobs.
    pub fn from_table(value: Value) -> Result<Self, serde_json::Error> {
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Object(map) => match split_rows(map)? {
                Some(rows) => rows,
                None => return Ok(SearchOutcome::NoJobs),
            },
            _ => return Ok(SearchOutcome::NoJobs),
        };

        if rows.is_empty() || !rows.iter().all(Value::is_object) {
            return Ok(SearchOutcome::NoJobs);
        }

        let rows = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<JobMatchResult>, _>>()?;
        Ok(SearchOutcome::Table(rows))
    }

    pub fn len(&self) -> usize {
        match self {
            SearchOutcome::Table(rows) => rows.len(),
            SearchOutcome::NoJobs => 0,
        }
    }
}

/// Rows of a split-orientation table as records. `Ok(None)` when the object
/// is not a split table; a row whose width differs from `columns` is an error.
fn split_rows(mut map: Map<String, Value>) -> Result<Option<Vec<Value>>, serde_json::Error> {
    use serde::de::Error;

    let Some(Value::Array(cols)) = map.remove("columns") else {
        return Ok(None);
    };
    let Some(columns) = cols
        .into_iter()
        .map(|c| match c {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect::<Option<Vec<String>>>()
    else {
        return Ok(None);
    };
    let Some(Value::Array(data)) = map.remove("data") else {
        return Ok(None);
    };

    let mut rows = Vec::with_capacity(data.len());
    for (index, row) in data.into_iter().enumerate() {
        let Value::Array(cells) = row else {
            return Ok(None);
        };
        if cells.len() != columns.len() {
            return Err(serde_json::Error::custom(format!(
                "row {index} has {} cells but the table has {} columns",
                cells.len(),
                columns.len()
            )));
        }
        rows.push(Value::Object(columns.iter().cloned().zip(cells).collect()));
    }
    Ok(Some(rows))
}

fn cell_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        other => other.to_string(),
    }
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(cell_to_text(Value::deserialize(deserializer)?))
}

fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(cell_to_text)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let single = cell_to_text(other);
            if single.trim().is_empty() {
                Vec::new()
            } else {
                vec![single]
            }
        }
    })
}

fn score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("score out of range: {n}")))?,
        Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("score is not numeric: '{s}'")))?
        }
        other => return Err(D::Error::custom(format!("unexpected score value: {other}"))),
    };

    if raw.is_nan() {
        return Ok(0);
    }
    Ok(raw.round().clamp(0.0, 100.0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_row() -> Value {
        json!({
            "Job_title": "Data Engineer",
            "Job_company": "Acme",
            "Job_location": "Austin, TX",
            "Job_Type": "Full-time",
            "Post_date": "2 hours ago",
            "Post_link": "https://www.linkedin.com/jobs/view/1",
            "Job_description": "Build pipelines.",
            "score": 78,
            "match_summary": "Strong pipeline background",
            "JD_exp": "3+ years",
            "candidate_exp": "4 years",
            "strengths": ["Spark", "Airflow"],
            "drawbacks": ["No Scala"],
            "priority_needs": ["Kafka"],
            "domain": "Fintech",
            "sponsorship": "Not mentioned"
        })
    }

    #[test]
    fn test_records_orientation_preserves_order() {
        let mut second = full_row();
        second["Job_title"] = json!("ML Engineer");
        second["score"] = json!(91);

        let outcome = SearchOutcome::from_table(json!([full_row(), second])).unwrap();
        let SearchOutcome::Table(rows) = outcome else {
            panic!("expected a table");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Data Engineer");
        assert_eq!(rows[0].score, 78);
        assert_eq!(rows[1].title, "ML Engineer");
        assert_eq!(rows[1].score, 91);
        assert_eq!(rows[0].strengths, vec!["Spark", "Airflow"]);
    }

    #[test]
    fn test_split_orientation_matches_records() {
        let split = json!({
            "columns": ["Job_title", "Job_company", "score", "strengths"],
            "index": [0],
            "data": [["Data Engineer", "Acme", 78, ["Spark", "Airflow"]]]
        });
        let SearchOutcome::Table(rows) = SearchOutcome::from_table(split).unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Data Engineer");
        assert_eq!(rows[0].company, "Acme");
        assert_eq!(rows[0].score, 78);
        assert_eq!(rows[0].strengths, vec!["Spark", "Airflow"]);
        assert_eq!(rows[0].post_link, "");
    }

    #[test]
    fn test_non_table_values_mean_no_jobs() {
        for value in [
            json!(null),
            json!(false),
            json!([]),
            json!(0),
            json!("no results"),
            json!({"message": "nothing"}),
            json!([1, 2, 3]),
        ] {
            assert_eq!(
                SearchOutcome::from_table(value.clone()).unwrap(),
                SearchOutcome::NoJobs,
                "value {value} should be treated as no jobs"
            );
        }
    }

    #[test]
    fn test_lenient_cells() {
        let row = json!({
            "Job_title": "Analyst",
            "score": "64.6",
            "strengths": "SQL",
            "drawbacks": null,
            "priority_needs": ["", "Tableau"],
            "sponsorship": false,
            "domain": null
        });
        let SearchOutcome::Table(rows) = SearchOutcome::from_table(json!([row])).unwrap() else {
            panic!("expected a table");
        };
        let row = &rows[0];
        assert_eq!(row.score, 65);
        assert_eq!(row.strengths, vec!["SQL"]);
        assert!(row.drawbacks.is_empty());
        assert_eq!(row.priority_needs, vec!["Tableau"]);
        assert_eq!(row.sponsorship, "No");
        assert_eq!(row.domain, "");
    }

    #[test]
    fn test_score_is_clamped_and_percent_tolerated() {
        let rows = json!([{"score": 140.0}, {"score": "-3"}, {"score": "88%"}]);
        let SearchOutcome::Table(rows) = SearchOutcome::from_table(rows).unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(rows[0].score, 100);
        assert_eq!(rows[1].score, 0);
        assert_eq!(rows[2].score, 88);
    }

    #[test]
    fn test_non_numeric_score_is_error() {
        assert!(SearchOutcome::from_table(json!([{"score": "high"}])).is_err());
    }

    #[test]
    fn test_apply_link_suppressed_for_sentinel_and_empty() {
        let mut row: JobMatchResult = serde_json::from_value(full_row()).unwrap();
        assert_eq!(row.apply_link(), Some("https://www.linkedin.com/jobs/view/1"));

        row.post_link = MISSING_LINK.to_string();
        assert_eq!(row.apply_link(), None);

        row.post_link = String::new();
        assert_eq!(row.apply_link(), None);
    }

    #[test]
    fn test_apply_link_requires_web_scheme() {
        let mut row = JobMatchResult::default();
        for link in [
            "javascript:alert(document.cookie)",
            " JAVASCRIPT:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "vbscript:msgbox",
            "//evil.example/apply",
            "https://",
            "www.linkedin.com/jobs/view/1",
        ] {
            row.post_link = link.to_string();
            assert_eq!(row.apply_link(), None, "{link} should not be linkable");
        }

        row.post_link = "HTTP://jobs.example.com/42".to_string();
        assert_eq!(row.apply_link(), Some("HTTP://jobs.example.com/42"));
        row.post_link = " https://www.linkedin.com/jobs/view/1 ".to_string();
        assert_eq!(row.apply_link(), Some("https://www.linkedin.com/jobs/view/1"));
    }

    #[test]
    fn test_split_row_width_mismatch_is_error() {
        let short = json!({
            "columns": ["Job_title", "Job_company", "score"],
            "data": [["Data Engineer", "Acme", 78], ["ML Engineer", 91]]
        });
        let err = SearchOutcome::from_table(short).unwrap_err();
        assert!(err.to_string().contains("row 1 has 2 cells"));

        let long = json!({
            "columns": ["Job_title"],
            "data": [["Data Engineer", "Acme"]]
        });
        assert!(SearchOutcome::from_table(long).is_err());
    }

    #[test]
    fn test_truncate_description_boundaries() {
        let exact = "a".repeat(300);
        assert_eq!(truncate_description(&exact), exact.as_str());

        let over = "a".repeat(301);
        assert_eq!(truncate_description(&over), format!("{}...", exact));

        let wide = "é".repeat(310);
        let cut = truncate_description(&wide);
        assert_eq!(cut.chars().count(), 303);
        assert!(cut.ends_with("..."));
    }
}
