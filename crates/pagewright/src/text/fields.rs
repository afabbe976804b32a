//! Pattern-based field extraction for known form layouts.
//!
//! Each field is a regex whose `value` group holds the field text. The first match in
//! the transcript wins; a field with no match is reported as `null`.

use crate::plugins::{Capability, KeyValueExtractor};
use crate::types::FieldMap;
use crate::{PagewrightError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const VALUE_GROUP: &str = "value";

/// Form layouts with built-in field patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormProfile {
    /// Thesis or project evaluation sheet.
    EvaluationForm,
    /// Campus facilities survey.
    SurveyForm,
}

impl FormProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormProfile::EvaluationForm => "evaluation_form",
            FormProfile::SurveyForm => "survey_form",
        }
    }

    pub fn extractor(self) -> RegexFieldExtractor {
        let fields = match self {
            FormProfile::EvaluationForm => &*EVALUATION_FORM_FIELDS,
            FormProfile::SurveyForm => &*SURVEY_FORM_FIELDS,
        };
        RegexFieldExtractor {
            name: self.as_str().to_string(),
            fields: fields.clone(),
        }
    }
}

impl fmt::Display for FormProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormProfile {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "evaluation_form" => Ok(FormProfile::EvaluationForm),
            "survey_form" => Ok(FormProfile::SurveyForm),
            _ => Err(PagewrightError::validation(format!("Unknown form profile: {}", s))),
        }
    }
}

fn compile(fields: &[(&str, &str)]) -> Vec<(String, Regex)> {
    fields
        .iter()
        .map(|(name, pattern)| {
            let regex = Regex::new(pattern).expect("Built-in form field patterns are valid and should compile");
            (name.to_string(), regex)
        })
        .collect()
}

static EVALUATION_FORM_FIELDS: Lazy<Vec<(String, Regex)>> = Lazy::new(|| {
    compile(&[
        (
            "name",
            r"(?i)Student\s*\(Name\)\s*:\s*(?P<value>[A-Za-z\s.\-']+?)(?:\s*Roll\s*No|Supervisor|Thesis|Project|Credit|$)",
        ),
        ("roll_no", r"(?i)Roll\s*No\.?\s*[:\-]?\s*(?P<value>[0-9a-zA-Z]+)"),
        (
            "total_marks",
            r"(?i)Total\s*Marks\s*Obtained\s*\(in\s*words\)\s*[:\-]?\s*(?P<value>[A-Za-z\s\-]+?)[.\n\r]*(?:Comments|Suggestions|Examiner|Name|Signature|$)",
        ),
        (
            "suggestions",
            r"(?i)Suggestions\s*&?\s*recommendations?\s*[:\-]?\s*(?P<value>[\s\S]*?)\s*(?:Examiner|Name\s*:|Signature|Date|$)",
        ),
        (
            "examiner_name",
            r"(?i)Examiner\s*:?\s*(?:Name\s*:?)?\s*(?P<value>[A-Za-z\s.\-]+?)\s*(?:Organization|Designation|Date|Signature|$)",
        ),
    ])
});

static SURVEY_FORM_FIELDS: Lazy<Vec<(String, Regex)>> = Lazy::new(|| {
    compile(&[
        ("Name", r"(?is)\bname\b[^a-zA-Z0-9]*\s*(?P<value>[A-Z][a-z]+\s+[A-Z][a-z]+)"),
        ("Roll No", r"(?is)\broll\s*no\.?\b[^a-zA-Z0-9]*\s*(?P<value>[A-Z0-9/]+)"),
        ("Department", r"(?is)\bdepartment\b[^a-zA-Z0-9]*\s*(?P<value>[\w\s&().]+)"),
        (
            "Food Service Satisfaction",
            r"(?is)\bfood\s*service\b[^a-zA-Z0-9]*.*?(?:how\s+satisfied\s+are\s+you\??)?[^a-zA-Z0-9]*\s*(?P<value>.+?)(?:\n|library|hostel|sports|wifi|internet|$)",
        ),
        (
            "Library Resources",
            r"(?is)\blibrary\b.*?(?:resources|sufficient)?[^a-zA-Z0-9]*\s*(?P<value>.+?)(?:\n|hostel|sports|wifi|internet|suggestions|$)",
        ),
        (
            "Hostel Maintenance",
            r"(?is)\bhostel\b.*?(?:maintained)?[^a-zA-Z0-9]*\s*(?P<value>.+?)(?:\n|sports|wifi|internet|suggestions|$)",
        ),
        (
            "Sports & Recreation",
            r"(?is)(?:sports|recreation)\b.*?(?:facilities|available)?[^a-zA-Z0-9]*\s*(?P<value>.+?)(?:\n|internet|wifi|suggestions|$)",
        ),
        (
            "Internet Reliability",
            r"(?is)\b(?:internet|wifi)\b.*?(?:connection|reliable)?[^a-zA-Z0-9]*\s*(?P<value>.+?)(?:\n|suggestions|$)",
        ),
        (
            "Suggestions",
            r"(?is)\bsuggestions\b.*?(?:improvement)?[^a-zA-Z0-9]*\s*(?P<value>.+?)(?:thank\s+you|\z)",
        ),
    ])
});

/// Extracts a fixed set of named fields with regular expressions.
#[derive(Debug, Clone)]
pub struct RegexFieldExtractor {
    name: String,
    fields: Vec<(String, Regex)>,
}

impl RegexFieldExtractor {
    /// Build an extractor from `(field, pattern)` pairs. Every pattern needs a
    /// `(?P<value>...)` group.
    pub fn new<N, P>(name: impl Into<String>, fields: impl IntoIterator<Item = (N, P)>) -> Result<Self>
    where
        N: Into<String>,
        P: AsRef<str>,
    {
        let fields = fields
            .into_iter()
            .map(|(field, pattern)| {
                let field = field.into();
                let regex = Regex::new(pattern.as_ref()).map_err(|e| {
                    PagewrightError::validation(format!("Invalid pattern for field {}: {}", field, e))
                })?;
                if !regex.capture_names().any(|n| n == Some(VALUE_GROUP)) {
                    return Err(PagewrightError::validation(format!(
                        "Pattern for field {} has no `{}` group",
                        field, VALUE_GROUP
                    )));
                }
                Ok((field, regex))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.into(),
            fields,
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Every configured field, trimmed, or `null` when its pattern does not match.
    pub fn extract(&self, text: &str) -> FieldMap {
        self.fields
            .iter()
            .map(|(field, regex)| {
                let value = regex
                    .captures(text)
                    .and_then(|caps| caps.name(VALUE_GROUP))
                    .map(|m| Value::String(m.as_str().trim().to_string()))
                    .unwrap_or(Value::Null);
                (field.clone(), value)
            })
            .collect()
    }
}

impl Capability for RegexFieldExtractor {
    fn name(&self) -> &str {
        &self.name
    }
}

impl KeyValueExtractor for RegexFieldExtractor {
    fn extract_fields(&self, text: &str) -> Option<FieldMap> {
        let fields = self.extract(text);
        fields.values().any(|v| !v.is_null()).then_some(fields)
    }
}
