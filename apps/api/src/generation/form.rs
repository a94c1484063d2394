//! The cover letter request form and its validation rules.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::generation::tone::Tone;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Field name → message. Ordered so responses are stable.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverLetterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    /// Comma-separated, as typed by the user.
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub tone: Tone,
}

impl CoverLetterForm {
    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let required = [
            ("job_title", &self.job_title, "Job title is required"),
            ("company_name", &self.company_name, "Company name is required"),
            ("job_description", &self.job_description, "Job description is required"),
            ("skills", &self.skills, "Skills are required"),
            ("experience", &self.experience, "Experience is required"),
            ("name", &self.name, "Your name is required"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.insert(field, message);
            }
        }

        let email = self.contact_email.trim();
        if email.is_empty() {
            errors.insert("contact_email", "Email is required");
        } else if !is_valid_email(email) {
            errors.insert("contact_email", "Please enter a valid email");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Skills split on commas, trimmed, blanks dropped.
    pub fn skills_list(&self) -> Vec<String> {
        self.skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
pub(crate) fn sample_form() -> CoverLetterForm {
    CoverLetterForm {
        name: "Ada Lovelace".to_string(),
        contact_email: "ada@example.com".to_string(),
        job_title: "Backend Engineer".to_string(),
        company_name: "Analytical Engines Ltd".to_string(),
        skills: "Rust, distributed systems,  , PostgreSQL".to_string(),
        experience: "6 years building payment infrastructure".to_string(),
        job_description: "We need someone to scale our ledger service.".to_string(),
        tone: Tone::Professional,
    }
}
