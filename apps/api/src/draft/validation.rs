use serde::{Deserialize, Serialize};

use crate::draft::model::{ResumeDraft, SectionEntry};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldIssue {
    /// Dotted path to the field, e.g. `experience.<id>.company`.
    pub path: String,
    pub message: String,
}

/// Advisory report. Saving never waits on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftValidationReport {
    pub passed: bool,
    pub issues: Vec<FieldIssue>,
}

struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn require(&mut self, value: &str, path: String, label: &str) {
        if value.trim().is_empty() {
            self.push(path, format!("{label} is required"));
        }
    }

    fn url(&mut self, value: &str, path: String) {
        if !value.trim().is_empty() && !is_url(value) {
            self.push(path, "Must be a valid URL");
        }
    }

    fn date_range(&mut self, start: &str, end: Option<&str>, path: String) {
        let (Some(start), Some(end)) = (sortable_date(start), end.and_then(sortable_date)) else {
            return;
        };
        if end < start {
            self.push(path, "End date is before start date");
        }
    }
}

/// Checks the draft against the editor's form rules.
pub fn validate_draft(draft: &ResumeDraft) -> DraftValidationReport {
    let mut issues = Issues(Vec::new());
    let pd = &draft.personal_details;

    issues.require(&pd.first_name, "personal_details.first_name".into(), "First name");
    issues.require(&pd.last_name, "personal_details.last_name".into(), "Last name");
    if !is_email(&pd.email) {
        issues.push("personal_details.email", "Valid email is required");
    }
    issues.url(&pd.linkedin_url, "personal_details.linkedin_url".into());
    issues.url(&pd.portfolio_url, "personal_details.portfolio_url".into());

    for exp in &draft.experience {
        let base = format!("experience.{}", exp.id);
        issues.require(&exp.company, format!("{base}.company"), "Company name");
        issues.require(&exp.position, format!("{base}.position"), "Position");
        issues.require(&exp.start_date, format!("{base}.start_date"), "Start date");
        issues.date_range(&exp.start_date, exp.effective_end_date(), format!("{base}.end_date"));
    }

    for edu in &draft.education {
        let base = format!("education.{}", edu.id);
        issues.require(&edu.institution, format!("{base}.institution"), "Institution");
        issues.require(&edu.degree, format!("{base}.degree"), "Degree");
        issues.require(&edu.start_date, format!("{base}.start_date"), "Start date");
        issues.date_range(&edu.start_date, edu.effective_end_date(), format!("{base}.end_date"));
    }

    for project in &draft.projects {
        let base = format!("projects.{}", project.id);
        issues.require(&project.name, format!("{base}.name"), "Project name");
        issues.url(&project.url, format!("{base}.url"));
        issues.date_range(
            &project.start_date,
            project.effective_end_date(),
            format!("{base}.end_date"),
        );
    }

    for cert in &draft.certifications {
        let base = format!("certifications.{}", cert.id);
        issues.require(&cert.name, format!("{base}.name"), "Certification name");
        issues.url(&cert.credential_url, format!("{base}.credential_url"));
        issues.date_range(&cert.start_date, cert.effective_end_date(), format!("{base}.end_date"));
    }

    for achievement in &draft.achievements {
        issues.require(
            &achievement.title,
            format!("achievements.{}.title", achievement.id),
            "Title",
        );
    }

    DraftValidationReport {
        passed: issues.0.is_empty(),
        issues: issues.0,
    }
}

fn is_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !value.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_url(value: &str) -> bool {
    let value = value.trim();
    ["https://", "http://"]
        .iter()
        .any(|scheme| value.len() > scheme.len() && value.starts_with(scheme))
        && !value.contains(char::is_whitespace)
}

/// Accepts `YYYY`, `YYYY-MM` or `YYYY-MM-DD`; the result compares
/// chronologically as a string.
fn sortable_date(value: &str) -> Option<String> {
    let value = value.trim();
    let parts: Vec<&str> = value.split('-').collect();
    let well_formed = match parts.as_slice() {
        [y] => y.len() == 4,
        [y, m] => y.len() == 4 && m.len() == 2,
        [y, m, d] => y.len() == 4 && m.len() == 2 && d.len() == 2,
        _ => false,
    } && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return None;
    }
    let mut padded = parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    while padded.len() < 3 {
        padded.push("00".to_string());
    }
    Some(padded.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::model::{EntryId, ExperienceEntry, PersonalDetails};

    fn valid_personal() -> PersonalDetails {
        PersonalDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_draft_flags_required_personal_fields() {
        let r = validate_draft(&ResumeDraft::default());
        assert!(!r.passed);
        let paths: Vec<_> = r.issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"personal_details.first_name"));
        assert!(paths.contains(&"personal_details.last_name"));
        assert!(paths.contains(&"personal_details.email"));
    }

    #[test]
    fn test_valid_personal_details_pass() {
        let draft = ResumeDraft {
            personal_details: valid_personal(),
            ..Default::default()
        };
        assert!(validate_draft(&draft).passed);
    }

    #[test]
    fn test_bad_links_flagged() {
        let mut pd = valid_personal();
        pd.linkedin_url = "linkedin.com/in/ada".to_string();
        pd.portfolio_url = "https://ada.dev".to_string();
        let r = validate_draft(&ResumeDraft {
            personal_details: pd,
            ..Default::default()
        });
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].path, "personal_details.linkedin_url");
    }

    #[test]
    fn test_experience_requires_core_fields() {
        let draft = ResumeDraft {
            personal_details: valid_personal(),
            experience: vec![ExperienceEntry {
                id: EntryId::from("e1"),
                ..Default::default()
            }],
            ..Default::default()
        };
        let r = validate_draft(&draft);
        assert_eq!(r.issues.len(), 3);
        assert!(r.issues.iter().all(|i| i.path.starts_with("experience.e1.")));
    }

    #[test]
    fn test_end_before_start_ignored_when_current() {
        let mut exp = ExperienceEntry {
            id: EntryId::from("e1"),
            company: "A".to_string(),
            position: "B".to_string(),
            start_date: "2022-05".to_string(),
            end_date: "2021-01".to_string(),
            current: false,
            ..Default::default()
        };
        let draft = |exp: ExperienceEntry| ResumeDraft {
            personal_details: valid_personal(),
            experience: vec![exp],
            ..Default::default()
        };
        let r = validate_draft(&draft(exp.clone()));
        assert_eq!(r.issues[0].path, "experience.e1.end_date");

        exp.current = true;
        assert!(validate_draft(&draft(exp)).passed);
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a b@c.de"));
    }

    #[test]
    fn test_sortable_date_formats() {
        assert_eq!(sortable_date("2021"), Some("2021-00-00".to_string()));
        assert_eq!(sortable_date("2021-03"), Some("2021-03-00".to_string()));
        assert_eq!(sortable_date("March 2021"), None);
    }
}
