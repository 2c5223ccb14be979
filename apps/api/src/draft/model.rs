use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a list entry. Generated client- or server-side and
/// never derived from the entry's position in its list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn generate() -> Self {
        EntryId(Uuid::new_v4().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        EntryId(value.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Draft document
// ────────────────────────────────────────────────────────────────────────────

/// The resume document being edited.
///
/// Every field defaults, so a partial stored payload deserializes into a
/// total draft with all top-level keys present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeDraft {
    pub personal_details: PersonalDetails,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Skills,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<CertificationEntry>,
    pub achievements: Vec<AchievementEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub summary: String,
}

impl PersonalDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Partial update for [`PersonalDetails`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonalDetailsPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub id: EntryId,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub id: EntryId,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub gpa: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub id: EntryId,
    pub name: String,
    pub description: String,
    pub url: String,
    pub technologies: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationEntry {
    pub id: EntryId,
    pub name: String,
    pub issuer: String,
    pub start_date: String,
    /// Expiry date; ignored while `current` (no expiry) is set.
    pub end_date: String,
    pub current: bool,
    pub credential_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementEntry {
    pub id: EntryId,
    pub title: String,
    pub description: String,
    pub year: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub technical_skills: Vec<String>,
    pub tools: Vec<String>,
    pub frameworks: Vec<String>,
    pub languages: Vec<String>,
    pub soft_skills: Vec<String>,
}

impl Skills {
    pub fn get(&self, category: SkillCategory) -> &[String] {
        match category {
            SkillCategory::TechnicalSkills => &self.technical_skills,
            SkillCategory::Tools => &self.tools,
            SkillCategory::Frameworks => &self.frameworks,
            SkillCategory::Languages => &self.languages,
            SkillCategory::SoftSkills => &self.soft_skills,
        }
    }

    pub fn get_mut(&mut self, category: SkillCategory) -> &mut Vec<String> {
        match category {
            SkillCategory::TechnicalSkills => &mut self.technical_skills,
            SkillCategory::Tools => &mut self.tools,
            SkillCategory::Frameworks => &mut self.frameworks,
            SkillCategory::Languages => &mut self.languages,
            SkillCategory::SoftSkills => &mut self.soft_skills,
        }
    }

    pub fn is_empty(&self) -> bool {
        SkillCategory::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    TechnicalSkills,
    Tools,
    Frameworks,
    Languages,
    SoftSkills,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 5] = [
        SkillCategory::TechnicalSkills,
        SkillCategory::Tools,
        SkillCategory::Frameworks,
        SkillCategory::Languages,
        SkillCategory::SoftSkills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::TechnicalSkills => "technical_skills",
            SkillCategory::Tools => "tools",
            SkillCategory::Frameworks => "frameworks",
            SkillCategory::Languages => "languages",
            SkillCategory::SoftSkills => "soft_skills",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SkillCategory::TechnicalSkills => "Technical Skills",
            SkillCategory::Tools => "Tools",
            SkillCategory::Frameworks => "Frameworks",
            SkillCategory::Languages => "Languages",
            SkillCategory::SoftSkills => "Soft Skills",
        }
    }
}

impl FromStr for SkillCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown skill category '{s}'"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// List sections
// ────────────────────────────────────────────────────────────────────────────

/// The list-valued sections of a draft, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSection {
    Education,
    Experience,
    Projects,
    Certifications,
    Achievements,
}

impl DraftSection {
    pub const ALL: [DraftSection; 5] = [
        DraftSection::Experience,
        DraftSection::Education,
        DraftSection::Projects,
        DraftSection::Certifications,
        DraftSection::Achievements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftSection::Education => "education",
            DraftSection::Experience => "experience",
            DraftSection::Projects => "projects",
            DraftSection::Certifications => "certifications",
            DraftSection::Achievements => "achievements",
        }
    }
}

impl FromStr for DraftSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DraftSection::ALL
            .into_iter()
            .find(|sec| sec.as_str() == s)
            .ok_or_else(|| format!("Unknown section '{s}'"))
    }
}

/// Common behaviour of every list entry type.
pub trait SectionEntry: Clone + Serialize + serde::de::DeserializeOwned {
    fn id(&self) -> &EntryId;
    fn set_id(&mut self, id: EntryId);

    /// The end date a consumer should honour. `None` while the entry is
    /// marked current, whatever value is stored.
    fn effective_end_date(&self) -> Option<&str> {
        None
    }
}

macro_rules! dated_entry {
    ($ty:ty) => {
        impl SectionEntry for $ty {
            fn id(&self) -> &EntryId {
                &self.id
            }

            fn set_id(&mut self, id: EntryId) {
                self.id = id;
            }

            fn effective_end_date(&self) -> Option<&str> {
                if self.current || self.end_date.trim().is_empty() {
                    None
                } else {
                    Some(self.end_date.as_str())
                }
            }
        }
    };
}

dated_entry!(ExperienceEntry);
dated_entry!(EducationEntry);
dated_entry!(ProjectEntry);
dated_entry!(CertificationEntry);

impl SectionEntry for AchievementEntry {
    fn id(&self) -> &EntryId {
        &self.id
    }

    fn set_id(&mut self, id: EntryId) {
        self.id = id;
    }
}
