//! Single-writer editing operations over a [`ResumeDraft`].
//!
//! List operations key off the entry id, never off array position. Removed
//! ids are retired for the lifetime of the editor and cannot come back.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::draft::model::{
    DraftSection, EntryId, PersonalDetailsPatch, ResumeDraft, SectionEntry, SkillCategory,
};

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("Entry {id} already exists in {section}")]
    DuplicateEntryId { section: &'static str, id: EntryId },

    #[error("Entry id {id} was removed from {section} and cannot be reused")]
    RetiredEntryId { section: &'static str, id: EntryId },

    #[error("Entry {id} not found in {section}")]
    EntryNotFound { section: &'static str, id: EntryId },

    #[error("Entry ids cannot be changed")]
    IdChange,

    #[error("Invalid entry payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, Default)]
pub struct DraftEditor {
    draft: ResumeDraft,
    retired_ids: HashSet<(DraftSection, EntryId)>,
}

impl DraftEditor {
    pub fn new(draft: ResumeDraft) -> Self {
        let mut editor = Self::default();
        editor.replace(draft);
        editor
    }

    pub fn draft(&self) -> &ResumeDraft {
        &self.draft
    }

    /// Loads a whole payload, replacing the current draft. Entry ids are
    /// normalized on the way in: blank, duplicated or retired ids get a
    /// freshly generated one, so every entry stays addressable.
    pub fn replace(&mut self, mut draft: ResumeDraft) {
        let retired = &self.retired_ids;
        normalize_ids(&mut draft.education, DraftSection::Education, retired);
        normalize_ids(&mut draft.experience, DraftSection::Experience, retired);
        normalize_ids(&mut draft.projects, DraftSection::Projects, retired);
        normalize_ids(&mut draft.certifications, DraftSection::Certifications, retired);
        normalize_ids(&mut draft.achievements, DraftSection::Achievements, retired);
        self.draft = draft;
    }

    pub fn reset(&mut self) {
        self.draft = ResumeDraft::default();
    }

    pub fn update_personal_details(&mut self, patch: PersonalDetailsPatch) {
        let pd = &mut self.draft.personal_details;
        let PersonalDetailsPatch {
            first_name,
            last_name,
            email,
            phone,
            location,
            linkedin_url,
            portfolio_url,
            summary,
        } = patch;
        for (slot, value) in [
            (&mut pd.first_name, first_name),
            (&mut pd.last_name, last_name),
            (&mut pd.email, email),
            (&mut pd.phone, phone),
            (&mut pd.location, location),
            (&mut pd.linkedin_url, linkedin_url),
            (&mut pd.portfolio_url, portfolio_url),
            (&mut pd.summary, summary),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }

    /// Appends an entry built from `value`. A missing or blank id is
    /// generated; an id already present or previously removed is rejected.
    pub fn add_entry(&mut self, section: DraftSection, value: Value) -> Result<EntryId, EditError> {
        let retired = &self.retired_ids;
        let draft = &mut self.draft;
        match section {
            DraftSection::Education => add_to(&mut draft.education, section, value, retired),
            DraftSection::Experience => add_to(&mut draft.experience, section, value, retired),
            DraftSection::Projects => add_to(&mut draft.projects, section, value, retired),
            DraftSection::Certifications => {
                add_to(&mut draft.certifications, section, value, retired)
            }
            DraftSection::Achievements => add_to(&mut draft.achievements, section, value, retired),
        }
    }

    /// Shallow-merges the fields of `patch` into the entry with `id`.
    pub fn update_entry(
        &mut self,
        section: DraftSection,
        id: &EntryId,
        patch: Value,
    ) -> Result<(), EditError> {
        let draft = &mut self.draft;
        match section {
            DraftSection::Education => update_in(&mut draft.education, section, id, patch),
            DraftSection::Experience => update_in(&mut draft.experience, section, id, patch),
            DraftSection::Projects => update_in(&mut draft.projects, section, id, patch),
            DraftSection::Certifications => {
                update_in(&mut draft.certifications, section, id, patch)
            }
            DraftSection::Achievements => update_in(&mut draft.achievements, section, id, patch),
        }
    }

    pub fn remove_entry(&mut self, section: DraftSection, id: &EntryId) -> Result<(), EditError> {
        let draft = &mut self.draft;
        match section {
            DraftSection::Education => remove_from(&mut draft.education, section, id),
            DraftSection::Experience => remove_from(&mut draft.experience, section, id),
            DraftSection::Projects => remove_from(&mut draft.projects, section, id),
            DraftSection::Certifications => remove_from(&mut draft.certifications, section, id),
            DraftSection::Achievements => remove_from(&mut draft.achievements, section, id),
        }?;
        self.retired_ids.insert((section, id.clone()));
        Ok(())
    }

    /// Replaces one skill category. Items are trimmed, blanks dropped and
    /// duplicates removed keeping the first occurrence.
    pub fn set_skills(&mut self, category: SkillCategory, items: Vec<String>) {
        let mut seen = HashSet::new();
        let cleaned = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect();
        *self.draft.skills.get_mut(category) = cleaned;
    }
}

fn normalize_ids<T: SectionEntry>(
    list: &mut [T],
    section: DraftSection,
    retired: &HashSet<(DraftSection, EntryId)>,
) {
    let mut seen = HashSet::new();
    for entry in list.iter_mut() {
        let id = entry.id().clone();
        let unusable = id.is_empty() || retired.contains(&(section, id.clone()));
        if unusable || !seen.insert(id) {
            let fresh = EntryId::generate();
            seen.insert(fresh.clone());
            entry.set_id(fresh);
        }
    }
}

fn add_to<T: SectionEntry>(
    list: &mut Vec<T>,
    section: DraftSection,
    value: Value,
    retired: &HashSet<(DraftSection, EntryId)>,
) -> Result<EntryId, EditError> {
    let mut entry: T =
        serde_json::from_value(value).map_err(|e| EditError::InvalidPayload(e.to_string()))?;

    if entry.id().is_empty() {
        entry.set_id(EntryId::generate());
    }
    let id = entry.id().clone();

    if list.iter().any(|e| e.id() == &id) {
        return Err(EditError::DuplicateEntryId {
            section: section.as_str(),
            id,
        });
    }
    if retired.contains(&(section, id.clone())) {
        return Err(EditError::RetiredEntryId {
            section: section.as_str(),
            id,
        });
    }

    list.push(entry);
    Ok(id)
}

fn update_in<T: SectionEntry>(
    list: &mut [T],
    section: DraftSection,
    id: &EntryId,
    patch: Value,
) -> Result<(), EditError> {
    let Value::Object(patch) = patch else {
        return Err(EditError::InvalidPayload(
            "entry update must be a JSON object".to_string(),
        ));
    };
    if let Some(new_id) = patch.get("id") {
        if new_id.as_str() != Some(id.as_str()) {
            return Err(EditError::IdChange);
        }
    }

    let entry = list
        .iter_mut()
        .find(|e| e.id() == id)
        .ok_or_else(|| EditError::EntryNotFound {
            section: section.as_str(),
            id: id.clone(),
        })?;

    let mut merged =
        serde_json::to_value(&*entry).map_err(|e| EditError::InvalidPayload(e.to_string()))?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(patch);
    }
    *entry = serde_json::from_value(merged).map_err(|e| EditError::InvalidPayload(e.to_string()))?;
    Ok(())
}

fn remove_from<T: SectionEntry>(
    list: &mut Vec<T>,
    section: DraftSection,
    id: &EntryId,
) -> Result<(), EditError> {
    let before = list.len();
    list.retain(|e| e.id() != id);
    if list.len() == before {
        return Err(EditError::EntryNotFound {
            section: section.as_str(),
            id: id.clone(),
        });
    }
    Ok(())
}
