use crate::draft::model::{ResumeDraft, SectionEntry, SkillCategory};

/// Renders the live preview of a draft as Markdown.
///
/// Empty sections are omitted. Entries marked current render their end as
/// "Present" regardless of any stored end date.
pub fn render_draft_to_md(draft: &ResumeDraft) -> String {
    let pd = &draft.personal_details;
    let name = pd.full_name();
    let mut md = format!(
        "# {}\n\n",
        if name.is_empty() { "Untitled Resume" } else { name.as_str() }
    );

    let contact = join_present(&[pd.email.as_str(), pd.phone.as_str(), pd.location.as_str()]);
    if !contact.is_empty() {
        md.push_str(&format!("{contact}\n\n"));
    }
    let links = join_present(&[pd.linkedin_url.as_str(), pd.portfolio_url.as_str()]);
    if !links.is_empty() {
        md.push_str(&format!("{links}\n\n"));
    }
    if !pd.summary.trim().is_empty() {
        md.push_str("## Professional Summary\n\n");
        md.push_str(&format!("{}\n\n", pd.summary.trim()));
    }

    if !draft.experience.is_empty() {
        md.push_str("## Experience\n\n");
        for exp in &draft.experience {
            md.push_str(&format!(
                "### {} at {}\n",
                or_placeholder(&exp.position, "Position"),
                or_placeholder(&exp.company, "Company")
            ));
            let span = date_span(&exp.start_date, exp.effective_end_date(), exp.current);
            push_meta(&mut md, &[span.as_str(), exp.location.as_str()]);
            push_paragraph(&mut md, &exp.description);
            for bullet in exp.bullets.iter().filter(|b| !b.trim().is_empty()) {
                md.push_str(&format!("- {}\n", bullet.trim()));
            }
            md.push('\n');
        }
    }

    if !draft.education.is_empty() {
        md.push_str("## Education\n\n");
        for edu in &draft.education {
            let degree = if edu.field_of_study.trim().is_empty() {
                or_placeholder(&edu.degree, "Degree").to_string()
            } else {
                format!(
                    "{} in {}",
                    or_placeholder(&edu.degree, "Degree"),
                    edu.field_of_study.trim()
                )
            };
            md.push_str(&format!(
                "### {}, {}\n",
                degree,
                or_placeholder(&edu.institution, "Institution")
            ));
            let gpa = if edu.gpa.trim().is_empty() {
                String::new()
            } else {
                format!("GPA: {}", edu.gpa.trim())
            };
            let span = date_span(&edu.start_date, edu.effective_end_date(), edu.current);
            push_meta(&mut md, &[span.as_str(), gpa.as_str()]);
            push_paragraph(&mut md, &edu.description);
            md.push('\n');
        }
    }

    if !draft.projects.is_empty() {
        md.push_str("## Projects\n\n");
        for project in &draft.projects {
            md.push_str(&format!("### {}\n", or_placeholder(&project.name, "Project")));
            let span = date_span(
                &project.start_date,
                project.effective_end_date(),
                project.current,
            );
            push_meta(&mut md, &[span.as_str(), project.url.as_str()]);
            if !project.technologies.is_empty() {
                md.push_str(&format!(
                    "**Technologies:** {}\n",
                    project.technologies.join(", ")
                ));
            }
            push_paragraph(&mut md, &project.description);
            md.push('\n');
        }
    }

    if !draft.certifications.is_empty() {
        md.push_str("## Certifications\n\n");
        for cert in &draft.certifications {
            let issued = if cert.current {
                format!("{} (no expiry)", cert.start_date.trim())
            } else {
                date_span(&cert.start_date, cert.effective_end_date(), false)
            };
            let line = join_present(&[
                or_placeholder(&cert.name, "Certification"),
                cert.issuer.as_str(),
                issued.as_str(),
            ]);
            md.push_str(&format!("- {line}\n"));
        }
        md.push('\n');
    }

    if !draft.achievements.is_empty() {
        md.push_str("## Achievements\n\n");
        for achievement in &draft.achievements {
            let mut line = or_placeholder(&achievement.title, "Achievement").to_string();
            if !achievement.year.trim().is_empty() {
                line.push_str(&format!(" ({})", achievement.year.trim()));
            }
            if !achievement.description.trim().is_empty() {
                line.push_str(&format!(": {}", achievement.description.trim()));
            }
            md.push_str(&format!("- {line}\n"));
        }
        md.push('\n');
    }

    if !draft.skills.is_empty() {
        md.push_str("## Skills\n\n");
        for category in SkillCategory::ALL {
            let items = draft.skills.get(category);
            if !items.is_empty() {
                md.push_str(&format!("- **{}:** {}\n", category.title(), items.join(", ")));
            }
        }
        md.push('\n');
    }

    md
}

fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Italic metadata line; omitted when every part is blank.
fn push_meta(md: &mut String, parts: &[&str]) {
    let meta = join_present(parts);
    if !meta.is_empty() {
        md.push_str(&format!("*{meta}*\n"));
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

fn date_span(start: &str, end: Option<&str>, current: bool) -> String {
    let end = if current { Some("Present") } else { end };
    match (start.trim(), end) {
        ("", None) => String::new(),
        ("", Some(end)) => end.to_string(),
        (start, None) => start.to_string(),
        (start, Some(end)) => format!("{start} - {end}"),
    }
}

fn push_paragraph(md: &mut String, text: &str) {
    if !text.trim().is_empty() {
        md.push_str(&format!("\n{}\n", text.trim()));
    }
}
