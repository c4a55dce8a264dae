//! Printable HTML rendering.
//!
//! The output is a single self-contained document: inline stylesheet, no
//! scripts, no external fonts or images. It has no dependencies that can fail,
//! which is what makes it the universal fallback for PDF export. Rendering is
//! deterministic: the same résumé always yields the same bytes.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::models::resume::{
    DocumentSettings, Education, PersonalData, Project, Skill, StructuredResume, WorkExperience,
};

const UNCATEGORIZED_SKILLS: &str = "Other";

pub fn render_html(resume: &StructuredResume) -> String {
    let personal = &resume.personal_data;
    let name = personal.full_name();
    let summary = personal.summary.trim();

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (document_title(&name)) }
                style { (PreEscaped(stylesheet(&resume.document_settings))) }
            }
            body {
                main class="resume" {
                    (header(personal, &name))
                    @if !summary.is_empty() {
                        section class="section summary" {
                            h2 { "Summary" }
                            p { (summary) }
                        }
                    }
                    @if !resume.work_experience.is_empty() {
                        (experience_section(&resume.work_experience))
                    }
                    @if !resume.education.is_empty() {
                        (education_section(&resume.education))
                    }
                    @if !resume.projects.is_empty() {
                        (projects_section(&resume.projects))
                    }
                    @if let Some(skills) = skills_section(&resume.skills) {
                        (skills)
                    }
                }
            }
        }
    };

    markup.into_string()
}

fn document_title(name: &str) -> String {
    if name.is_empty() {
        "Resume".to_string()
    } else {
        format!("{name} - Resume")
    }
}

fn pt(value: f64) -> String {
    format!("{value}pt")
}

/// Inline stylesheet. Every size and gap comes from `settings`.
fn stylesheet(settings: &DocumentSettings) -> String {
    let font = pt(settings.font_size);
    let name = pt(settings.name_size);
    let heading = pt(settings.section_title_size);
    let leading = pt(settings.line_spacing);
    let section = pt(settings.section_spacing);
    let entry = pt(settings.entry_spacing);
    let margin = pt(settings.page_margin);

    format!(
        "@page {{ size: letter; margin: {margin}; }}\n\
         * {{ box-sizing: border-box; }}\n\
         body {{ margin: 0; color: #111; background: #fff; font-family: Georgia, 'Times New Roman', serif; font-size: {font}; line-height: calc(1em + {leading}); }}\n\
         .resume {{ max-width: 612pt; margin: 0 auto; padding: {margin}; }}\n\
         h1 {{ font-size: {name}; margin: 0; line-height: 1.1; }}\n\
         h2 {{ font-size: {heading}; margin: 0 0 {entry} 0; padding-bottom: 2pt; text-transform: uppercase; letter-spacing: 0.5pt; border-bottom: 0.75pt solid #444; }}\n\
         h3 {{ font-size: {font}; margin: 0; }}\n\
         p {{ margin: 0; }}\n\
         ul {{ margin: 2pt 0 0 0; padding-left: 14pt; }}\n\
         a {{ color: inherit; text-decoration: none; }}\n\
         .contact, .links {{ margin-top: 2pt; color: #333; }}\n\
         .section {{ margin-top: {section}; }}\n\
         .entry {{ margin-bottom: {entry}; }}\n\
         .entry-head {{ display: flex; justify-content: space-between; gap: 8pt; }}\n\
         .entry-sub {{ font-style: italic; }}\n\
         .dates {{ white-space: nowrap; }}\n\
         .skill-row {{ margin-bottom: 2pt; }}\n\
         @media print {{ .resume {{ padding: 0; max-width: none; }} }}\n"
    )
}

fn date_range(start: &str, end: &str) -> String {
    match (start.trim(), end.trim()) {
        ("", "") => String::new(),
        (start, "") => format!("{start} \u{2013} Present"),
        ("", end) => end.to_string(),
        (start, end) => format!("{start} \u{2013} {end}"),
    }
}

fn non_empty<'a>(values: &[&'a str]) -> Vec<&'a str> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect()
}

fn header(personal: &PersonalData, name: &str) -> Markup {
    let contact = non_empty(&[
        personal.email.as_str(),
        personal.phone.as_str(),
        personal.location.as_str(),
    ]);
    let links = non_empty(&[
        personal.website.as_str(),
        personal.linkedin.as_str(),
        personal.github.as_str(),
    ]);

    html! {
        header class="header" {
            @if !name.is_empty() {
                h1 { (name) }
            }
            @if !contact.is_empty() {
                p class="contact" { (contact.join(" | ")) }
            }
            @if !links.is_empty() {
                p class="links" {
                    @for (i, link) in links.iter().enumerate() {
                        @if i > 0 { " | " }
                        (link_or_text(link))
                    }
                }
            }
        }
    }
}

const LINK_SCHEMES: [&str; 3] = ["http://", "https://", "mailto:"];

/// Only http(s) and mailto URLs become anchors; anything else is shown as text.
fn safe_href(url: &str) -> Option<&str> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    LINK_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
        .then_some(url)
}

fn link_or_text(url: &str) -> Markup {
    html! {
        @if let Some(href) = safe_href(url) {
            a href=(href) { (href) }
        } @else {
            (url.trim())
        }
    }
}

fn trimmed(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn highlights(items: &[String]) -> Markup {
    let items = trimmed(items);

    html! {
        @if !items.is_empty() {
            ul {
                @for item in items {
                    li { (item) }
                }
            }
        }
    }
}

fn experience_section(entries: &[WorkExperience]) -> Markup {
    html! {
        section class="section experience" {
            h2 { "Experience" }
            @for job in entries {
                div class="entry" {
                    div class="entry-head" {
                        h3 { (job.title) }
                        span class="dates" { (date_range(&job.start_date, &job.end_date)) }
                    }
                    @let sub = non_empty(&[job.company.as_str(), job.location.as_str()]);
                    @if !sub.is_empty() {
                        p class="entry-sub" { (sub.join(", ")) }
                    }
                    (highlights(&job.highlights))
                }
            }
        }
    }
}

fn education_section(entries: &[Education]) -> Markup {
    html! {
        section class="section education" {
            h2 { "Education" }
            @for school in entries {
                div class="entry" {
                    div class="entry-head" {
                        h3 { (school.institution) }
                        span class="dates" { (date_range(&school.start_date, &school.end_date)) }
                    }
                    @let degree = non_empty(&[school.degree.as_str(), school.field_of_study.as_str()]);
                    @if !degree.is_empty() {
                        p class="entry-sub" { (degree.join(", ")) }
                    }
                    @if !school.gpa.trim().is_empty() {
                        p { "GPA: " (school.gpa.trim()) }
                    }
                }
            }
        }
    }
}

fn projects_section(entries: &[Project]) -> Markup {
    html! {
        section class="section projects" {
            h2 { "Projects" }
            @for project in entries {
                div class="entry" {
                    div class="entry-head" {
                        h3 { (project.name) }
                        @if !project.url.trim().is_empty() {
                            (link_or_text(&project.url))
                        }
                    }
                    @if !project.description.trim().is_empty() {
                        p { (project.description.trim()) }
                    }
                    @let tech = trimmed(&project.technologies);
                    @if !tech.is_empty() {
                        p class="entry-sub" { (tech.join(", ")) }
                    }
                    (highlights(&project.highlights))
                }
            }
        }
    }
}

/// Groups skills by category in first-seen order; blank categories share one bucket.
fn group_skills(skills: &[Skill]) -> Vec<(&str, Vec<&str>)> {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for skill in skills {
        let name = skill.skill_name.trim();
        if name.is_empty() {
            continue;
        }
        let category = match skill.category.trim() {
            "" => UNCATEGORIZED_SKILLS,
            c => c,
        };
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, names)) => names.push(name),
            None => groups.push((category, vec![name])),
        }
    }
    groups
}

fn skills_section(skills: &[Skill]) -> Option<Markup> {
    let groups = group_skills(skills);
    if groups.is_empty() {
        return None;
    }

    Some(html! {
        section class="section skills" {
            h2 { "Skills" }
            @for (category, names) in &groups {
                p class="skill-row" {
                    strong { (category) ": " }
                    (names.join(", "))
                }
            }
        }
    })
}
