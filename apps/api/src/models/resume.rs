use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when neither the caller nor the personal data supplies one.
pub const DEFAULT_TITLE: &str = "Untitled Resume";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub linkedin: String,
    pub github: String,
    pub summary: String,
}

impl PersonalData {
    /// `firstName lastName`, trimmed. Empty when both parts are blank.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: String,
    pub gpa: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub category: String,
    pub skill_name: String,
}

/// Typographic and spacing parameters for rendered exports. Every value is in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub font_size: f64,
    pub name_size: f64,
    pub section_title_size: f64,
    pub line_spacing: f64,
    pub section_spacing: f64,
    pub entry_spacing: f64,
    pub page_margin: f64,
}

pub const DEFAULT_DOCUMENT_SETTINGS: DocumentSettings = DocumentSettings {
    font_size: 10.5,
    name_size: 22.0,
    section_title_size: 12.0,
    line_spacing: 2.0,
    section_spacing: 14.0,
    entry_spacing: 8.0,
    page_margin: 36.0,
};

impl Default for DocumentSettings {
    fn default() -> Self {
        DEFAULT_DOCUMENT_SETTINGS
    }
}

impl DocumentSettings {
    /// Applies a partial override (e.g. export-time `styles`) on top of these settings.
    pub fn merged_with(mut self, overrides: &DocumentSettingsOverride) -> Self {
        let DocumentSettingsOverride {
            font_size,
            name_size,
            section_title_size,
            line_spacing,
            section_spacing,
            entry_spacing,
            page_margin,
        } = *overrides;

        if let Some(v) = font_size {
            self.font_size = v;
        }
        if let Some(v) = name_size {
            self.name_size = v;
        }
        if let Some(v) = section_title_size {
            self.section_title_size = v;
        }
        if let Some(v) = line_spacing {
            self.line_spacing = v;
        }
        if let Some(v) = section_spacing {
            self.section_spacing = v;
        }
        if let Some(v) = entry_spacing {
            self.entry_spacing = v;
        }
        if let Some(v) = page_margin {
            self.page_margin = v;
        }
        self
    }
}

/// Sparse form of [`DocumentSettings`]; absent fields leave the base value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettingsOverride {
    pub font_size: Option<f64>,
    pub name_size: Option<f64>,
    pub section_title_size: Option<f64>,
    pub line_spacing: Option<f64>,
    pub section_spacing: Option<f64>,
    pub entry_spacing: Option<f64>,
    pub page_margin: Option<f64>,
}

/// Canonical résumé content. Produced by `resumes::validation::validate`; everything downstream
/// assumes it is well formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredResume {
    pub personal_data: PersonalData,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub skills: Vec<Skill>,
    pub document_settings: DocumentSettings,
}

/// Persistence envelope for a résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: StructuredResume,
}

/// Newest-first list of records. Address entries by `id`, never by position.
pub type Collection = Vec<ResumeRecord>;

/// Derives a record title from the personal data, falling back to [`DEFAULT_TITLE`].
pub fn derive_title(data: &StructuredResume) -> String {
    let name = data.personal_data.full_name();
    if name.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        name
    }
}
