use serde::{Deserialize, Serialize};

use crate::ids::ProjectId;
use crate::style::TemplateSummary;

/// Response shape for one dispatched turn. Exactly one of {project, pdf,
/// templates} attaches, chosen by priority project > pdf > templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "normal-with-pdf")]
    NormalWithPdf,
    #[serde(rename = "project")]
    Project,
    #[serde(rename = "normal-with-project")]
    NormalWithProject,
    #[serde(rename = "templates")]
    Templates,
    #[serde(rename = "normal-with-templates")]
    NormalWithTemplates,
}

/// A downloadable file reference with a human-readable size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub url: String,
    pub name: String,
    pub size: String,
}

/// A fulfilled project reference carried on the reply.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAttachment {
    pub id: ProjectId,
    pub title: String,
    pub url: String,
    pub name: String,
    pub size: String,
}

/// The outbound contract returned to the chat caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub message_type: MessageType,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<FileAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<TemplateSummary>>,
}

/// Returned when a document operation failed and the agent produced no
/// text either.
pub const FALLBACK_TEXT: &str = "Sorry, I couldn't process that request. Please try again.";

/// Resolve the reply's message type from which attachment won and whether
/// accompanying text exists.
pub fn resolve_message_type(
    has_project: bool,
    has_pdf: bool,
    has_templates: bool,
    has_text: bool,
) -> MessageType {
    if has_project {
        if has_text { MessageType::NormalWithProject } else { MessageType::Project }
    } else if has_pdf {
        if has_text { MessageType::NormalWithPdf } else { MessageType::Pdf }
    } else if has_templates {
        if has_text { MessageType::NormalWithTemplates } else { MessageType::Templates }
    } else {
        MessageType::Normal
    }
}

/// Fixed phrase set for the template-selection heuristic: when the agent's
/// own text talks templates, the catalog attaches even without an explicit
/// tool outcome.
const TEMPLATE_PHRASES: &[&str] = &[
    "choose a template",
    "select a template",
    "pick a template",
    "available templates",
    "template options",
    "template gallery",
    "which template",
];

/// Case-insensitive substring match over the fixed phrase set.
pub fn mentions_template_language(text: &str) -> bool {
    let lower = text.to_lowercase();
    TEMPLATE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Format a byte count as a human-readable string: units B/KB/MB/GB, two
/// decimal places with trailing zeros trimmed.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
