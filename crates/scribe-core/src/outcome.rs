use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, TemplateId};

/// One chat turn as produced by the agent loop: free text plus zero or
/// more tool-call outcomes. The dispatcher only reads this shape; it does
/// not manage the conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTurn {
    #[serde(default)]
    pub response_text: String,
    #[serde(default)]
    pub tool_outcomes: Vec<RawToolOutcome>,
}

/// A loosely-typed tool outcome as the agent reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawToolOutcome {
    pub tool_name: String,
    pub success: bool,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Descriptive metadata for a document, taken from generate args.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub school: String,
}

/// A tool outcome classified into the closed set of fulfillment kinds.
/// Unknown tool names map to `Unknown` and are skipped — never a runtime
/// type error.
#[derive(Clone, Debug)]
pub enum ToolOutcome {
    Generate {
        meta: DocumentMeta,
        template_id: Option<TemplateId>,
        content: serde_json::Value,
    },
    Edit {
        project_id: ProjectId,
        content: serde_json::Value,
    },
    Regenerate {
        project_id: ProjectId,
        template_id: TemplateId,
    },
    ShowTemplates,
    /// Known tool kind with args missing a required field.
    Invalid { tool_name: String, reason: String },
    Unknown { tool_name: String },
}

pub const TOOL_GENERATE: &str = "generateProject";
pub const TOOL_EDIT: &str = "editProject";
pub const TOOL_REGENERATE: &str = "regenerateProject";
pub const TOOL_SHOW_TEMPLATES: &str = "showTemplates";

impl ToolOutcome {
    /// Classify a raw outcome by declared tool name.
    pub fn classify(raw: &RawToolOutcome) -> ToolOutcome {
        match raw.tool_name.as_str() {
            TOOL_GENERATE => classify_generate(raw),
            TOOL_EDIT => classify_edit(raw),
            TOOL_REGENERATE => classify_regenerate(raw),
            TOOL_SHOW_TEMPLATES => ToolOutcome::ShowTemplates,
            other => ToolOutcome::Unknown { tool_name: other.to_string() },
        }
    }
}

fn classify_generate(raw: &RawToolOutcome) -> ToolOutcome {
    let Some(title) = str_arg(&raw.args, "title") else {
        return invalid(raw, "missing title");
    };
    let Some(content) = raw.args.get("content").filter(|c| c.is_object()) else {
        return invalid(raw, "missing content object");
    };
    let meta = DocumentMeta {
        title: title.to_string(),
        description: str_arg(&raw.args, "description").unwrap_or_default().to_string(),
        subject: str_arg(&raw.args, "subject").unwrap_or_default().to_string(),
        level: str_arg(&raw.args, "level").unwrap_or_default().to_string(),
        author: str_arg(&raw.args, "author").unwrap_or_default().to_string(),
        school: str_arg(&raw.args, "school").unwrap_or_default().to_string(),
    };
    ToolOutcome::Generate {
        meta,
        template_id: str_arg(&raw.args, "templateId").map(TemplateId::from_raw),
        content: content.clone(),
    }
}

fn classify_edit(raw: &RawToolOutcome) -> ToolOutcome {
    let Some(project_id) = str_arg(&raw.args, "projectId") else {
        return invalid(raw, "missing projectId");
    };
    let Some(content) = raw.args.get("content").filter(|c| c.is_object()) else {
        return invalid(raw, "missing content object");
    };
    ToolOutcome::Edit {
        project_id: ProjectId::from_raw(project_id),
        content: content.clone(),
    }
}

fn classify_regenerate(raw: &RawToolOutcome) -> ToolOutcome {
    let Some(project_id) = str_arg(&raw.args, "projectId") else {
        return invalid(raw, "missing projectId");
    };
    let Some(template_id) = str_arg(&raw.args, "templateId") else {
        return invalid(raw, "missing templateId");
    };
    ToolOutcome::Regenerate {
        project_id: ProjectId::from_raw(project_id),
        template_id: TemplateId::from_raw(template_id),
    }
}

fn invalid(raw: &RawToolOutcome, reason: &str) -> ToolOutcome {
    ToolOutcome::Invalid {
        tool_name: raw.tool_name.clone(),
        reason: reason.to_string(),
    }
}

fn str_arg<'a>(args: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str()).filter(|s| !s.trim().is_empty())
}
