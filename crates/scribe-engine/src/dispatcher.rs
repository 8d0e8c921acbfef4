//! Fulfillment of agent tool-call outcomes: each credit-bearing outcome
//! compiles a document, stores the artifact, and commits {project write,
//! credit debit, usage bump} as one transaction. A failed outcome never
//! takes down the rest of the turn.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use scribe_core::ids::{ProjectId, TemplateId, UserId};
use scribe_core::outcome::{AgentTurn, DocumentMeta, ToolOutcome};
use scribe_core::reply::{
    format_file_size, mentions_template_language, resolve_message_type, FileAttachment,
    ProjectAttachment, TurnReply, FALLBACK_TEXT,
};
use scribe_core::rubric;
use scribe_core::style::TemplateSummary;
use scribe_store::projects::{self, ProjectRepo, ProjectRow};
use scribe_store::templates::{self, TemplateRepo};
use scribe_store::{credits, ArtifactStore, Database};

use crate::compiler::compile;
use crate::error::EngineError;

pub struct Dispatcher {
    db: Database,
    projects: ProjectRepo,
    templates: TemplateRepo,
    artifacts: ArtifactStore,
}

impl Dispatcher {
    pub fn new(db: Database, artifacts: ArtifactStore) -> Self {
        Self {
            projects: ProjectRepo::new(db.clone()),
            templates: TemplateRepo::new(db.clone()),
            db,
            artifacts,
        }
    }

    /// Fulfill one agent turn and shape the outbound reply. Attachment
    /// priority is project > pdf > templates; a turn with no text and a
    /// failed fulfillment gets the fallback text.
    #[instrument(skip(self, turn), fields(user_id = %user_id, outcomes = turn.tool_outcomes.len()))]
    pub fn dispatch_turn(&self, turn: &AgentTurn, user_id: &UserId) -> TurnReply {
        let mut project: Option<ProjectAttachment> = None;
        let mut pdf: Option<FileAttachment> = None;
        let mut wants_templates = false;
        let mut had_failure = false;

        for raw in &turn.tool_outcomes {
            if !raw.success {
                debug!(tool = %raw.tool_name, "skipping failed tool outcome");
                continue;
            }
            match ToolOutcome::classify(raw) {
                ToolOutcome::Generate { meta, template_id, content } => {
                    match self.fulfill_generate(user_id, &meta, template_id.as_ref(), &content) {
                        Ok(attachment) => project = Some(attachment),
                        Err(e) => {
                            warn!(user_id = %user_id, error = %e, "generate failed");
                            had_failure = true;
                        }
                    }
                }
                ToolOutcome::Edit { project_id, content } => {
                    match self.fulfill_edit(user_id, &project_id, &content) {
                        Ok(attachment) => pdf = Some(attachment),
                        Err(e) => {
                            warn!(user_id = %user_id, project_id = %project_id, error = %e, "edit failed");
                            had_failure = true;
                        }
                    }
                }
                ToolOutcome::Regenerate { project_id, template_id } => {
                    match self.fulfill_regenerate(user_id, &project_id, &template_id) {
                        Ok(attachment) => pdf = Some(attachment),
                        Err(e) => {
                            warn!(user_id = %user_id, project_id = %project_id, error = %e, "regenerate failed");
                            had_failure = true;
                        }
                    }
                }
                ToolOutcome::ShowTemplates => wants_templates = true,
                ToolOutcome::Invalid { tool_name, reason } => {
                    warn!(tool = %tool_name, reason = %reason, "invalid tool args");
                    had_failure = true;
                }
                ToolOutcome::Unknown { tool_name } => {
                    debug!(tool = %tool_name, "unknown tool, skipping");
                }
            }
        }

        let mut text = turn.response_text.trim().to_string();
        if !wants_templates && mentions_template_language(&text) {
            wants_templates = true;
        }

        let templates = if wants_templates {
            match self.templates.list_public() {
                Ok(list) => Some(list.iter().map(TemplateSummary::from).collect::<Vec<_>>()),
                Err(e) => {
                    warn!(error = %e, "template listing failed");
                    had_failure = true;
                    None
                }
            }
        } else {
            None
        };

        if text.is_empty()
            && had_failure
            && project.is_none()
            && pdf.is_none()
            && templates.is_none()
        {
            text = FALLBACK_TEXT.to_string();
        }

        let message_type = resolve_message_type(
            project.is_some(),
            pdf.is_some(),
            templates.is_some(),
            !text.is_empty(),
        );
        TurnReply { message_type, text, pdf, project, templates }
    }

    /// Validate, compile, and persist a new project. The DB transaction
    /// commits the project row, the single-credit debit, and the template
    /// usage bump together or not at all.
    fn fulfill_generate(
        &self,
        user_id: &UserId,
        meta: &DocumentMeta,
        requested_template: Option<&TemplateId>,
        content: &serde_json::Value,
    ) -> Result<ProjectAttachment, EngineError> {
        let doc = rubric::validate(content)?;
        let template = self.templates.resolve(requested_template)?;
        let compiled = compile(meta, &doc, &template.style);
        let (file_name, size) = self.artifacts.store(&compiled.file_name, &compiled.bytes)?;

        let now = Utc::now().to_rfc3339();
        let row = ProjectRow {
            id: ProjectId::new(),
            user_id: user_id.clone(),
            title: meta.title.clone(),
            meta: meta.clone(),
            content: doc,
            template_id: template.id.clone(),
            file_name: file_name.clone(),
            file_size: size as i64,
            page_count: compiled.page_count as i64,
            created_at: now.clone(),
            updated_at: now,
        };
        self.db.with_tx(|tx| {
            projects::insert_tx(tx, &row)?;
            credits::debit_one_tx(tx, user_id)?;
            templates::bump_usage_tx(tx, &template.id)
        })?;

        info!(project_id = %row.id, user_id = %user_id, pages = row.page_count, "project generated");
        Ok(ProjectAttachment {
            id: row.id,
            title: row.title,
            url: artifact_url(&file_name),
            name: file_name,
            size: format_file_size(size),
        })
    }

    /// Apply a stage patch to an existing project and recompile the full
    /// merged document.
    fn fulfill_edit(
        &self,
        user_id: &UserId,
        project_id: &ProjectId,
        content: &serde_json::Value,
    ) -> Result<FileAttachment, EngineError> {
        let prior = self.projects.get(project_id)?;
        let patch = rubric::validate_patch(content)?;
        let merged = patch.merge_into(&prior.content);
        let template = self.templates.resolve(Some(&prior.template_id))?;
        let compiled = compile(&prior.meta, &merged, &template.style);
        let (file_name, size) = self.artifacts.store(&compiled.file_name, &compiled.bytes)?;

        self.db.with_tx(|tx| {
            projects::update_tx(
                tx,
                project_id,
                &merged,
                &prior.template_id,
                &file_name,
                size as i64,
                compiled.page_count as i64,
            )?;
            credits::debit_one_tx(tx, user_id)
        })?;

        info!(project_id = %project_id, user_id = %user_id, "project edited");
        Ok(FileAttachment {
            url: artifact_url(&file_name),
            name: file_name,
            size: format_file_size(size),
        })
    }

    /// Re-render an existing project's content under a different template.
    fn fulfill_regenerate(
        &self,
        user_id: &UserId,
        project_id: &ProjectId,
        template_id: &TemplateId,
    ) -> Result<FileAttachment, EngineError> {
        let prior = self.projects.get(project_id)?;
        let template = self.templates.resolve(Some(template_id))?;
        let compiled = compile(&prior.meta, &prior.content, &template.style);
        let (file_name, size) = self.artifacts.store(&compiled.file_name, &compiled.bytes)?;

        self.db.with_tx(|tx| {
            projects::update_tx(
                tx,
                project_id,
                &prior.content,
                &template.id,
                &file_name,
                size as i64,
                compiled.page_count as i64,
            )?;
            credits::debit_one_tx(tx, user_id)?;
            templates::bump_usage_tx(tx, &template.id)
        })?;

        info!(project_id = %project_id, template_id = %template.id, "project regenerated");
        Ok(FileAttachment {
            url: artifact_url(&file_name),
            name: file_name,
            size: format_file_size(size),
        })
    }
}

fn artifact_url(file_name: &str) -> String {
    format!("/artifacts/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::outcome::{RawToolOutcome, TOOL_EDIT, TOOL_GENERATE, TOOL_REGENERATE, TOOL_SHOW_TEMPLATES};
    use scribe_core::reply::MessageType;
    use scribe_core::rubric::testutil::sample_value;
    use scribe_store::CreditRepo;

    struct Fixture {
        dispatcher: Dispatcher,
        db: Database,
        user: UserId,
    }

    fn fixture(starting_credits: i64) -> Fixture {
        let db = Database::in_memory().unwrap();
        TemplateRepo::new(db.clone()).seed_default().unwrap();
        let user = UserId::new();
        if starting_credits > 0 {
            CreditRepo::new(db.clone()).grant(&user, starting_credits).unwrap();
        }
        let dir =
            std::env::temp_dir().join(format!("scribe-dispatch-test-{}", uuid::Uuid::now_v7()));
        let artifacts = ArtifactStore::open(&dir).unwrap();
        Fixture { dispatcher: Dispatcher::new(db.clone(), artifacts), db, user }
    }

    fn outcome(tool: &str, args: serde_json::Value) -> RawToolOutcome {
        RawToolOutcome {
            tool_name: tool.into(),
            success: true,
            args,
            result: serde_json::Value::Null,
        }
    }

    fn generate_turn(text: &str) -> AgentTurn {
        AgentTurn {
            response_text: text.into(),
            tool_outcomes: vec![outcome(
                TOOL_GENERATE,
                serde_json::json!({
                    "title": "Bilharzia Prevention",
                    "subject": "Design & Technology",
                    "content": sample_value(),
                }),
            )],
        }
    }

    fn balance(f: &Fixture) -> i64 {
        CreditRepo::new(f.db.clone()).balance(&f.user).unwrap()
    }

    #[test]
    fn generate_produces_project_and_debits_once() {
        let f = fixture(3);
        let reply = f.dispatcher.dispatch_turn(&generate_turn("Here is your project."), &f.user);

        assert_eq!(reply.message_type, MessageType::NormalWithProject);
        let project = reply.project.expect("project attachment");
        assert_eq!(project.title, "Bilharzia Prevention");
        assert!(project.name.starts_with("bilharzia-prevention_"));
        assert_eq!(project.url, format!("/artifacts/{}", project.name));
        assert_eq!(balance(&f), 2);

        let stored = ProjectRepo::new(f.db.clone()).get(&project.id).unwrap();
        assert!(stored.page_count >= 1);
        assert!(f.dispatcher.artifacts.retrieve(&project.name).is_ok());

        let default = TemplateRepo::new(f.db.clone()).get_default().unwrap();
        assert_eq!(default.usage_count, 1);
    }

    #[test]
    fn generate_without_text_is_bare_project() {
        let f = fixture(1);
        let reply = f.dispatcher.dispatch_turn(&generate_turn(""), &f.user);
        assert_eq!(reply.message_type, MessageType::Project);
        assert!(reply.text.is_empty());
    }

    #[test]
    fn insufficient_credit_persists_nothing() {
        let f = fixture(0);
        let reply = f.dispatcher.dispatch_turn(&generate_turn(""), &f.user);

        assert_eq!(reply.message_type, MessageType::Normal);
        assert_eq!(reply.text, FALLBACK_TEXT);
        assert!(reply.project.is_none());
        assert_eq!(balance(&f), 0);
        assert!(ProjectRepo::new(f.db.clone()).list_for_user(&f.user).unwrap().is_empty());

        let default = TemplateRepo::new(f.db.clone()).get_default().unwrap();
        assert_eq!(default.usage_count, 0);
    }

    #[test]
    fn failed_artifact_write_leaves_ledger_untouched() {
        let f = fixture(2);
        // Yank the artifact directory out from under the store so the PDF
        // write fails before the transaction ever opens.
        std::fs::remove_dir_all(f.dispatcher.artifacts.root()).unwrap();

        let reply = f.dispatcher.dispatch_turn(&generate_turn(""), &f.user);

        assert_eq!(reply.message_type, MessageType::Normal);
        assert_eq!(reply.text, FALLBACK_TEXT);
        assert!(reply.project.is_none());
        assert_eq!(balance(&f), 2);
        assert!(ProjectRepo::new(f.db.clone()).list_for_user(&f.user).unwrap().is_empty());
        let default = TemplateRepo::new(f.db.clone()).get_default().unwrap();
        assert_eq!(default.usage_count, 0);
    }

    #[test]
    fn failure_with_agent_text_keeps_the_text() {
        let f = fixture(0);
        let reply = f.dispatcher.dispatch_turn(&generate_turn("I tried to generate it."), &f.user);
        assert_eq!(reply.message_type, MessageType::Normal);
        assert_eq!(reply.text, "I tried to generate it.");
    }

    #[test]
    fn invalid_content_fails_validation_not_the_turn() {
        let f = fixture(2);
        let turn = AgentTurn {
            response_text: "Working on it.".into(),
            tool_outcomes: vec![outcome(
                TOOL_GENERATE,
                serde_json::json!({"title": "T", "content": {"stage1": {}}}),
            )],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);
        assert_eq!(reply.message_type, MessageType::Normal);
        assert_eq!(balance(&f), 2);
    }

    #[test]
    fn edit_merges_and_recompiles() {
        let f = fixture(2);
        let generated = f.dispatcher.dispatch_turn(&generate_turn(""), &f.user);
        let project_id = generated.project.unwrap().id;

        let patch = serde_json::json!({
            "stage6": {
                "summary": "Revised after community feedback.",
                "challenges": ["Flooding.", "Gravel supply."],
                "recommendations": ["Raise the foundations.", "Stockpile gravel."],
            }
        });
        let turn = AgentTurn {
            response_text: "Updated the evaluation.".into(),
            tool_outcomes: vec![outcome(
                TOOL_EDIT,
                serde_json::json!({"projectId": project_id.as_str(), "content": patch}),
            )],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);

        assert_eq!(reply.message_type, MessageType::NormalWithPdf);
        assert!(reply.pdf.is_some());
        assert_eq!(balance(&f), 0);

        let stored = ProjectRepo::new(f.db.clone()).get(&project_id).unwrap();
        assert_eq!(stored.content.stage6.summary, "Revised after community feedback.");
        // Unpatched stages survive the merge.
        assert_eq!(stored.content.stage2.ideas.len(), 3);
    }

    #[test]
    fn edit_of_missing_project_fails_cleanly() {
        let f = fixture(1);
        let turn = AgentTurn {
            response_text: String::new(),
            tool_outcomes: vec![outcome(
                TOOL_EDIT,
                serde_json::json!({"projectId": "proj_missing", "content": {"stage5": {"description": "d", "justification": "j"}}}),
            )],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);
        assert_eq!(reply.text, FALLBACK_TEXT);
        assert_eq!(balance(&f), 1);
    }

    #[test]
    fn regenerate_with_unknown_template_falls_back_and_debits() {
        let f = fixture(2);
        let generated = f.dispatcher.dispatch_turn(&generate_turn(""), &f.user);
        let project_id = generated.project.unwrap().id;

        let turn = AgentTurn {
            response_text: String::new(),
            tool_outcomes: vec![outcome(
                TOOL_REGENERATE,
                serde_json::json!({"projectId": project_id.as_str(), "templateId": "tmpl_ghost"}),
            )],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);

        assert_eq!(reply.message_type, MessageType::Pdf);
        assert_eq!(balance(&f), 0);

        let default = TemplateRepo::new(f.db.clone()).get_default().unwrap();
        // One bump from generate, one from regenerate.
        assert_eq!(default.usage_count, 2);
    }

    #[test]
    fn show_templates_attaches_catalog() {
        let f = fixture(0);
        let turn = AgentTurn {
            response_text: "Pick one:".into(),
            tool_outcomes: vec![outcome(TOOL_SHOW_TEMPLATES, serde_json::json!({}))],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);
        assert_eq!(reply.message_type, MessageType::NormalWithTemplates);
        let templates = reply.templates.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Classic Professional");
    }

    #[test]
    fn template_phrase_in_text_triggers_catalog() {
        let f = fixture(0);
        let turn = AgentTurn {
            response_text: "You can choose a template from the options below.".into(),
            tool_outcomes: vec![],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);
        assert_eq!(reply.message_type, MessageType::NormalWithTemplates);
        assert!(reply.templates.is_some());
    }

    #[test]
    fn project_outranks_templates() {
        let f = fixture(1);
        let mut turn = generate_turn("Done.");
        turn.tool_outcomes.push(outcome(TOOL_SHOW_TEMPLATES, serde_json::json!({})));
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);
        assert_eq!(reply.message_type, MessageType::NormalWithProject);
        // The catalog still rides along, it just does not set the type.
        assert!(reply.templates.is_some());
    }

    #[test]
    fn failed_and_unknown_outcomes_are_skipped() {
        let f = fixture(1);
        let turn = AgentTurn {
            response_text: "Searching.".into(),
            tool_outcomes: vec![
                RawToolOutcome {
                    tool_name: TOOL_GENERATE.into(),
                    success: false,
                    args: serde_json::json!({}),
                    result: serde_json::Value::Null,
                },
                outcome("webSearch", serde_json::json!({"query": "bilharzia"})),
            ],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);
        assert_eq!(reply.message_type, MessageType::Normal);
        assert_eq!(reply.text, "Searching.");
        assert_eq!(balance(&f), 1);
    }

    #[test]
    fn plain_text_turn_is_normal() {
        let f = fixture(0);
        let turn = AgentTurn {
            response_text: "Bilharzia is caused by a parasitic flatworm.".into(),
            tool_outcomes: vec![],
        };
        let reply = f.dispatcher.dispatch_turn(&turn, &f.user);
        assert_eq!(reply.message_type, MessageType::Normal);
        assert!(reply.project.is_none() && reply.pdf.is_none() && reply.templates.is_none());
    }
}
