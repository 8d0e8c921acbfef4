use chrono::Utc;
use rusqlite::Transaction;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use scribe_core::ids::{ProjectId, TemplateId, UserId};
use scribe_core::outcome::DocumentMeta;
use scribe_core::rubric::RubricDocument;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// A persisted project: the merged document content plus the artifact it
/// was last rendered to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub user_id: UserId,
    pub title: String,
    pub meta: DocumentMeta,
    pub content: RubricDocument,
    pub template_id: TemplateId,
    pub file_name: String,
    pub file_size: i64,
    pub page_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ProjectRepo {
    db: Database,
}

impl ProjectRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a project by ID.
    #[instrument(skip(self), fields(project_id = %id))]
    pub fn get(&self, id: &ProjectId) -> Result<ProjectRow, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_project(row),
                None => Err(StoreError::NotFound(format!("project {id}"))),
            }
        })
    }

    /// List projects for a user, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn list_for_user(&self, user_id: &UserId) -> Result<Vec<ProjectRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC"
            ))?;
            let mut rows = stmt.query([user_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_project(row)?);
            }
            Ok(results)
        })
    }
}

/// Insert a freshly generated project inside an open transaction.
pub fn insert_tx(tx: &Transaction<'_>, project: &ProjectRow) -> Result<(), StoreError> {
    let meta_json = serde_json::to_string(&project.meta)?;
    let content_json = serde_json::to_string(&project.content)?;
    tx.execute(
        "INSERT INTO projects (id, user_id, title, meta, content, template_id,
                               file_name, file_size, page_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            project.id.as_str(),
            project.user_id.as_str(),
            project.title,
            meta_json,
            content_json,
            project.template_id.as_str(),
            project.file_name,
            project.file_size,
            project.page_count,
            project.created_at,
            project.updated_at,
        ],
    )?;
    Ok(())
}

/// Replace a project's content and rendered artifact inside an open
/// transaction. Used by edits and regenerations.
pub fn update_tx(
    tx: &Transaction<'_>,
    id: &ProjectId,
    content: &RubricDocument,
    template_id: &TemplateId,
    file_name: &str,
    file_size: i64,
    page_count: i64,
) -> Result<(), StoreError> {
    let now = Utc::now().to_rfc3339();
    let content_json = serde_json::to_string(content)?;
    let changed = tx.execute(
        "UPDATE projects SET content = ?1, template_id = ?2, file_name = ?3,
                             file_size = ?4, page_count = ?5, updated_at = ?6
         WHERE id = ?7",
        rusqlite::params![content_json, template_id.as_str(), file_name, file_size, page_count, now, id.as_str()],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(format!("project {id}")));
    }
    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, title, meta, content, template_id,
        file_name, file_size, page_count, created_at, updated_at
 FROM projects";

fn row_to_project(row: &rusqlite::Row<'_>) -> Result<ProjectRow, StoreError> {
    let meta_raw: String = row_helpers::get(row, 3, "projects", "meta")?;
    let content_raw: String = row_helpers::get(row, 4, "projects", "content")?;
    Ok(ProjectRow {
        id: ProjectId::from_raw(row_helpers::get::<String>(row, 0, "projects", "id")?),
        user_id: UserId::from_raw(row_helpers::get::<String>(row, 1, "projects", "user_id")?),
        title: row_helpers::get(row, 2, "projects", "title")?,
        meta: row_helpers::parse_json(&meta_raw, "projects", "meta")?,
        content: row_helpers::parse_json(&content_raw, "projects", "content")?,
        template_id: TemplateId::from_raw(row_helpers::get::<String>(
            row,
            5,
            "projects",
            "template_id",
        )?),
        file_name: row_helpers::get(row, 6, "projects", "file_name")?,
        file_size: row_helpers::get(row, 7, "projects", "file_size")?,
        page_count: row_helpers::get(row, 8, "projects", "page_count")?,
        created_at: row_helpers::get(row, 9, "projects", "created_at")?,
        updated_at: row_helpers::get(row, 10, "projects", "updated_at")?,
    })
}
