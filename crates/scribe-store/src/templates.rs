use chrono::Utc;
use rusqlite::Transaction;
use tracing::{instrument, warn};

use scribe_core::ids::{TemplateId, UserId};
use scribe_core::style::{StyleSheet, Template, DEFAULT_TEMPLATE_NAME};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

pub struct TemplateRepo {
    db: Database,
}

impl TemplateRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Ensure the built-in default template exists. Idempotent; called at
    /// startup.
    #[instrument(skip(self))]
    pub fn seed_default(&self) -> Result<TemplateId, StoreError> {
        self.db.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM templates WHERE is_default = 1 LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .ok();
            if let Some(id) = existing {
                return Ok(TemplateId::from_raw(id));
            }

            let template = Template::classic_professional();
            insert_template(conn, &template)?;
            Ok(template.id)
        })
    }

    /// Get a template by ID.
    #[instrument(skip(self), fields(template_id = %id))]
    pub fn get(&self, id: &TemplateId) -> Result<Template, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_template(row),
                None => Err(StoreError::NotFound(format!("template {id}"))),
            }
        })
    }

    /// Get the default template row.
    pub fn get_default(&self) -> Result<Template, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} WHERE is_default = 1 LIMIT 1"))?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => row_to_template(row),
                None => Err(StoreError::NotFound(DEFAULT_TEMPLATE_NAME.to_string())),
            }
        })
    }

    /// Resolve a requested template to a concrete style source. Unknown or
    /// absent IDs fall back to the default template; a missing default row
    /// is seeded with the built-in so the resolved id always has a catalog
    /// row behind it. Rendering never fails on template lookup.
    #[instrument(skip(self))]
    pub fn resolve(&self, requested: Option<&TemplateId>) -> Result<Template, StoreError> {
        if let Some(id) = requested {
            match self.get(id) {
                Ok(template) => return Ok(template),
                Err(StoreError::NotFound(_)) => {
                    warn!(template_id = %id, "requested template not found, using default");
                }
                Err(e) => return Err(e),
            }
        }
        match self.get_default() {
            Ok(template) => Ok(template),
            Err(StoreError::NotFound(_)) => {
                warn!("default template missing, seeding built-in");
                let id = self.seed_default()?;
                self.get(&id)
            }
            Err(e) => Err(e),
        }
    }

    /// List public templates ordered by usage (most used first).
    #[instrument(skip(self))]
    pub fn list_public(&self) -> Result<Vec<Template>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE is_public = 1 ORDER BY usage_count DESC, name ASC"
            ))?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_template(row)?);
            }
            Ok(results)
        })
    }

    /// Create a user-owned template.
    #[instrument(skip(self, style), fields(user_id = %user_id, name))]
    pub fn create(
        &self,
        user_id: &UserId,
        name: &str,
        description: &str,
        preview_color: &str,
        style: StyleSheet,
    ) -> Result<Template, StoreError> {
        let template = Template {
            id: TemplateId::new(),
            name: name.to_string(),
            description: description.to_string(),
            preview_color: preview_color.to_string(),
            is_default: false,
            is_public: false,
            usage_count: 0,
            user_id: Some(user_id.clone()),
            style,
        };
        self.db.with_conn(|conn| insert_template(conn, &template))?;
        Ok(template)
    }
}

/// Increment a template's usage counter inside an open transaction.
pub fn bump_usage_tx(tx: &Transaction<'_>, id: &TemplateId) -> Result<(), StoreError> {
    let now = Utc::now().to_rfc3339();
    tx.execute(
        "UPDATE templates SET usage_count = usage_count + 1, updated_at = ?1 WHERE id = ?2",
        rusqlite::params![now, id.as_str()],
    )?;
    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, name, description, preview_color, is_default, is_public,
        usage_count, user_id, style
 FROM templates";

fn insert_template(conn: &rusqlite::Connection, template: &Template) -> Result<(), StoreError> {
    let now = Utc::now().to_rfc3339();
    let style_json = serde_json::to_string(&template.style)?;
    conn.execute(
        "INSERT INTO templates (id, name, description, preview_color, is_default, is_public,
                                usage_count, user_id, style, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            template.id.as_str(),
            template.name,
            template.description,
            template.preview_color,
            template.is_default as i64,
            template.is_public as i64,
            template.usage_count,
            template.user_id.as_ref().map(|u| u.as_str()),
            style_json,
            now,
            now,
        ],
    )?;
    Ok(())
}

fn row_to_template(row: &rusqlite::Row<'_>) -> Result<Template, StoreError> {
    let style_raw: String = row_helpers::get(row, 8, "templates", "style")?;
    Ok(Template {
        id: TemplateId::from_raw(row_helpers::get::<String>(row, 0, "templates", "id")?),
        name: row_helpers::get(row, 1, "templates", "name")?,
        description: row_helpers::get(row, 2, "templates", "description")?,
        preview_color: row_helpers::get(row, 3, "templates", "preview_color")?,
        is_default: row_helpers::get::<i64>(row, 4, "templates", "is_default")? != 0,
        is_public: row_helpers::get::<i64>(row, 5, "templates", "is_public")? != 0,
        usage_count: row_helpers::get(row, 6, "templates", "usage_count")?,
        user_id: row_helpers::get_opt::<String>(row, 7, "templates", "user_id")?
            .map(UserId::from_raw),
        style: row_helpers::parse_json(&style_raw, "templates", "style")?,
    })
}
