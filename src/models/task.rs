use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A task entity as stored in the database and returned by the API.
///
/// The optional image attachment is not part of this struct; it is selected
/// only by the dedicated binary endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub description: String,
    pub completed: bool,
    /// Id of the user owning this task. Every query touching tasks filters
    /// on this column as well as the id.
    pub owner: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input structure for creating a task.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(custom = "crate::models::not_blank")]
    pub description: String,
    /// Defaults to false when absent.
    pub completed: Option<bool>,
}

/// Update payload for `PATCH /tasks/{id}`.
///
/// Only description and completed are mutable; `deny_unknown_fields` rejects
/// a payload carrying anything else before the task is touched.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    #[validate(custom = "crate::models::not_blank")]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Query parameters for task listing.
///
/// Every parameter is accepted as a raw string and parsed leniently: a value
/// that does not parse is ignored instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub completed: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

/// Columns permitted in `sortBy`; anything else falls back to the default
/// ordering.
const SORTABLE_COLUMNS: [&str; 4] = ["description", "completed", "created_at", "updated_at"];

impl TaskQuery {
    /// `completed=true` filters to completed tasks; any other present value
    /// filters to open ones.
    pub fn completed_filter(&self) -> Option<bool> {
        self.completed.as_deref().map(|value| value == "true")
    }

    pub fn limit(&self) -> Option<i64> {
        parse_page_value(self.limit.as_deref())
    }

    pub fn skip(&self) -> Option<i64> {
        parse_page_value(self.skip.as_deref())
    }

    /// Resolves `sortBy=field:direction` into a safe ORDER BY clause,
    /// defaulting to newest-first.
    pub fn order_by(&self) -> String {
        if let Some(sort_by) = self.sort_by.as_deref() {
            let (field, direction) = sort_by.split_once(':').unwrap_or((sort_by, "asc"));
            if SORTABLE_COLUMNS.contains(&field) {
                let direction = if direction.eq_ignore_ascii_case("desc") {
                    "DESC"
                } else {
                    "ASC"
                };
                return format!("{} {}", field, direction);
            }
        }
        "created_at DESC".to_string()
    }
}

fn parse_page_value(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.parse::<i64>().ok()).filter(|n| *n >= 0)
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the owner's id, stamping
    /// a fresh UUID and creation time.
    pub fn new(input: TaskInput, owner: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: input.description.trim().to_string(),
            completed: input.completed.unwrap_or(false),
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}
