use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::tasks::repo_types::{NewTask, Task};

/// Body of `POST /tasks`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
}

impl CreateTaskRequest {
    pub fn into_new_task(self, user_id: Uuid) -> Result<NewTask, String> {
        let title = validate_title(&self.title)?;
        Ok(NewTask {
            user_id,
            title,
            details: self.details,
            is_completed: self.is_completed,
            due_date: self.due_date,
        })
    }
}

/// Body of `PATCH /tasks/:id`. An absent field leaves the stored value alone;
/// an explicit `null` clears the nullable ones.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub details: Option<Option<String>>,
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "present_datetime")]
    pub due_date: Option<Option<OffsetDateTime>>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(())
    }

    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(details) = self.details {
            task.details = details;
        }
        if let Some(done) = self.is_completed {
            task.is_completed = done;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
    }
}

fn validate_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("title is required".into());
    }
    Ok(title.to_string())
}

// Only called when the key is present, so `null` becomes `Some(None)`.
fn present<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn present_datetime<'de, D>(de: D) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    time::serde::rfc3339::option::deserialize(de).map(Some)
}
