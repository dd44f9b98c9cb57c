use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Longest accepted title, in characters
pub const MAX_TITLE_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title must be at most 255 characters")]
    TitleTooLong,
}

/// Partial update of a todo; absent fields are left untouched
///
/// An empty `description` clears the stored description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
}

/// Todo aggregate root
///
/// A task on one user's personal list.
///
/// # Invariants
/// - Title is non-empty and at most 255 characters
/// - Owner never changes after creation
/// - New todos start incomplete
///
/// # Example
/// ```
/// use chrono::Utc;
/// use todo_api::domain::todo::{Todo, TodoUpdate};
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let mut todo = Todo::new(owner, "Buy milk".to_string(), None, Utc::now(), Utc::now())
///     .expect("valid todo");
/// assert!(!todo.is_completed());
///
/// todo.apply(TodoUpdate { is_completed: Some(true), ..Default::default() }, Utc::now())
///     .unwrap();
/// assert!(todo.is_completed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    is_completed: bool,
    due_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<String, TodoError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TodoError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TodoError::TitleTooLong);
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

impl Todo {
    /// Creates a new todo owned by `user_id`
    pub fn new(
        user_id: Uuid,
        title: String,
        description: Option<String>,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, TodoError> {
        let title = validate_title(&title)?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description: normalize_description(description),
            is_completed: false,
            due_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update
    ///
    /// Validation happens before any field is touched, so a rejected update
    /// leaves the todo unchanged.
    pub fn apply(&mut self, update: TodoUpdate, now: DateTime<Utc>) -> Result<(), TodoError> {
        let title = update.title.as_deref().map(validate_title).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = normalize_description(Some(description));
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(is_completed) = update.is_completed {
            self.is_completed = is_completed;
        }
        self.updated_at = now;

        Ok(())
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Todo from persistence layer data
    ///
    /// # Note
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        user_id: Uuid,
        title: String,
        description: Option<String>,
        is_completed: bool,
        due_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            title,
            description,
            is_completed,
            due_date,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(owner: Uuid) -> Todo {
        Todo::new(
            owner,
            "Write report".to_string(),
            Some("quarterly numbers".to_string()),
            Utc::now() + Duration::days(1),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_todo_with_valid_title() {
        let owner = Uuid::new_v4();
        let todo = sample(owner);

        assert_eq!(todo.title(), "Write report");
        assert_eq!(todo.description(), Some("quarterly numbers"));
        assert_eq!(todo.user_id(), owner);
        assert!(!todo.is_completed());
    }

    #[test]
    fn create_todo_with_blank_title_fails() {
        let result = Todo::new(Uuid::new_v4(), "  ".to_string(), None, Utc::now(), Utc::now());
        assert_eq!(result.unwrap_err(), TodoError::EmptyTitle);
    }

    #[test]
    fn create_todo_with_long_title_fails() {
        let result = Todo::new(
            Uuid::new_v4(),
            "x".repeat(MAX_TITLE_LEN + 1),
            None,
            Utc::now(),
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), TodoError::TitleTooLong);
    }

    #[test]
    fn blank_description_is_stored_as_none() {
        let todo = Todo::new(
            Uuid::new_v4(),
            "t".to_string(),
            Some("   ".to_string()),
            Utc::now(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(todo.description(), None);
    }

    #[test]
    fn update_changes_only_present_fields() {
        let mut todo = sample(Uuid::new_v4());
        let due = todo.due_date();

        todo.apply(
            TodoUpdate {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(todo.title(), "Renamed");
        assert_eq!(todo.description(), Some("quarterly numbers"));
        assert_eq!(todo.due_date(), due);
    }

    #[test]
    fn update_can_reopen_completed_todo() {
        let mut todo = sample(Uuid::new_v4());
        let done = TodoUpdate {
            is_completed: Some(true),
            ..Default::default()
        };
        todo.apply(done, Utc::now()).unwrap();
        assert!(todo.is_completed());

        let reopen = TodoUpdate {
            is_completed: Some(false),
            ..Default::default()
        };
        todo.apply(reopen, Utc::now()).unwrap();
        assert!(!todo.is_completed());
    }

    #[test]
    fn update_with_empty_description_clears_it() {
        let mut todo = sample(Uuid::new_v4());
        todo.apply(
            TodoUpdate {
                description: Some(String::new()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(todo.description(), None);
    }

    #[test]
    fn rejected_update_leaves_todo_unchanged() {
        let mut todo = sample(Uuid::new_v4());
        let before = todo.clone();

        let result = todo.apply(
            TodoUpdate {
                title: Some(" ".to_string()),
                is_completed: Some(true),
                ..Default::default()
            },
            Utc::now(),
        );

        assert_eq!(result.unwrap_err(), TodoError::EmptyTitle);
        assert_eq!(todo, before);
    }

    #[test]
    fn ownership_check() {
        let owner = Uuid::new_v4();
        let todo = sample(owner);

        assert!(todo.is_owned_by(owner));
        assert!(!todo.is_owned_by(Uuid::new_v4()));
    }
}
