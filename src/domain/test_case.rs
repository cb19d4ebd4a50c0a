use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Doubles as the generation test type: the backend uses the same five
/// values for both roles.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Functional,
    Performance,
    Security,
    Usability,
    Integration,
}

impl Default for Category {
    fn default() -> Self {
        Category::Functional
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Functional => "Functional",
            Category::Performance => "Performance",
            Category::Security => "Security",
            Category::Usability => "Usability",
            Category::Integration => "Integration",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TestCase {
    pub id: String,
    pub title: String,
    pub description: String,
    pub preconditions: String,
    pub steps: Vec<String>,
    pub expected_result: String,
    pub priority: Priority,
    pub category: Category,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update payload for `PUT /test-cases/{id}`. Absent fields are not
/// transmitted, so the same type serves full edits and selection toggling.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TestCaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,
}

impl TestCaseUpdate {
    pub fn selection(selected: bool) -> Self {
        Self {
            is_selected: Some(selected),
            ..Self::default()
        }
    }

    /// Edit forms may hold blank step rows while the user is typing; a
    /// persisted steps sequence must not contain them.
    pub fn normalized(mut self) -> Self {
        if let Some(steps) = self.steps.take() {
            self.steps = Some(strip_blank_steps(steps));
        }
        self
    }
}

pub fn strip_blank_steps(steps: Vec<String>) -> Vec<String> {
    steps
        .into_iter()
        .filter(|step| !step.trim().is_empty())
        .collect()
}
