use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        Course {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category: None,
            created_at: Some(Utc::now()),
        }
    }
}
