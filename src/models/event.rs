use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub course_id: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub course_id: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub course_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}
