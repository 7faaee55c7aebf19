use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Teacher,
    TenuredProfessor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::TenuredProfessor => "tenured_professor",
        }
    }

    /// Teachers and tenured professors.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Teacher | UserRole::TenuredProfessor)
    }

    pub fn is_professor(&self) -> bool {
        matches!(self, UserRole::TenuredProfessor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub home_address: Option<String>,
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
    pub created_at: String,
}

impl Profile {
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The id/name/email triple embedded in joined responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProfileSummary {
    pub id: String,
    pub full_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfileRequest {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    /// An empty string clears the stored address and coordinates.
    pub home_address: Option<String>,
    pub home_latitude: Option<f64>,
    pub home_longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub new_role: UserRole,
}
