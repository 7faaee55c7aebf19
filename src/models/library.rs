use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Library {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub opening_hours: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: String,
    pub library_id: String,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub language: String,
    pub quantity: i64,
    pub available: i64,
    pub publication_year: Option<i32>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub book: Book,
    pub library_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLibraryRequest {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub opening_hours: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookRequest {
    pub library_id: String,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub language: String,
    pub quantity: i64,
    pub available: Option<i64>,
    pub publication_year: Option<i32>,
}
