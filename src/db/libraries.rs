use sqlx::{FromRow, SqlitePool};

use super::{new_id, now};
use crate::models::{Book, BookView, Library, NewBookRequest, NewLibraryRequest};

const LIBRARY_COLUMNS: &str = "id, name, address, latitude, longitude, phone, email, description, opening_hours, website, created_at";

const BOOK_COLUMNS: &str = "id, library_id, title, author, isbn, category, language, quantity, available, publication_year, created_at";

#[derive(Debug, FromRow)]
struct LibraryCountRow {
    #[sqlx(flatten)]
    library: Library,
    book_count: i64,
}

/// Every library with the number of book records it holds, by name.
pub async fn fetch_libraries_with_counts(db: &SqlitePool) -> Result<Vec<(Library, i64)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LibraryCountRow>(
        r#"
        SELECT l.id, l.name, l.address, l.latitude, l.longitude, l.phone, l.email,
               l.description, l.opening_hours, l.website, l.created_at,
               (SELECT COUNT(*) FROM books b WHERE b.library_id = l.id) AS book_count
        FROM libraries l
        ORDER BY l.name ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(|r| (r.library, r.book_count)).collect())
}

pub async fn find_library(db: &SqlitePool, id: &str) -> Result<Option<Library>, sqlx::Error> {
    sqlx::query_as::<_, Library>(&format!("SELECT {} FROM libraries WHERE id = ?1", LIBRARY_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn fetch_library_books(db: &SqlitePool, library_id: &str) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(&format!(
        "SELECT {} FROM books WHERE library_id = ?1 ORDER BY title ASC",
        BOOK_COLUMNS
    ))
    .bind(library_id)
    .fetch_all(db)
    .await
}

/// All books with their library name, by title.
pub async fn fetch_book_views(db: &SqlitePool) -> Result<Vec<BookView>, sqlx::Error> {
    sqlx::query_as::<_, BookView>(
        r#"
        SELECT b.id, b.library_id, b.title, b.author, b.isbn, b.category, b.language,
               b.quantity, b.available, b.publication_year, b.created_at,
               l.name AS library_name
        FROM books b
        JOIN libraries l ON l.id = b.library_id
        ORDER BY b.title ASC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn insert_library(db: &SqlitePool, req: NewLibraryRequest) -> Result<Library, sqlx::Error> {
    let library = Library {
        id: new_id(),
        name: req.name,
        address: req.address,
        latitude: req.latitude,
        longitude: req.longitude,
        phone: req.phone,
        email: req.email,
        description: req.description,
        opening_hours: req.opening_hours,
        website: req.website,
        created_at: now(),
    };

    sqlx::query(&format!(
        "INSERT INTO libraries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        LIBRARY_COLUMNS
    ))
    .bind(&library.id)
    .bind(&library.name)
    .bind(&library.address)
    .bind(library.latitude)
    .bind(library.longitude)
    .bind(&library.phone)
    .bind(&library.email)
    .bind(&library.description)
    .bind(&library.opening_hours)
    .bind(&library.website)
    .bind(&library.created_at)
    .execute(db)
    .await?;

    Ok(library)
}

/// Stores a book; `available` defaults to the full `quantity`.
pub async fn insert_book(db: &SqlitePool, req: NewBookRequest) -> Result<Book, sqlx::Error> {
    let book = Book {
        id: new_id(),
        library_id: req.library_id,
        title: req.title,
        author: req.author,
        isbn: req.isbn,
        category: req.category,
        language: req.language,
        quantity: req.quantity,
        available: req.available.unwrap_or(req.quantity),
        publication_year: req.publication_year,
        created_at: now(),
    };

    sqlx::query(&format!(
        "INSERT INTO books ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        BOOK_COLUMNS
    ))
    .bind(&book.id)
    .bind(&book.library_id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.isbn)
    .bind(&book.category)
    .bind(&book.language)
    .bind(book.quantity)
    .bind(book.available)
    .bind(book.publication_year)
    .bind(&book.created_at)
    .execute(db)
    .await?;

    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn new_library(name: &str, lat: f64, lng: f64) -> NewLibraryRequest {
        NewLibraryRequest {
            name: name.to_string(),
            address: format!("{} street", name),
            latitude: lat,
            longitude: lng,
            phone: None,
            email: None,
            description: None,
            opening_hours: Some("08:00-17:00".to_string()),
            website: None,
        }
    }

    fn new_book(library_id: &str, title: &str, quantity: i64, available: Option<i64>) -> NewBookRequest {
        NewBookRequest {
            library_id: library_id.to_string(),
            title: title.to_string(),
            author: "Chinua Achebe".to_string(),
            isbn: None,
            category: "Fiction".to_string(),
            language: "English".to_string(),
            quantity,
            available,
            publication_year: Some(1958),
        }
    }

    #[tokio::test]
    async fn test_libraries_with_book_counts() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let central = insert_library(&pool, new_library("Central", -4.32, 15.31)).await.unwrap();
        insert_library(&pool, new_library("Annex", -4.40, 15.25)).await.unwrap();
        insert_book(&pool, new_book(&central.id, "Things Fall Apart", 3, None)).await.unwrap();
        insert_book(&pool, new_book(&central.id, "Arrow of God", 1, Some(0))).await.unwrap();

        let libraries = fetch_libraries_with_counts(&pool).await.unwrap();
        assert_eq!(libraries.len(), 2);
        assert_eq!(libraries[0].0.name, "Annex");
        assert_eq!(libraries[0].1, 0);
        assert_eq!(libraries[1].1, 2);

        let books = fetch_library_books(&pool, &central.id).await.unwrap();
        assert_eq!(books[0].title, "Arrow of God");
        assert_eq!(books[1].available, 3);

        let views = fetch_book_views(&pool).await.unwrap();
        assert!(views.iter().all(|b| b.library_name == "Central"));
    }

    #[tokio::test]
    async fn test_available_cannot_exceed_quantity() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let library = insert_library(&pool, new_library("Central", 0.0, 0.0)).await.unwrap();

        let result = insert_book(&pool, new_book(&library.id, "Overbooked", 1, Some(2))).await;
        assert!(result.is_err());
    }
}
