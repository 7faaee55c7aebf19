use sqlx::SqlitePool;

use super::now;
use crate::models::{NewProfileRequest, Profile, UpdateProfileRequest, UserRole};

const PROFILE_COLUMNS: &str = "id, email, role, full_name, phone, home_address, home_latitude, home_longitude, created_at";

pub async fn find_profile(db: &SqlitePool, id: &str) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles WHERE id = ?",
        PROFILE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_profile(db: &SqlitePool, req: NewProfileRequest) -> Result<Profile, sqlx::Error> {
    let profile = Profile {
        id: req.id,
        email: req.email,
        role: req.role.unwrap_or(UserRole::Student),
        full_name: req.full_name,
        phone: req.phone,
        home_address: None,
        home_latitude: None,
        home_longitude: None,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, role, full_name, phone, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.email)
    .bind(profile.role)
    .bind(&profile.full_name)
    .bind(&profile.phone)
    .bind(&profile.created_at)
    .execute(db)
    .await?;

    Ok(profile)
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let escaped = s
                .to_lowercase()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
}

/// Students ordered by name, optionally matching `search` on name or email.
pub async fn fetch_students(db: &SqlitePool, search: Option<&str>) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        r#"
        SELECT {}
        FROM profiles
        WHERE role = 'student'
          AND (?1 IS NULL
               OR LOWER(COALESCE(full_name, '')) LIKE ?1 ESCAPE '\'
               OR LOWER(email) LIKE ?1 ESCAPE '\')
        ORDER BY full_name ASC, email ASC
        "#,
        PROFILE_COLUMNS
    ))
    .bind(search_pattern(search))
    .fetch_all(db)
    .await
}

/// Teachers and tenured professors ordered by name.
pub async fn fetch_staff(db: &SqlitePool) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        r#"
        SELECT {}
        FROM profiles
        WHERE role IN ('teacher', 'tenured_professor')
        ORDER BY full_name ASC, email ASC
        "#,
        PROFILE_COLUMNS
    ))
    .fetch_all(db)
    .await
}

/// Students with a recorded home address. With `teacher_id`, only students
/// enrolled in one of that teacher's courses.
pub async fn fetch_students_with_home(
    db: &SqlitePool,
    teacher_id: Option<&str>,
) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        SELECT p.id, p.email, p.role, p.full_name, p.phone, p.home_address,
               p.home_latitude, p.home_longitude, p.created_at
        FROM profiles p
        WHERE p.role = 'student'
          AND p.home_address IS NOT NULL
          AND (?1 IS NULL OR p.id IN (
                SELECT e.student_id
                FROM enrollments e
                JOIN courses c ON c.id = e.course_id
                WHERE c.teacher_id = ?1
          ))
        ORDER BY p.full_name ASC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db)
    .await
}

pub async fn update_profile(
    db: &SqlitePool,
    id: &str,
    req: UpdateProfileRequest,
) -> Result<Option<Profile>, sqlx::Error> {
    let mut current = match find_profile(db, id).await? {
        Some(p) => p,
        None => return Ok(None),
    };

    if let Some(full_name) = req.full_name {
        current.full_name = Some(full_name);
    }
    if let Some(phone) = req.phone {
        current.phone = Some(phone);
    }
    match req.home_address {
        Some(address) if address.trim().is_empty() => {
            current.home_address = None;
            current.home_latitude = None;
            current.home_longitude = None;
        }
        Some(address) => {
            current.home_address = Some(address);
            current.home_latitude = req.home_latitude;
            current.home_longitude = req.home_longitude;
        }
        None => {
            if let (Some(lat), Some(lng)) = (req.home_latitude, req.home_longitude) {
                current.home_latitude = Some(lat);
                current.home_longitude = Some(lng);
            }
        }
    }

    sqlx::query(
        r#"
        UPDATE profiles
        SET full_name = ?1,
            phone = ?2,
            home_address = ?3,
            home_latitude = ?4,
            home_longitude = ?5
        WHERE id = ?6
        "#,
    )
    .bind(&current.full_name)
    .bind(&current.phone)
    .bind(&current.home_address)
    .bind(current.home_latitude)
    .bind(current.home_longitude)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn update_role(db: &SqlitePool, id: &str, role: UserRole) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE profiles SET role = ?1 WHERE id = ?2")
        .bind(role)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn count_students(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE role = 'student'")
        .fetch_one(db)
        .await
}

pub async fn count_staff(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM profiles WHERE role IN ('teacher', 'tenured_professor')",
    )
    .fetch_one(db)
    .await
}
