use sqlx::SqlitePool;

use super::{new_id, now};
use crate::models::{Event, EventView, NewEventRequest, UpdateEventRequest};

const EVENT_VIEW_SELECT: &str = r#"
    SELECT ev.id, ev.title, ev.description, ev.event_type, ev.location, ev.course_id,
           ev.start_time, ev.end_time, ev.created_by, ev.created_at,
           c.code AS course_code, c.name AS course_name
    FROM events ev
    LEFT JOIN courses c ON c.id = ev.course_id
"#;

/// Events ordered by start time, optionally bounded (inclusive) on `start_time`.
///
/// Bounds must already be in the stored timestamp form.
pub async fn fetch_events(
    db: &SqlitePool,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<EventView>, sqlx::Error> {
    sqlx::query_as::<_, EventView>(&format!(
        r#"{}
        WHERE (?1 IS NULL OR ev.start_time >= ?1)
          AND (?2 IS NULL OR ev.start_time <= ?2)
        ORDER BY ev.start_time ASC"#,
        EVENT_VIEW_SELECT
    ))
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

/// The next events of the courses a student is enrolled in.
pub async fn fetch_upcoming_for_student(
    db: &SqlitePool,
    student_id: &str,
    limit: i64,
) -> Result<Vec<EventView>, sqlx::Error> {
    sqlx::query_as::<_, EventView>(&format!(
        r#"{}
        WHERE ev.course_id IN (SELECT course_id FROM enrollments WHERE student_id = ?1)
          AND ev.start_time >= ?2
        ORDER BY ev.start_time ASC
        LIMIT ?3"#,
        EVENT_VIEW_SELECT
    ))
    .bind(student_id)
    .bind(now())
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Most recently created events, for the activity feed.
pub async fn fetch_recent_events(db: &SqlitePool, limit: i64) -> Result<Vec<EventView>, sqlx::Error> {
    sqlx::query_as::<_, EventView>(&format!(
        "{} ORDER BY ev.created_at DESC LIMIT ?1",
        EVENT_VIEW_SELECT
    ))
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn find_event(db: &SqlitePool, id: &str) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT id, title, description, event_type, location, course_id,
               start_time, end_time, created_by, created_at
        FROM events
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_event(
    db: &SqlitePool,
    req: NewEventRequest,
    created_by: &str,
) -> Result<Event, sqlx::Error> {
    let event = Event {
        id: new_id(),
        title: req.title,
        description: req.description,
        event_type: req.event_type,
        location: req.location,
        course_id: req.course_id.filter(|c| !c.is_empty()),
        start_time: req.start_time,
        end_time: req.end_time,
        created_by: created_by.to_string(),
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO events
            (id, title, description, event_type, location, course_id,
             start_time, end_time, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&event.id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.event_type)
    .bind(&event.location)
    .bind(&event.course_id)
    .bind(&event.start_time)
    .bind(&event.end_time)
    .bind(&event.created_by)
    .bind(&event.created_at)
    .execute(db)
    .await?;

    Ok(event)
}

/// Applies the changed fields. An empty `course_id` detaches the event from its course.
pub async fn update_event(
    db: &SqlitePool,
    id: &str,
    req: UpdateEventRequest,
) -> Result<Option<Event>, sqlx::Error> {
    let mut current = match find_event(db, id).await? {
        Some(e) => e,
        None => return Ok(None),
    };

    if let Some(title) = req.title {
        current.title = title;
    }
    if let Some(description) = req.description {
        current.description = Some(description);
    }
    if let Some(event_type) = req.event_type {
        current.event_type = Some(event_type);
    }
    if let Some(location) = req.location {
        current.location = Some(location);
    }
    if let Some(course_id) = req.course_id {
        current.course_id = Some(course_id).filter(|c| !c.is_empty());
    }
    if let Some(start_time) = req.start_time {
        current.start_time = start_time;
    }
    if let Some(end_time) = req.end_time {
        current.end_time = Some(end_time);
    }

    sqlx::query(
        r#"
        UPDATE events
        SET title = ?1,
            description = ?2,
            event_type = ?3,
            location = ?4,
            course_id = ?5,
            start_time = ?6,
            end_time = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&current.title)
    .bind(&current.description)
    .bind(&current.event_type)
    .bind(&current.location)
    .bind(&current.course_id)
    .bind(&current.start_time)
    .bind(&current.end_time)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_event(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
