use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::db::{courses, enrollments, grades};
use crate::error::AppError;
use crate::models::{CourseWithTeacher, Grade};
use crate::stats::{
    ClassReport, CourseReportSummary, RosterEntry, StudentGradeStats, build_class_report,
    student_grade_stats, summarize_course,
};

/// Loads course and grade rows and hands them to the report builders.
pub struct ReportService {
    db: SqlitePool,
}

impl ReportService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn class_report(&self, entry: CourseWithTeacher) -> Result<ClassReport, AppError> {
        let course_id = entry.course.id.as_str();
        let (roster, course_grades) = tokio::try_join!(
            enrollments::fetch_enrollments(&self.db, Some(course_id)),
            grades::fetch_course_grades(&self.db, course_id),
        )?;

        let mut by_student: HashMap<String, Vec<Grade>> = HashMap::new();
        for grade in course_grades {
            by_student.entry(grade.student_id.clone()).or_default().push(grade);
        }

        let roster: Vec<RosterEntry> = roster
            .iter()
            .map(|e| RosterEntry {
                student: e.student(),
                grades: by_student.remove(&e.student_id).unwrap_or_default(),
            })
            .collect();
        debug!("Building report for course {} over {} students", course_id, roster.len());

        Ok(build_class_report(&entry.course, entry.teacher, roster))
    }

    /// One summary row per course, newest course first.
    pub async fn all_reports(&self) -> Result<Vec<CourseReportSummary>, AppError> {
        let (all_courses, all_enrollments, all_grades) = tokio::try_join!(
            courses::fetch_courses(&self.db, None),
            enrollments::fetch_all_enrollments(&self.db),
            grades::fetch_all_grades(&self.db),
        )?;

        let mut enrolled: HashMap<&str, usize> = HashMap::new();
        for e in &all_enrollments {
            *enrolled.entry(e.course_id.as_str()).or_default() += 1;
        }
        let mut graded: HashMap<&str, Vec<Grade>> = HashMap::new();
        for g in &all_grades {
            graded.entry(g.course_id.as_str()).or_default().push(g.clone());
        }

        Ok(all_courses
            .into_iter()
            .map(|entry| {
                let id = entry.course.id.as_str();
                let count = enrolled.get(id).copied().unwrap_or(0);
                let course_grades = graded.get(id).map(Vec::as_slice).unwrap_or(&[]);
                summarize_course(&entry.course, entry.teacher.clone(), count, course_grades)
            })
            .collect())
    }

    pub async fn student_stats(&self, student_id: &str) -> Result<StudentGradeStats, AppError> {
        let views = grades::fetch_grades(&self.db, Some(student_id), None).await?;
        Ok(student_grade_stats(&views))
    }
}
