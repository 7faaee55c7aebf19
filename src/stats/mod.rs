//! Pure reductions over grade rows: averages, 4.0-scale GPA, class reports and
//! the professor analytics. Nothing here touches the database.

pub mod analytics;
pub mod grades;
pub mod report;

use serde::Serialize;

pub use grades::{CourseAverage, StudentGradeStats, average_percentage, gpa, student_grade_stats};
pub use report::{
    ClassReport, CourseReportSummary, RosterEntry, StudentStanding, build_class_report,
    summarize_course,
};

/// Percentage cutoffs for A, B, C and D. Fixed, not configurable.
pub const CUTOFF_A: f64 = 90.0;
pub const CUTOFF_B: f64 = 80.0;
pub const CUTOFF_C: f64 = 70.0;
pub const CUTOFF_D: f64 = 60.0;

/// Minimum average (percent) counted as passing.
pub const PASSING_THRESHOLD: f64 = 60.0;

/// 4.0-scale grade point for a percentage.
pub fn grade_point(percentage: f64) -> f64 {
    if percentage >= CUTOFF_A {
        4.0
    } else if percentage >= CUTOFF_B {
        3.0
    } else if percentage >= CUTOFF_C {
        2.0
    } else if percentage >= CUTOFF_D {
        1.0
    } else {
        0.0
    }
}

pub fn is_passing(percentage: f64) -> bool {
    percentage >= PASSING_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Standing {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Below Average")]
    BelowAverage,
    Failing,
}

impl Standing {
    pub fn from_average(average: f64) -> Self {
        if average >= CUTOFF_A {
            Standing::Excellent
        } else if average >= CUTOFF_B {
            Standing::Good
        } else if average >= CUTOFF_C {
            Standing::Average
        } else if average >= CUTOFF_D {
            Standing::BelowAverage
        } else {
            Standing::Failing
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Standing::Excellent => "Excellent",
            Standing::Good => "Good",
            Standing::Average => "Average",
            Standing::BelowAverage => "Below Average",
            Standing::Failing => "Failing",
        }
    }
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, zero for an empty input.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::Grade;

    pub fn grade(student: &str, course: &str, score: f64, max_score: f64) -> Grade {
        Grade {
            id: format!("{}-{}-{}", student, course, score),
            student_id: student.to_string(),
            course_id: course.to_string(),
            assignment_name: Some("Quiz".to_string()),
            score,
            max_score,
            grade_type: Some("quiz".to_string()),
            created_by: "teacher".to_string(),
            created_at: "2026-03-01T09:00:00Z".to_string(),
        }
    }
}
