use std::cmp::Ordering;

use serde::Serialize;

use super::{Standing, average_percentage, gpa, is_passing, mean, round2};
use crate::models::{Course, Grade, ProfileSummary};

/// One enrolled student and their grades in the reported course.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub student: ProfileSummary,
    pub grades: Vec<Grade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentStanding {
    pub student: ProfileSummary,
    pub total_grades: usize,
    pub average_score: f64,
    pub gpa: f64,
    pub status: Standing,
    pub is_passing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportCourse {
    pub id: String,
    pub code: String,
    pub name: String,
    pub teacher: Option<ProfileSummary>,
    pub total_students: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStats {
    pub average: f64,
    pub gpa: f64,
    pub passing_count: usize,
    pub failing_count: usize,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub course: ReportCourse,
    pub class_stats: ClassStats,
    pub students: Vec<StudentStanding>,
    pub top_performer: Option<StudentStanding>,
    pub lowest_performer: Option<StudentStanding>,
}

fn standing(entry: RosterEntry) -> StudentStanding {
    let average = average_percentage(&entry.grades);
    StudentStanding {
        total_grades: entry.grades.len(),
        average_score: round2(average),
        gpa: round2(gpa(&entry.grades)),
        status: Standing::from_average(average),
        is_passing: is_passing(average),
        student: entry.student,
    }
}

/// Builds the per-student standings and class statistics for one course.
///
/// Standings are sorted by average descending (stable, so ties keep roster
/// order); the top and lowest performers are the ends of that list.
pub fn build_class_report(
    course: &Course,
    teacher: Option<ProfileSummary>,
    roster: Vec<RosterEntry>,
) -> ClassReport {
    let mut students: Vec<StudentStanding> = roster.into_iter().map(standing).collect();
    students.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
    });

    let passing_count = students.iter().filter(|s| s.is_passing).count();
    let failing_count = students.len() - passing_count;
    let pass_rate = if students.is_empty() {
        0.0
    } else {
        round2(passing_count as f64 / students.len() as f64 * 100.0)
    };

    let class_stats = ClassStats {
        average: round2(mean(students.iter().map(|s| s.average_score))),
        gpa: round2(mean(students.iter().map(|s| s.gpa))),
        passing_count,
        failing_count,
        pass_rate,
    };

    ClassReport {
        course: ReportCourse {
            id: course.id.clone(),
            code: course.code.clone(),
            name: course.name.clone(),
            teacher,
            total_students: students.len(),
        },
        class_stats,
        top_performer: students.first().cloned(),
        lowest_performer: students.last().cloned(),
        students,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseReportSummary {
    pub id: String,
    pub code: String,
    pub name: String,
    pub teacher: Option<ProfileSummary>,
    pub total_students: usize,
    pub total_grades: usize,
    pub average_score: f64,
    /// Percentage of individual grades at or above the passing threshold.
    pub pass_rate: f64,
}

/// Headline numbers for one course in the all-classes overview.
pub fn summarize_course(
    course: &Course,
    teacher: Option<ProfileSummary>,
    enrolled_students: usize,
    grades: &[Grade],
) -> CourseReportSummary {
    let passing = grades.iter().filter(|g| is_passing(g.percentage())).count();
    let pass_rate = if grades.is_empty() {
        0.0
    } else {
        round2(passing as f64 / grades.len() as f64 * 100.0)
    };

    CourseReportSummary {
        id: course.id.clone(),
        code: course.code.clone(),
        name: course.name.clone(),
        teacher,
        total_students: enrolled_students,
        total_grades: grades.len(),
        average_score: round2(average_percentage(grades)),
        pass_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::grade;

    fn course() -> Course {
        Course {
            id: "c1".to_string(),
            code: "MATH101".to_string(),
            name: "Algebra".to_string(),
            description: None,
            teacher_id: Some("t1".to_string()),
            semester: Some("Fall".to_string()),
            credits: 3,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn student(id: &str) -> ProfileSummary {
        ProfileSummary {
            id: id.to_string(),
            full_name: Some(id.to_uppercase()),
            email: format!("{}@example.com", id),
        }
    }

    fn entry(id: &str, scores: &[f64]) -> RosterEntry {
        RosterEntry {
            student: student(id),
            grades: scores.iter().map(|s| grade(id, "c1", *s, 100.0)).collect(),
        }
    }

    #[test]
    fn sorts_students_and_picks_extremes() {
        let report = build_class_report(
            &course(),
            None,
            vec![
                entry("bea", &[70.0, 80.0]),
                entry("ali", &[95.0, 91.0]),
                entry("cyr", &[40.0, 50.0]),
            ],
        );

        let order: Vec<_> = report.students.iter().map(|s| s.student.id.as_str()).collect();
        assert_eq!(order, vec!["ali", "bea", "cyr"]);
        assert_eq!(report.top_performer.as_ref(), report.students.first());
        assert_eq!(report.lowest_performer.as_ref(), report.students.last());

        assert_eq!(report.students[0].status, Standing::Excellent);
        assert_eq!(report.students[1].status, Standing::Average);
        assert_eq!(report.students[2].status, Standing::Failing);
        assert!(!report.students[2].is_passing);

        assert_eq!(report.class_stats.passing_count, 2);
        assert_eq!(report.class_stats.failing_count, 1);
        assert_eq!(report.class_stats.pass_rate, 66.67);
        // (93 + 75 + 45) / 3
        assert_eq!(report.class_stats.average, 71.0);
        // (4 + 2.5 + 0) / 3
        assert_eq!(report.class_stats.gpa, 2.17);
        assert_eq!(report.course.total_students, 3);
    }

    #[test]
    fn single_student_is_both_top_and_lowest() {
        let report = build_class_report(&course(), None, vec![entry("solo", &[88.0])]);
        assert_eq!(report.top_performer, report.lowest_performer);
        assert!(report.top_performer.is_some());
        assert_eq!(report.students[0].status, Standing::Good);
    }

    #[test]
    fn empty_course_has_zeroed_stats() {
        let report = build_class_report(&course(), Some(student("t1")), Vec::new());
        assert!(report.students.is_empty());
        assert!(report.top_performer.is_none());
        assert!(report.lowest_performer.is_none());
        assert_eq!(
            report.class_stats,
            ClassStats {
                average: 0.0,
                gpa: 0.0,
                passing_count: 0,
                failing_count: 0,
                pass_rate: 0.0,
            }
        );
    }

    #[test]
    fn student_without_grades_counts_as_failing() {
        let report = build_class_report(
            &course(),
            None,
            vec![entry("new", &[]), entry("old", &[60.0])],
        );
        assert_eq!(report.students[0].student.id, "old");
        assert_eq!(report.students[0].status, Standing::BelowAverage);
        assert_eq!(report.students[1].average_score, 0.0);
        assert_eq!(report.students[1].status, Standing::Failing);
        assert_eq!(report.class_stats.pass_rate, 50.0);
    }

    #[test]
    fn summary_pass_rate_counts_grades() {
        let grades = vec![
            grade("a", "c1", 59.0, 100.0),
            grade("a", "c1", 60.0, 100.0),
            grade("b", "c1", 18.0, 20.0),
            grade("b", "c1", 5.0, 20.0),
        ];
        let summary = summarize_course(&course(), None, 2, &grades);
        assert_eq!(summary.total_students, 2);
        assert_eq!(summary.total_grades, 4);
        assert_eq!(summary.pass_rate, 50.0);
        // (59 + 60 + 90 + 25) / 4
        assert_eq!(summary.average_score, 58.5);
    }
}
