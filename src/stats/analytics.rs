use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Months, Utc};
use serde::Serialize;

use super::{CUTOFF_A, CUTOFF_B, CUTOFF_C, CUTOFF_D, average_percentage, round2};
use crate::models::{
    CourseWithTeacher, Enrollment, EnrollmentView, EventView, Grade, GradeView, ProfileSummary,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemSummary {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_courses: i64,
    pub total_enrollments: i64,
    pub total_grades: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub grade: &'static str,
    pub count: usize,
}

const BUCKET_LABELS: [&str; 5] = [
    "A (90-100%)",
    "B (80-89%)",
    "C (70-79%)",
    "D (60-69%)",
    "F (0-59%)",
];

fn bucket_index(percentage: f64) -> usize {
    if percentage >= CUTOFF_A {
        0
    } else if percentage >= CUTOFF_B {
        1
    } else if percentage >= CUTOFF_C {
        2
    } else if percentage >= CUTOFF_D {
        3
    } else {
        4
    }
}

/// Letter-grade histogram, always five buckets from A to F.
pub fn grade_distribution(grades: &[Grade]) -> Vec<DistributionBucket> {
    let mut counts = [0usize; 5];
    for grade in grades {
        counts[bucket_index(grade.percentage())] += 1;
    }
    BUCKET_LABELS
        .into_iter()
        .zip(counts)
        .map(|(label, count)| DistributionBucket {
            grade: label,
            count,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentPerformance {
    pub student: ProfileSummary,
    pub average: f64,
    pub grade_count: usize,
    pub highest: f64,
    pub lowest: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoursePerformance {
    pub course_id: String,
    pub code: String,
    pub name: String,
    pub average: f64,
    pub grade_count: usize,
    pub highest: f64,
    pub lowest: f64,
}

/// Running percentage totals for one group, keyed by the first row seen.
struct Tally<'a> {
    first: &'a GradeView,
    total: f64,
    count: usize,
    highest: f64,
    lowest: f64,
}

impl<'a> Tally<'a> {
    fn new(first: &'a GradeView) -> Self {
        Self {
            first,
            total: 0.0,
            count: 0,
            highest: f64::MIN,
            lowest: f64::MAX,
        }
    }

    fn add(&mut self, percentage: f64) {
        self.total += percentage;
        self.count += 1;
        self.highest = self.highest.max(percentage);
        self.lowest = self.lowest.min(percentage);
    }

    fn average(&self) -> f64 {
        round2(self.total / self.count as f64)
    }
}

fn tally_by<'a, F>(grades: &'a [GradeView], key: F) -> Vec<Tally<'a>>
where
    F: Fn(&GradeView) -> &str,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut tallies: Vec<Tally<'a>> = Vec::new();
    for view in grades {
        let slot = *index.entry(key(view)).or_insert_with(|| {
            tallies.push(Tally::new(view));
            tallies.len() - 1
        });
        tallies[slot].add(view.grade.percentage());
    }
    tallies
}

fn by_average_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Students ranked by mean percentage, best first, at most `limit` entries.
pub fn top_students(grades: &[GradeView], limit: usize) -> Vec<StudentPerformance> {
    let mut ranked: Vec<StudentPerformance> = tally_by(grades, |g| g.grade.student_id.as_str())
        .into_iter()
        .map(|t| StudentPerformance {
            student: ProfileSummary {
                id: t.first.grade.student_id.clone(),
                full_name: t.first.student_name.clone(),
                email: t.first.student_email.clone(),
            },
            average: t.average(),
            grade_count: t.count,
            highest: round2(t.highest),
            lowest: round2(t.lowest),
        })
        .collect();
    ranked.sort_by(|a, b| by_average_desc(a.average, b.average));
    ranked.truncate(limit);
    ranked
}

/// Courses ranked by mean percentage, best first.
pub fn course_performance(grades: &[GradeView]) -> Vec<CoursePerformance> {
    let mut ranked: Vec<CoursePerformance> = tally_by(grades, |g| g.grade.course_id.as_str())
        .into_iter()
        .map(|t| CoursePerformance {
            course_id: t.first.grade.course_id.clone(),
            code: t.first.course_code.clone(),
            name: t.first.course_name.clone(),
            average: t.average(),
            grade_count: t.count,
            highest: round2(t.highest),
            lowest: round2(t.lowest),
        })
        .collect();
    ranked.sort_by(|a, b| by_average_desc(a.average, b.average));
    ranked
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherPerformance {
    pub teacher_id: String,
    pub teacher: Option<ProfileSummary>,
    pub course_count: usize,
    pub enrollment_count: usize,
    pub average_grade: f64,
    pub total_grades: usize,
}

/// Per-teacher course load and grade average, busiest teacher first.
/// Courses without an assigned teacher are left out.
pub fn teacher_performance(
    courses: &[CourseWithTeacher],
    enrollments: &[Enrollment],
    grades: &[Grade],
) -> Vec<TeacherPerformance> {
    let mut order: Vec<&str> = Vec::new();
    let mut per_teacher: HashMap<&str, (Option<&ProfileSummary>, usize, usize, Vec<&Grade>)> =
        HashMap::new();

    for entry in courses {
        let Some(teacher_id) = entry.course.teacher_id.as_deref() else {
            continue;
        };
        let slot = per_teacher.entry(teacher_id).or_insert_with(|| {
            order.push(teacher_id);
            (entry.teacher.as_ref(), 0, 0, Vec::new())
        });
        slot.1 += 1;
        slot.2 += enrollments
            .iter()
            .filter(|e| e.course_id == entry.course.id)
            .count();
        slot.3
            .extend(grades.iter().filter(|g| g.course_id == entry.course.id));
    }

    let mut ranked: Vec<TeacherPerformance> = order
        .into_iter()
        .filter_map(|id| per_teacher.remove(id).map(|stats| (id, stats)))
        .map(|(id, (teacher, course_count, enrollment_count, grades))| TeacherPerformance {
            teacher_id: id.to_string(),
            teacher: teacher.cloned(),
            course_count,
            enrollment_count,
            average_grade: round2(average_percentage(grades.iter().copied())),
            total_grades: grades.len(),
        })
        .collect();
    ranked.sort_by(|a, b| b.enrollment_count.cmp(&a.enrollment_count));
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

/// Enrollments per `YYYY-MM` over the last `months` months before `now`, oldest first.
pub fn enrollment_trends(enrollments: &[Enrollment], months: u32, now: DateTime<Utc>) -> Vec<MonthlyCount> {
    let since = now
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for enrollment in enrollments {
        let Some(at) = parse_timestamp(&enrollment.enrolled_at) else {
            continue;
        };
        if at < since {
            continue;
        }
        *counts
            .entry(format!("{}-{:02}", at.year(), at.month()))
            .or_default() += 1;
    }
    let mut trend: Vec<MonthlyCount> = counts
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect();
    trend.sort_by(|a, b| a.month.cmp(&b.month));
    trend
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Grade,
    Enrollment,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub timestamp: String,
    pub description: String,
}

fn display_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Merges recent grades, enrollments and events into one feed, newest first.
pub fn recent_activity(
    grades: &[GradeView],
    enrollments: &[EnrollmentView],
    events: &[EventView],
    limit: usize,
) -> Vec<Activity> {
    let mut feed: Vec<Activity> = Vec::with_capacity(grades.len() + enrollments.len() + events.len());

    feed.extend(grades.iter().map(|g| Activity {
        kind: ActivityKind::Grade,
        timestamp: g.grade.created_at.clone(),
        description: format!(
            "{} received {}/{} on {} in {}",
            g.student_name.as_deref().unwrap_or(&g.student_email),
            display_score(g.grade.score),
            display_score(g.grade.max_score),
            g.grade.assignment_name.as_deref().unwrap_or("an assignment"),
            g.course_code,
        ),
    }));

    feed.extend(enrollments.iter().map(|e| Activity {
        kind: ActivityKind::Enrollment,
        timestamp: e.enrolled_at.clone(),
        description: format!(
            "{} enrolled in {} - {}",
            e.student_name.as_deref().unwrap_or(&e.student_email),
            e.course_code,
            e.course_name,
        ),
    }));

    feed.extend(events.iter().map(|e| Activity {
        kind: ActivityKind::Event,
        timestamp: e.event.created_at.clone(),
        description: match &e.course_code {
            Some(code) => format!(
                "{}: {} ({})",
                e.event.event_type.as_deref().unwrap_or("event"),
                e.event.title,
                code
            ),
            None => format!(
                "{}: {}",
                e.event.event_type.as_deref().unwrap_or("event"),
                e.event.title
            ),
        },
    }));

    feed.sort_by(|a, b| parse_timestamp(&b.timestamp).cmp(&parse_timestamp(&a.timestamp)));
    feed.truncate(limit);
    feed
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Event};
    use crate::stats::fixtures::grade;
    use chrono::TimeZone;

    fn view(student: &str, course: &str, score: f64) -> GradeView {
        GradeView {
            grade: grade(student, course, score, 100.0),
            course_code: course.to_uppercase(),
            course_name: course.to_string(),
            course_credits: 3,
            student_name: Some(student.to_string()),
            student_email: format!("{}@example.com", student),
        }
    }

    fn enrollment(course: &str, at: &str) -> Enrollment {
        Enrollment {
            id: format!("{}-{}", course, at),
            student_id: "s".to_string(),
            course_id: course.to_string(),
            enrolled_at: at.to_string(),
        }
    }

    fn course(id: &str, teacher: Option<&str>) -> CourseWithTeacher {
        CourseWithTeacher {
            course: Course {
                id: id.to_string(),
                code: id.to_uppercase(),
                name: id.to_string(),
                description: None,
                teacher_id: teacher.map(str::to_string),
                semester: None,
                credits: 3,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
            teacher: teacher.map(|t| ProfileSummary {
                id: t.to_string(),
                full_name: Some(t.to_uppercase()),
                email: format!("{}@example.com", t),
            }),
        }
    }

    #[test]
    fn distribution_has_five_buckets() {
        let grades = vec![
            grade("a", "c", 95.0, 100.0),
            grade("a", "c", 90.0, 100.0),
            grade("a", "c", 8.5, 10.0),
            grade("a", "c", 61.0, 100.0),
            grade("a", "c", 10.0, 100.0),
        ];
        let buckets = grade_distribution(&grades);
        let counts: Vec<_> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 1, 1]);
        assert_eq!(buckets[4].grade, "F (0-59%)");
        assert!(grade_distribution(&[]).iter().all(|b| b.count == 0));
    }

    #[test]
    fn top_students_ranks_and_limits() {
        let grades = vec![
            view("ana", "m", 80.0),
            view("ben", "m", 95.0),
            view("ana", "p", 60.0),
            view("cleo", "m", 50.0),
        ];
        let top = top_students(&grades, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].student.id, "ben");
        assert_eq!(top[1].student.id, "ana");
        assert_eq!(top[1].average, 70.0);
        assert_eq!(top[1].highest, 80.0);
        assert_eq!(top[1].lowest, 60.0);
        assert_eq!(top[1].grade_count, 2);
    }

    #[test]
    fn course_performance_sorted_by_average() {
        let grades = vec![view("a", "low", 40.0), view("b", "high", 90.0), view("c", "low", 60.0)];
        let perf = course_performance(&grades);
        assert_eq!(perf[0].code, "HIGH");
        assert_eq!(perf[1].code, "LOW");
        assert_eq!(perf[1].average, 50.0);
        assert_eq!(perf[1].grade_count, 2);
    }

    #[test]
    fn teacher_performance_groups_courses() {
        let courses = vec![course("c1", Some("t1")), course("c2", Some("t2")), course("c3", Some("t2")), course("c4", None)];
        let enrollments = vec![
            enrollment("c1", "2026-01-01T00:00:00Z"),
            enrollment("c2", "2026-01-01T00:00:00Z"),
            enrollment("c3", "2026-01-01T00:00:00Z"),
            enrollment("c3", "2026-01-02T00:00:00Z"),
            enrollment("c4", "2026-01-02T00:00:00Z"),
        ];
        let grades = vec![grade("s", "c2", 80.0, 100.0), grade("s", "c3", 60.0, 100.0)];
        let perf = teacher_performance(&courses, &enrollments, &grades);
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].teacher_id, "t2");
        assert_eq!(perf[0].course_count, 2);
        assert_eq!(perf[0].enrollment_count, 3);
        assert_eq!(perf[0].average_grade, 70.0);
        assert_eq!(perf[0].total_grades, 2);
        assert_eq!(perf[1].teacher_id, "t1");
        assert_eq!(perf[1].average_grade, 0.0);
    }

    #[test]
    fn trends_group_by_month_within_window() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let enrollments = vec![
            enrollment("c", "2025-11-30T00:00:00Z"),
            enrollment("c", "2026-01-10T00:00:00Z"),
            enrollment("c", "2026-03-02T08:00:00Z"),
            enrollment("c", "2026-03-20T08:00:00Z"),
            enrollment("c", "2026-06-01T08:00:00Z"),
        ];
        let trend = enrollment_trends(&enrollments, 6, now);
        assert_eq!(
            trend,
            vec![
                MonthlyCount { month: "2026-01".to_string(), count: 1 },
                MonthlyCount { month: "2026-03".to_string(), count: 2 },
                MonthlyCount { month: "2026-06".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn trends_with_oversized_window_cover_everything() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let enrollments = vec![
            enrollment("c", "1999-02-01T00:00:00Z"),
            enrollment("c", "2026-06-01T08:00:00Z"),
        ];
        let trend = enrollment_trends(&enrollments, u32::MAX, now);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].month, "1999-02");
    }

    #[test]
    fn activity_feed_is_newest_first() {
        let mut g = view("ana", "m101", 18.0);
        g.grade.max_score = 20.0;
        g.grade.assignment_name = Some("Quiz 1".to_string());
        g.grade.created_at = "2026-03-01T10:00:00Z".to_string();

        let enrollment = EnrollmentView {
            id: "e".to_string(),
            student_id: "ben".to_string(),
            course_id: "m101".to_string(),
            enrolled_at: "2026-03-02T10:00:00Z".to_string(),
            student_name: Some("Ben".to_string()),
            student_email: "ben@example.com".to_string(),
            course_code: "M101".to_string(),
            course_name: "Algebra".to_string(),
            course_semester: None,
            course_credits: 3,
            teacher_id: None,
            teacher_name: None,
            teacher_email: None,
        };

        let event = EventView {
            event: Event {
                id: "ev".to_string(),
                title: "Midterm".to_string(),
                description: None,
                event_type: Some("exam".to_string()),
                location: None,
                course_id: Some("m101".to_string()),
                start_time: "2026-04-01T09:00:00Z".to_string(),
                end_time: None,
                created_by: "t".to_string(),
                created_at: "2026-02-28T10:00:00Z".to_string(),
            },
            course_code: Some("M101".to_string()),
            course_name: Some("Algebra".to_string()),
        };

        let feed = recent_activity(&[g], &[enrollment], &[event], 2);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, ActivityKind::Enrollment);
        assert_eq!(feed[0].description, "Ben enrolled in M101 - Algebra");
        assert_eq!(feed[1].kind, ActivityKind::Grade);
        assert_eq!(feed[1].description, "ana received 18/20 on Quiz 1 in M101");
    }
}
