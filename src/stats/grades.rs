use serde::Serialize;

use super::{grade_point, mean, round2};
use crate::models::{Grade, GradeView};

const RECENT_GRADES: usize = 5;

/// Mean percentage over the grades, zero when there are none.
pub fn average_percentage<'a, I>(grades: I) -> f64
where
    I: IntoIterator<Item = &'a Grade>,
{
    mean(grades.into_iter().map(Grade::percentage))
}

/// Mean 4.0-scale grade point over the grades, zero when there are none.
pub fn gpa<'a, I>(grades: I) -> f64
where
    I: IntoIterator<Item = &'a Grade>,
{
    mean(grades.into_iter().map(|g| grade_point(g.percentage())))
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseAverage {
    pub course_id: String,
    pub code: String,
    pub name: String,
    pub credits: i32,
    pub average: f64,
    pub grade_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentGradeStats {
    pub total_grades: usize,
    pub average_score: f64,
    pub gpa: f64,
    pub course_averages: Vec<CourseAverage>,
    pub recent_grades: Vec<GradeView>,
}

/// Statistics for one student's grades.
///
/// `grades` is expected newest first; `recent_grades` keeps the head of it and
/// `course_averages` follows the order in which courses first appear.
pub fn student_grade_stats(grades: &[GradeView]) -> StudentGradeStats {
    let average_score = average_percentage(grades.iter().map(|g| &g.grade));
    let gpa = gpa(grades.iter().map(|g| &g.grade));

    let mut buckets: Vec<(&GradeView, f64, usize)> = Vec::new();
    for view in grades {
        match buckets
            .iter_mut()
            .find(|(first, _, _)| first.grade.course_id == view.grade.course_id)
        {
            Some((_, total, count)) => {
                *total += view.grade.percentage();
                *count += 1;
            }
            None => buckets.push((view, view.grade.percentage(), 1)),
        }
    }

    let course_averages = buckets
        .into_iter()
        .map(|(first, total, count)| CourseAverage {
            course_id: first.grade.course_id.clone(),
            code: first.course_code.clone(),
            name: first.course_name.clone(),
            credits: first.course_credits,
            average: round2(total / count as f64),
            grade_count: count,
        })
        .collect();

    StudentGradeStats {
        total_grades: grades.len(),
        average_score: round2(average_score),
        gpa: round2(gpa),
        course_averages,
        recent_grades: grades.iter().take(RECENT_GRADES).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::grade;

    fn view(course: &str, score: f64, max_score: f64) -> GradeView {
        GradeView {
            grade: grade("amani", course, score, max_score),
            course_code: course.to_uppercase(),
            course_name: format!("{} course", course),
            course_credits: 3,
            student_name: Some("Amani".to_string()),
            student_email: "amani@example.com".to_string(),
        }
    }

    #[test]
    fn empty_list_yields_zero_not_nan() {
        let empty: Vec<Grade> = Vec::new();
        assert_eq!(average_percentage(&empty), 0.0);
        assert_eq!(gpa(&empty), 0.0);

        let stats = student_grade_stats(&[]);
        assert_eq!(stats.total_grades, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.gpa, 0.0);
        assert!(stats.course_averages.is_empty());
    }

    #[test]
    fn perfect_scores_give_top_gpa() {
        let grades = vec![
            grade("s", "c", 100.0, 100.0),
            grade("s", "c", 100.0, 100.0),
            grade("s", "d", 100.0, 100.0),
        ];
        assert_eq!(average_percentage(&grades), 100.0);
        assert_eq!(gpa(&grades), 4.0);
    }

    #[test]
    fn percentages_use_max_score() {
        let grades = vec![grade("s", "c", 18.0, 20.0), grade("s", "c", 35.0, 50.0)];
        // 90% and 70%
        assert!((average_percentage(&grades) - 80.0).abs() < 1e-9);
        assert_eq!(gpa(&grades), 3.0);
    }

    #[test]
    fn groups_by_course_in_first_seen_order() {
        let grades = vec![
            view("math", 90.0, 100.0),
            view("chem", 40.0, 50.0),
            view("math", 70.0, 100.0),
            view("chem", 30.0, 50.0),
            view("math", 50.0, 100.0),
            view("bio", 10.0, 10.0),
        ];
        let stats = student_grade_stats(&grades);
        assert_eq!(stats.total_grades, 6);
        assert_eq!(stats.recent_grades.len(), 5);

        let codes: Vec<_> = stats.course_averages.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["MATH", "CHEM", "BIO"]);
        assert_eq!(stats.course_averages[0].average, 70.0);
        assert_eq!(stats.course_averages[0].grade_count, 3);
        assert_eq!(stats.course_averages[1].average, 70.0);
        assert_eq!(stats.course_averages[2].average, 100.0);
        // (90 + 80 + 70 + 60 + 50 + 100) / 6
        assert_eq!(stats.average_score, 75.0);
        // (4 + 3 + 2 + 1 + 0 + 4) / 6
        assert_eq!(stats.gpa, 2.33);
    }
}
