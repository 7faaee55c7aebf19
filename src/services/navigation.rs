use serde::Serialize;

use crate::models::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub name: &'static str,
    pub href: &'static str,
}

const STUDENT: &[UserRole] = &[UserRole::Student];
const TEACHER: &[UserRole] = &[UserRole::Teacher];
const PROFESSOR: &[UserRole] = &[UserRole::TenuredProfessor];
const EVERYONE: &[UserRole] = &[UserRole::Student, UserRole::Teacher, UserRole::TenuredProfessor];

const NAVIGATION: &[(&str, &str, &[UserRole])] = &[
    ("Dashboard", "/dashboard", EVERYONE),
    ("My Classes", "/dashboard/classes", STUDENT),
    ("My Grades", "/dashboard/grades", STUDENT),
    ("Teachers", "/dashboard/teachers", STUDENT),
    ("My Courses", "/dashboard/courses", TEACHER),
    ("Students", "/dashboard/students", TEACHER),
    ("Grade Entry", "/dashboard/grade-entry", TEACHER),
    ("All Classes", "/dashboard/all-classes", PROFESSOR),
    ("All Grades", "/dashboard/all-grades", PROFESSOR),
    ("Analytics", "/dashboard/analytics", PROFESSOR),
    ("Calendar", "/dashboard/calendar", EVERYONE),
    ("Profile", "/dashboard/profile", EVERYONE),
];

/// Dashboard entries visible to `role`, in display order.
pub fn entries_for(role: UserRole) -> Vec<NavEntry> {
    NAVIGATION
        .iter()
        .filter(|(_, _, roles)| roles.contains(&role))
        .map(|&(name, href, _)| NavEntry { name, href })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(role: UserRole) -> Vec<&'static str> {
        entries_for(role).into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn each_role_gets_its_own_menu() {
        assert_eq!(
            names(UserRole::Student),
            vec!["Dashboard", "My Classes", "My Grades", "Teachers", "Calendar", "Profile"]
        );
        assert!(names(UserRole::Teacher).contains(&"Grade Entry"));
        assert!(!names(UserRole::Teacher).contains(&"Analytics"));
        assert!(names(UserRole::TenuredProfessor).contains(&"Analytics"));
        assert!(!names(UserRole::TenuredProfessor).contains(&"My Grades"));
    }
}
