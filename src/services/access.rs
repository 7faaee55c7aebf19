use crate::error::AppError;
use crate::models::{Course, Profile, UserRole};

/// The authenticated caller, resolved from the gateway-supplied user id.
#[derive(Debug, Clone)]
pub struct Actor {
    pub profile: Profile,
}

impl Actor {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn role(&self) -> UserRole {
        self.profile.role
    }

    pub fn require_professor(&self) -> Result<(), AppError> {
        if self.role().is_professor() {
            Ok(())
        } else {
            Err(AppError::Forbidden("tenured professors only".to_string()))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.role().is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden("teachers and professors only".to_string()))
        }
    }

    /// Students may only look at their own records.
    pub fn require_self_or_staff(&self, profile_id: &str) -> Result<(), AppError> {
        if self.id() == profile_id || self.role().is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden("not your record".to_string()))
        }
    }

    pub fn require_self_or_professor(&self, profile_id: &str) -> Result<(), AppError> {
        if self.id() == profile_id || self.role().is_professor() {
            Ok(())
        } else {
            Err(AppError::Forbidden("not your profile".to_string()))
        }
    }

    /// The course's own teacher, or any professor.
    pub fn require_course_owner(&self, course: &Course) -> Result<(), AppError> {
        if self.role().is_professor() || course.teacher_id.as_deref() == Some(self.id()) {
            Ok(())
        } else {
            Err(AppError::Forbidden("not your course".to_string()))
        }
    }

    /// Teachers are scoped to their own courses and students; professors see everything.
    pub fn teacher_scope(&self) -> Option<&str> {
        match self.role() {
            UserRole::Teacher => Some(self.id()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str, role: UserRole) -> Actor {
        Actor::new(Profile {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            role,
            full_name: None,
            phone: None,
            home_address: None,
            home_latitude: None,
            home_longitude: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        })
    }

    fn course_taught_by(teacher: Option<&str>) -> Course {
        Course {
            id: "c1".to_string(),
            code: "MATH101".to_string(),
            name: "Calculus".to_string(),
            description: None,
            teacher_id: teacher.map(str::to_string),
            semester: None,
            credits: 3,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn role_gates() {
        let student = actor("s1", UserRole::Student);
        let teacher = actor("t1", UserRole::Teacher);
        let professor = actor("p1", UserRole::TenuredProfessor);

        assert!(student.require_staff().is_err());
        assert!(teacher.require_staff().is_ok());
        assert!(teacher.require_professor().is_err());
        assert!(professor.require_professor().is_ok());
    }

    #[test]
    fn students_only_reach_their_own_records() {
        let student = actor("s1", UserRole::Student);
        assert!(student.require_self_or_staff("s1").is_ok());
        assert!(matches!(
            student.require_self_or_staff("s2"),
            Err(AppError::Forbidden(_))
        ));
        assert!(actor("t1", UserRole::Teacher).require_self_or_staff("s2").is_ok());
        assert!(actor("t1", UserRole::Teacher).require_self_or_professor("s2").is_err());
    }

    #[test]
    fn course_ownership() {
        let course = course_taught_by(Some("t1"));
        assert!(actor("t1", UserRole::Teacher).require_course_owner(&course).is_ok());
        assert!(actor("t2", UserRole::Teacher).require_course_owner(&course).is_err());
        assert!(actor("p1", UserRole::TenuredProfessor)
            .require_course_owner(&course_taught_by(None))
            .is_ok());
    }

    #[test]
    fn teacher_scope_only_for_teachers() {
        assert_eq!(actor("t1", UserRole::Teacher).teacher_scope(), Some("t1"));
        assert_eq!(actor("p1", UserRole::TenuredProfessor).teacher_scope(), None);
    }
}
