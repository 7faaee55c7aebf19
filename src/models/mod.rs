pub mod course;
pub mod enrollment;
pub mod event;
pub mod grade;
pub mod library;
pub mod profile;

pub use course::{
    AssignTeacherRequest, Course, CourseDetail, CourseWithTeacher, NewCourseRequest,
    UpdateCourseRequest, DEFAULT_CREDITS,
};
pub use enrollment::{
    BulkEnrollRequest, EnrolledStudent, Enrollment, EnrollmentView, NewEnrollmentRequest,
};
pub use event::{Event, EventView, NewEventRequest, UpdateEventRequest};
pub use grade::{Grade, GradeView, NewGradeRequest, UpdateGradeRequest, validate_score};
pub use library::{Book, BookView, Library, NewBookRequest, NewLibraryRequest};
pub use profile::{
    NewProfileRequest, Profile, ProfileSummary, UpdateProfileRequest, UpdateRoleRequest, UserRole,
};
