pub mod attendance;
pub mod course;
pub mod exam_result;
pub mod leave;
pub mod organization;
pub mod staff;
pub mod student;
pub mod user;
