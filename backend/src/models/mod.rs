pub mod absence;
pub mod attendance;
pub mod external_work;
pub mod holiday;
pub mod overtime;
pub mod user;
