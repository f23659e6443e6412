pub mod absence;
pub mod attendance;
pub mod external_work;
pub mod holiday;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod overtime_quota;
pub mod transaction;
pub mod user;

pub use absence::{AbsenceRepository, AbsenceRepositoryTrait};
pub use attendance::{AttendanceRepository, AttendanceRepositoryTrait};
pub use external_work::{ExternalWorkRepository, ExternalWorkRepositoryTrait};
pub use holiday::{HolidayRepository, HolidayRepositoryTrait};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::InMemoryStore;
pub use overtime_quota::{OvertimeQuotaRepository, OvertimeQuotaRepositoryTrait};
pub use user::{UserRepository, UserRepositoryTrait};

#[cfg(test)]
pub use absence::MockAbsenceRepositoryTrait;
#[cfg(test)]
pub use attendance::MockAttendanceRepositoryTrait;
#[cfg(test)]
pub use external_work::MockExternalWorkRepositoryTrait;
#[cfg(test)]
pub use holiday::MockHolidayRepositoryTrait;
#[cfg(test)]
pub use overtime_quota::MockOvertimeQuotaRepositoryTrait;
#[cfg(test)]
pub use user::MockUserRepositoryTrait;
