pub mod absence;
pub mod attendance;
pub mod calendar;
pub mod day_grouper;
pub mod month_overtime;
pub mod overtime_ledger;
pub mod working_hours;

pub use absence::{count_workdays, AbsenceService};
pub use attendance::AttendanceService;
pub use calendar::{CalendarService, HolidayCalendar, WorkWeekPolicy};
pub use day_grouper::{group_intervals, DayAggregate, DayGrouper};
pub use month_overtime::{MonthOvertimeCalculator, MonthOvertimeResult};
pub use overtime_ledger::{OvertimeLedgerService, SweepReport};
pub use working_hours::{calculate_working_hours, WorkingHours};
