use std::sync::Arc;

use crate::config::Config;
use crate::db::connection::DbPool;
use crate::repositories::{
    AbsenceRepository, AbsenceRepositoryTrait, AttendanceRepository, AttendanceRepositoryTrait,
    ExternalWorkRepository, ExternalWorkRepositoryTrait, HolidayRepository,
    HolidayRepositoryTrait, OvertimeQuotaRepository, OvertimeQuotaRepositoryTrait,
    UserRepository, UserRepositoryTrait,
};
use crate::services::{
    AbsenceService, AttendanceService, CalendarService, DayGrouper, MonthOvertimeCalculator,
    OvertimeLedgerService,
};
use crate::utils::time::{Clock, SystemClock};

/// Collaborators every service draws from.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub attendance: Arc<dyn AttendanceRepositoryTrait>,
    pub holidays: Arc<dyn HolidayRepositoryTrait>,
    pub absences: Arc<dyn AbsenceRepositoryTrait>,
    pub external_works: Arc<dyn ExternalWorkRepositoryTrait>,
    pub quotas: Arc<dyn OvertimeQuotaRepositoryTrait>,
}

impl Repositories {
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            attendance: Arc::new(AttendanceRepository::new(pool.clone())),
            holidays: Arc::new(HolidayRepository::new(pool.clone())),
            absences: Arc::new(AbsenceRepository::new(pool.clone())),
            external_works: Arc::new(ExternalWorkRepository::new(pool.clone())),
            quotas: Arc::new(OvertimeQuotaRepository::new(pool)),
        }
    }

    /// Uses one store for every collaborator.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: UserRepositoryTrait
            + AttendanceRepositoryTrait
            + HolidayRepositoryTrait
            + AbsenceRepositoryTrait
            + ExternalWorkRepositoryTrait
            + OvertimeQuotaRepositoryTrait
            + 'static,
    {
        Self {
            users: store.clone(),
            attendance: store.clone(),
            holidays: store.clone(),
            absences: store.clone(),
            external_works: store.clone(),
            quotas: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub attendance: AttendanceService,
    pub absences: AbsenceService,
    pub calculator: MonthOvertimeCalculator,
    pub ledger: OvertimeLedgerService,
}

impl AppState {
    pub fn new(config: Config, repositories: Repositories, clock: Arc<dyn Clock>) -> Self {
        let calendar = CalendarService::new(repositories.holidays.clone());
        let grouper = DayGrouper::new(
            repositories.attendance.clone(),
            calendar.clone(),
            config.work_week_policy(),
            clock.clone(),
        );
        let calculator = MonthOvertimeCalculator::new(grouper);

        let attendance = AttendanceService::new(
            repositories.attendance.clone(),
            repositories.absences.clone(),
            repositories.external_works.clone(),
            repositories.users.clone(),
            calendar.clone(),
            clock.clone(),
        )
        .with_correction_reason_min_length(config.correction_reason_min_length);
        let absences = AbsenceService::new(repositories.absences.clone(), calendar);
        let ledger = OvertimeLedgerService::new(
            calculator.clone(),
            repositories.users,
            repositories.attendance,
            repositories.external_works,
            repositories.absences,
            repositories.quotas,
        );

        Self {
            config,
            clock,
            attendance,
            absences,
            calculator,
            ledger,
        }
    }

    /// State backed by Postgres and the wall clock in the configured zone.
    pub fn from_pool(config: Config, pool: DbPool) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.time_zone));
        Self::new(config, Repositories::postgres(pool), clock)
    }
}
