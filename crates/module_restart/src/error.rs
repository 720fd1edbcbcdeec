use region_event_system::RegionId;

/// Errors surfaced by the restart scheduler API.
///
/// Countdown failures never surface here: notification and marker problems
/// are logged inside the scheduler and the restart still goes ahead.
#[derive(Debug, thiserror::Error)]
pub enum RestartError {
    #[error("Region {0} is not served by the restart module")]
    RegionNotFound(RegionId),
    #[error("Restart scheduler for region {0} has stopped")]
    SchedulerStopped(RegionId),
}
