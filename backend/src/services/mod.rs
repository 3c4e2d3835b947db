pub mod errors;
pub mod schedule;
pub mod time_tracking;

pub use errors::SessionError;
pub use schedule::{ScheduleService, SweepReport};
pub use time_tracking::TimeService;
