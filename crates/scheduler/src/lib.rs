pub mod clock;
pub mod next_run;
pub mod window;

pub use clock::WeekClock;
pub use next_run::{format_countdown, next_window_run};
pub use window::{ScheduleError, ScheduleWindow, WeekTime, within_window};
