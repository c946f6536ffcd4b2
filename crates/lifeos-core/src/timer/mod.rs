mod clock;
mod controller;
mod engine;
mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{TimerController, TIMER_KEY};
pub use engine::{FocusMode, FocusTimer, TimerState};
pub use ticker::{CancelFlag, Ticker, TickerExit};
