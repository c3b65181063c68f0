//! Client side of the daily comic: a refresh scheduler that notices the day
//! rolling over and swaps in the new comic, plus the sources it can pull
//! comics from.

pub mod clock;
pub mod scheduler;
pub mod source;

pub use clock::{header_info, system_clock, Clock, HeaderInfo};
pub use scheduler::{
    ComicState, FetchTicket, RefreshScheduler, SchedulerMachine, SchedulerSnapshot,
};
pub use source::{ComicSource, HttpComicSource, LocalPipelineSource, SourceError};
