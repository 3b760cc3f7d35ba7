pub mod cli;
pub mod engine;
pub mod metrics;
pub mod report;
pub mod target;

pub use engine::controller::{Controller, ResultSet, RunSummary};
pub use engine::progress::{ConsoleProgress, Progress};
pub use engine::run_load;
pub use engine::sender::{HttpSender, RequestOutcome, RequestSender, SendError};
pub use report::Report;
pub use target::{Target, TargetError};
