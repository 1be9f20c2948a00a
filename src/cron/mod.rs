pub mod jobs;
pub mod scheduler;

pub use jobs::poll_gas_price::PollContext;
pub use scheduler::CronScheduler;
