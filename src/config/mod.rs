#[allow(clippy::module_inception)]
mod config;

pub use config::{
    ErrorPolicy, PostgresSettings, SchedulerSettings, Settings, SourceSettings, SslMode,
};
