use crate::logging::LogSettings;
use crate::scheduler::SchedulerConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LogSettings,
    pub history_limit: usize,
    pub scheduler: SchedulerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let logging = LogSettings::from_env();
        let scheduler = SchedulerConfig::from_env();

        let history_limit = std::env::var("RECALL_HISTORY_LIMIT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(scheduler.features.history_window);

        Self {
            logging,
            history_limit,
            scheduler,
        }
    }
}
