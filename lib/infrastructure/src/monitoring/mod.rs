use std::error::Error;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MonitoringConfig {
    pub logs: EnvFilterConfig,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnvFilterConfig {
    pub default_level: String,
    pub filters: Vec<String>,
}

impl TryInto<EnvFilter> for EnvFilterConfig {
    type Error = tracing_subscriber::filter::ParseError;

    fn try_into(self) -> Result<EnvFilter, Self::Error> {
        EnvFilter::builder()
            .with_default_directive(self.default_level.parse()?)
            .parse(self.filters.join(","))
    }
}

impl MonitoringConfig {
    pub fn init(&self) -> Result<(), Box<dyn Error>> {
        let filter: EnvFilter = self.logs.clone().try_into()?;

        if self.json.unwrap_or(false) {
            let fmt_layer = tracing_subscriber::fmt::layer().json();
            tracing_subscriber::registry().with(fmt_layer).with(filter).init();
        } else {
            let fmt_layer = tracing_subscriber::fmt::layer();
            tracing_subscriber::registry().with(fmt_layer).with(filter).init();
        }

        Ok(())
    }
}
