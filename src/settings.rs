use config::{Config, Environment, File};
use serde::Deserialize;

use crate::binder::DEFAULT_XML_VERSION;
use crate::error::Result;

/// Runtime settings, read from an optional file and `PATHTEMPLATE_*`
/// environment variables on top of the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub xml_version: u32,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            xml_version: DEFAULT_XML_VERSION,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load(file: Option<&str>) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("xml_version", i64::from(defaults.xml_version))?
            .set_default("log_filter", defaults.log_filter)?;
        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix("PATHTEMPLATE"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
