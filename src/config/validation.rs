use super::{ConfigError, TransportConfig};
use crate::domain::STANDARD_FIELDS;
use url::Url;

impl TransportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // An absent URL is reported per record at delivery time
        if let Some(url) = self.url.as_deref()
            && !url.is_empty()
        {
            let parsed = Url::parse(url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid API url '{url}': {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl(format!(
                    "Unsupported scheme '{}' in API url '{url}'",
                    parsed.scheme()
                )));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        // Standard names have dedicated record attributes; a static value
        // under one would never be delivered
        if let Some(key) = self
            .static_values
            .keys()
            .find(|key| STANDARD_FIELDS.contains(key))
        {
            return Err(ConfigError::InvalidConfig(format!(
                "Static value '{key}' collides with a standard record field"
            )));
        }

        Ok(())
    }
}
