//! Group id to request URL mapping

use url::Url;

use super::config::ClientConfig;
use crate::constants::celestrak;
use crate::errors::ConfigResult;

/// The provider's GP query endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    base: Url,
}

impl ProviderEndpoint {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn from_config(config: &ClientConfig) -> ConfigResult<Self> {
        Ok(Self::new(config.parsed_base_url()?))
    }

    /// `{base}?GROUP={group_id}&FORMAT=json`
    pub fn url_for(&self, group_id: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair(celestrak::GROUP_PARAM, group_id)
            .append_pair(celestrak::FORMAT_PARAM, celestrak::FORMAT_JSON);
        url
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl Default for ProviderEndpoint {
    fn default() -> Self {
        Self::new(Url::parse(celestrak::BASE_URL).expect("Base URL should be valid"))
    }
}
