use crate::error::ModelResult;
use std::collections::BTreeSet;
use switchboard_api::GatewayApi;
use tracing::debug;

/// Outputs report a "no timer" sentinel as zero instead of [`crate::ZERO_TIMER`].
pub const DEFAULT_TIMER_DISABLED: &str = "default_timer_disabled";

/// Feature flags reported by the gateway firmware.
///
/// Fetched once at startup and handed to the entities whose decoding depends
/// on them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayFeatures {
    flags: BTreeSet<String>,
}

impl GatewayFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the feature flags from the gateway.
    pub async fn load(api: &dyn GatewayApi) -> ModelResult<Self> {
        let features: Self = api.get_features().await?.into_iter().collect();
        debug!(count = features.flags.len(), "gateway features loaded");
        Ok(features)
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.flags.contains(feature)
    }

    pub fn insert(&mut self, feature: impl Into<String>) {
        self.flags.insert(feature.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for GatewayFeatures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(Into::into).collect(),
        }
    }
}
