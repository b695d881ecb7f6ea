pub mod bot_poll;
pub mod diff;
pub mod fetch;
pub mod run;

use anyhow::Context;
use daadwatch_engine::WatchConfig;

/// Final check once CLI overrides are applied
pub(crate) fn validated(config: WatchConfig) -> anyhow::Result<WatchConfig> {
    config.validate().context("invalid configuration")?;
    Ok(config)
}
