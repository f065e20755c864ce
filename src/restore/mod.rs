pub(crate) mod dispatch;
mod logic;
pub(crate) mod pricing;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::storage::ObjectStore;
use crate::utils::Console;
use crate::utils::prompt::TierPrompt;

pub use logic::RunReport;

/// Public entry point for a restore or status run.
pub async fn run_restore_flow(
    store: &dyn ObjectStore,
    config: &RunConfig,
    prompt: &mut dyn TierPrompt,
    console: &Console,
) -> Result<RunReport> {
    logic::perform_restore_orchestration(store, config, prompt, console).await
}
