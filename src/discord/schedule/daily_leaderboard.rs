// Background task that posts the daily leaderboard card into every guild.

use crate::core::leveling::XpService;
use crate::core::schedule::{run_daily, DailySchedule};
use crate::discord::gateway::SerenityGateway;
use crate::infra::leveling::JsonLedgerStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub fn spawn(
    gateway: SerenityGateway,
    xp: Arc<XpService<JsonLedgerStore>>,
    schedule: DailySchedule,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let footer = schedule.footer_label();
    tokio::spawn(async move {
        run_daily(schedule, shutdown, || {
            let gateway = gateway.clone();
            let xp = Arc::clone(&xp);
            let footer = footer.clone();
            async move {
                tracing::info!("Daily leaderboard starting");
                let posted = xp.announce_daily_leaderboards(&gateway, &footer).await;
                tracing::info!(guilds = posted, "Daily leaderboard completed");
            }
        })
        .await;
    })
}
