use chrono::Local;
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::{
    signal,
    time::{self, MissedTickBehavior},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use trip_buddy::{
    config::{database, preferences, trip},
    core::{SyncOutcome, TripState, report},
    errors::Result,
    store::RemoteStore,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load the trip configuration
    let config = Arc::new(
        trip::load_default_config()
            .inspect_err(|e| error!("Failed to load trip configuration: {e}"))?,
    );

    // 4. Connect to the remote store, a failed connection means running offline
    let db = match database::create_connection().await {
        Ok(db) => {
            info!("Connected to remote store");
            if let Err(e) = database::create_tables(&db).await {
                warn!("Could not prepare tables, continuing anyway: {e}");
            }
            db
        }
        Err(e) => {
            warn!("Failed to connect to remote store: {e}");
            DatabaseConnection::Disconnected
        }
    };
    let remote = RemoteStore::with_capacity(db, config.sync.feed_capacity);

    // 5. Load or seed the trip
    let mut state = TripState::new(remote, Arc::clone(&config));
    match state.init_sync().await {
        SyncOutcome::Online {
            trip_id,
            seeded_members,
            seeded_categories,
        } => info!(%trip_id, seeded_members, seeded_categories, "Trip synced"),
        SyncOutcome::Offline => warn!("Running offline, changes will not be saved"),
    }

    // 6. Restore UI preferences
    let preferences_path = preferences::preferences_path();
    let mut ui = preferences::load_preferences(&preferences_path).unwrap_or_else(|e| {
        warn!("Ignoring unreadable preferences: {e}");
        preferences::UiPreferences::default()
    });
    ui.has_loaded = true;

    println!("{}", report::render_dashboard(&state, &ui, Local::now().date_naive()));

    // 7. Follow remote changes until Ctrl-C
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);
    let polling = config.sync.poll_interval_secs > 0;
    let mut poll = time::interval(Duration::from_secs(config.sync.poll_interval_secs.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and the trip was just loaded
    poll.tick().await;
    loop {
        let subscribed = state.is_subscribed();
        let synced = state.is_synced();
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            change = state.next_remote_change(), if subscribed => {
                let Some(change) = change else {
                    warn!("Change feed closed");
                    break;
                };
                info!(table = %change.table(), "Remote change applied");
            }
            _ = poll.tick(), if polling && synced => {
                match state.refresh_from_remote().await {
                    Ok(changes) if changes.is_empty() => continue,
                    Ok(changes) => info!(changes = changes.len(), "Picked up remote edits"),
                    Err(e) => {
                        warn!("Failed to refresh from remote store: {e}");
                        continue;
                    }
                }
            }
        }
        println!("{}", report::render_dashboard(&state, &ui, Local::now().date_naive()));
    }

    // 8. Teardown
    info!("Shutting down");
    let flushed = state.flush_pending().await;
    if !flushed.is_clean() {
        warn!(failed = flushed.failed.len(), "Some writes could not be saved");
    }
    state.shutdown();
    preferences::save_preferences(&preferences_path, &ui)
        .inspect_err(|e| error!("Failed to save preferences: {e}"))?;

    Ok(())
}
