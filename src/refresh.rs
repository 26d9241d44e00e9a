//! Periodic snapshot refresh.
//!
//! Catalog and promotion data are re-fetched on fixed intervals. Each successful fetch
//! is published as a whole new `Arc` snapshot, so readers never observe a partially
//! updated collection. Until the first successful fetch the snapshot is empty; a failed
//! fetch keeps the previous snapshot.

use std::{fmt::Display, future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::{
    api::{ApiError, StorefrontApi},
    catalog::Catalog,
    promotions::PromotionDirectory,
};

/// A refresh task and the receiver its snapshots are published on.
#[derive(Debug)]
pub struct Refresh<T> {
    /// Latest published snapshot
    pub snapshots: watch::Receiver<Arc<T>>,

    /// Handle of the background task; aborting it stops refreshing
    pub task: JoinHandle<()>,
}

/// Fetch immediately and then every `period`, publishing each successful result.
///
/// The task stops once every receiver has been dropped.
pub fn spawn<T, E, F, Fut>(name: &'static str, period: Duration, mut fetch: F) -> Refresh<T>
where
    T: Default + Send + Sync + 'static,
    E: Display,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
{
    let (sender, snapshots) = watch::channel(Arc::new(T::default()));

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match fetch().await {
                Ok(snapshot) => {
                    if sender.send(Arc::new(snapshot)).is_err() {
                        debug!(name, "no snapshot readers left, stopping refresh");
                        break;
                    }
                }
                Err(error) => {
                    warn!(name, %error, "refresh failed, keeping previous snapshot");
                }
            }
        }
    });

    Refresh { snapshots, task }
}

/// Keep a catalog snapshot fresh.
pub fn spawn_catalog(api: Arc<dyn StorefrontApi>, period: Duration) -> Refresh<Catalog> {
    spawn("catalog", period, move || {
        let api = Arc::clone(&api);

        async move { Ok::<_, ApiError>(Catalog::from_records(api.products().await?)) }
    })
}

/// Keep a promotion directory snapshot fresh.
pub fn spawn_promotions(
    api: Arc<dyn StorefrontApi>,
    period: Duration,
) -> Refresh<PromotionDirectory> {
    spawn("promotions", period, move || {
        let api = Arc::clone(&api);

        async move {
            Ok::<_, ApiError>(PromotionDirectory::from_records(
                api.promotions().await?,
            ))
        }
    })
}
