//! Concurrent detail lookups for a list of game ids.
//!
//! All fetches are issued at once and awaited together. A failed fetch never
//! aborts the batch: [`gather_details`] drops it and keeps the rest in their
//! original order.

use std::future::Future;
use std::pin::Pin;

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::error::CatalogError;
use crate::models::{GameDetail, GameId};

/// Anything that can resolve a game id to its detail record.
///
/// [`CatalogClient`](super::CatalogClient) is the production implementation.
pub trait DetailSource: Send + Sync {
    /// Fetches the detail record for `id`.
    fn fetch_detail(
        &self,
        id: GameId,
    ) -> Pin<Box<dyn Future<Output = Result<GameDetail, CatalogError>> + Send + '_>>;
}

/// Fetches every id concurrently and returns each outcome, in input order.
pub async fn settle_details<S>(
    source: &S,
    ids: &[GameId],
) -> Vec<(GameId, Result<GameDetail, CatalogError>)>
where
    S: DetailSource + ?Sized,
{
    let fetches = ids
        .iter()
        .map(move |&id| async move { (id, source.fetch_detail(id).await) });
    join_all(fetches).await
}

/// Fetches every id concurrently, keeping only the successes.
pub async fn gather_details<S>(source: &S, ids: &[GameId]) -> Vec<GameDetail>
where
    S: DetailSource + ?Sized,
{
    let settled = settle_details(source, ids).await;
    let total = settled.len();

    let details: Vec<GameDetail> = settled
        .into_iter()
        .filter_map(|(id, result)| match result {
            Ok(detail) => Some(detail),
            Err(err) => {
                warn!(game_id = id, error = %err, "dropping game whose details failed to load");
                None
            }
        })
        .collect();

    debug!(requested = total, loaded = details.len(), "detail gather settled");
    details
}
