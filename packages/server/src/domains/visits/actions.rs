//! Visit history actions.

use anyhow::Result;
use tracing::debug;

use crate::common::UserId;
use crate::domains::visits::Visit;
use crate::kernel::ServerDeps;

/// The user's recorded visits, newest first.
pub async fn list_visits(user_id: UserId, deps: &ServerDeps) -> Result<Vec<Visit>> {
    let visits = deps.visit_store.list_for_user(user_id).await?;
    debug!(user_id = %user_id, count = visits.len(), "Listed visits");
    Ok(visits)
}
