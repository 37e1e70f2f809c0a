//! Per-payment event history.

use axum::{
    extract::{Path, State},
    Json,
};
use payhook_core::{PaymentId, TimelineEntry};
use tracing::{debug, instrument};

use crate::{error::ApiError, server::AppState};

/// Handles `GET /payments/{payment_id}/events`.
///
/// Returns every stored event for the payment as `{event_type, received_at}`,
/// earliest first. An unknown payment yields `[]`, never 404.
#[instrument(name = "list_payment_events", skip(state), fields(payment_id = %payment_id))]
pub async fn list_payment_events(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<Vec<TimelineEntry>>, ApiError> {
    let payment_id = PaymentId::from(payment_id);
    let events = state.store.find_by_payment_id(&payment_id).await?;

    debug!(count = events.len(), "Payment history loaded");

    Ok(Json(events.into_iter().map(TimelineEntry::from).collect()))
}
