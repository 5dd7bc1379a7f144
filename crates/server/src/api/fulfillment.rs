//! The ticket fulfillment endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tixmail_core::{FulfillmentError, FulfillmentRequest};
use tracing::{error, info, warn};

use crate::state::AppState;

pub const SUCCESS_MESSAGE: &str = "QR codes generated and emailed successfully!";
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid request payload";

/// POST /generate-qr
///
/// The body is decoded by hand so that every malformed or ill-typed
/// payload gets the same 400 response. The fulfillment runs on its own
/// task; this handler only waits for its single result.
pub async fn generate_qr(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: FulfillmentRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected fulfillment payload");
            return (StatusCode::BAD_REQUEST, INVALID_PAYLOAD_MESSAGE).into_response();
        }
    };

    info!(
        event_id = %request.event_id,
        quantity = request.ticket_quantity,
        "Fulfillment requested"
    );

    match state
        .service()
        .spawn(request)
        .wait(state.request_timeout())
        .await
    {
        Ok(report) => {
            info!(
                transaction = %report.transaction_code,
                delivered = report.delivered,
                failed = report.failed(),
                "Fulfillment request served"
            );
            (StatusCode::OK, SUCCESS_MESSAGE).into_response()
        }
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &FulfillmentError) -> Response {
    if e.is_client_error() {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    error!(error = %e, source = ?std::error::Error::source(e), "Fulfillment failed");
    let message = match e {
        FulfillmentError::Dispatch(_) => "Error sending email",
        FulfillmentError::TimedOut(_) => "Timed out generating QR codes",
        _ => "Error generating PDFs",
    };
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}
