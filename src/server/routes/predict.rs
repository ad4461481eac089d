//! Prediction endpoint

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::debug;

use crate::inference::PredictionResult;
use crate::server::error::ApiError;
use crate::server::state::SharedState;

/// Multipart field carrying the uploaded image
pub const IMAGE_FIELD: &str = "image";

/// POST /predict - classify the uploaded leaf image
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let mut multipart = multipart?;
    let bytes = read_image_field(&mut multipart).await?;
    debug!("Received {} byte upload", bytes.len());

    let result = state.predictor.predict_bytes(bytes).await?;
    Ok(Json(result))
}

/// Return the bytes of the first `image` field, skipping other fields
async fn read_image_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }

    Err(ApiError::MissingImage)
}
