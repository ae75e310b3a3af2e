use crate::db::handlers::stickers::Sticker;
use crate::types::{CategoryId, StickerId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the sticker upload endpoint
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UploadStickerQuery {
    /// Target category for the uploaded sticker
    #[param(value_type = Uuid)]
    pub category_id: CategoryId,
}

/// Sticker object response.
///
/// The storage path is a server-internal detail and is never exposed;
/// clients retrieve bytes through `url`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StickerResponse {
    #[schema(value_type = Uuid)]
    pub id: StickerId,
    #[schema(value_type = Uuid)]
    pub category_id: CategoryId,
    /// Original filename of the upload
    pub name: String,
    pub mime_type: String,
    pub uploaded_by: Option<UserId>,
    /// Upload time as unix timestamp
    pub upload_time: i64,
    /// Download URL for the sticker image
    pub url: String,
}

impl StickerResponse {
    pub fn from_sticker(sticker: &Sticker, public_url: &str) -> Self {
        Self {
            id: sticker.id,
            category_id: sticker.category_id,
            name: sticker.name.clone(),
            mime_type: sticker.mime_type.clone(),
            uploaded_by: sticker.uploaded_by.clone(),
            upload_time: sticker.uploaded_at.timestamp(),
            url: download_url(public_url, sticker.id),
        }
    }
}

/// Build the absolute download URL for a sticker
pub fn download_url(public_url: &str, sticker_id: StickerId) -> String {
    format!("{}/api/v1/sticker/{}/image", public_url.trim_end_matches('/'), sticker_id)
}
