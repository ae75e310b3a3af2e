use crate::api::models::stickers::{StickerResponse, UploadStickerQuery};
use crate::auth::{CurrentUser, MaybeUser};
use crate::db::handlers::{Categories, Repository, Stickers};
use crate::db::models::stickers::StickerCreateDBRequest;
use crate::errors::{Error, Result};
use crate::sniff;
use crate::storage::StorageError;
use crate::types::{CategoryId, StickerId};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use sqlx::PgConnection;
use uuid::Uuid;

/// Hard ceiling on sticker payload size (1 MiB)
pub const MAX_STICKER_BYTES: usize = 1024 * 1024;

/// Body limit for the upload route: the sticker cap plus multipart framing
/// headroom. Payloads between the two bounds still get the proper
/// "file too large" response from the incremental size check.
pub const UPLOAD_BODY_LIMIT: usize = 4 * MAX_STICKER_BYTES;

/// Maximum length of a stored sticker name, matching the column width
const MAX_FILENAME_CHARS: usize = 64;

/// Resolve a category and require that the caller owns it.
///
/// A category that is missing and a category owned by someone else produce
/// the same `NotFound`, so callers cannot probe for other users' categories.
async fn resolve_owned_category(conn: &mut PgConnection, category_id: CategoryId, caller: &CurrentUser) -> Result<()> {
    let mut repo = Categories::new(conn);
    match repo.get_by_id(category_id).await? {
        Some(category) if category.user_id == caller.id => Ok(()),
        _ => Err(Error::NotFound {
            resource: "Category".to_string(),
        }),
    }
}

/// Reduce a client-provided filename to something storable.
///
/// Only the final path component is kept - separators must never reach the
/// blob path. An empty result falls back to a generic name; an oversized one
/// is rejected because it could not be persisted in the name column.
fn sanitize_filename(raw: Option<&str>) -> Result<String> {
    let name = raw.unwrap_or("").rsplit(['/', '\\']).next().unwrap_or("").trim();
    let name = if name.is_empty() { "sticker" } else { name };

    if name.chars().count() > MAX_FILENAME_CHARS {
        return Err(Error::BadRequest {
            message: format!("File name must be at most {MAX_FILENAME_CHARS} characters"),
        });
    }

    Ok(name.to_string())
}

#[utoipa::path(
    get,
    path = "/sticker/categories/{category_id}/stickers",
    tag = "stickers",
    summary = "List stickers",
    description = "Returns the stickers in one of the caller's categories, in upload order.",
    params(
        ("category_id" = Uuid, Path, description = "Category to list")
    ),
    responses(
        (status = 200, description = "List of stickers", body = Vec<StickerResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Category not found or not owned by the caller")
    )
)]
pub async fn get_stickers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Vec<StickerResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    resolve_owned_category(&mut conn, category_id, &current_user).await?;

    let mut repo = Stickers::new(&mut conn);
    let stickers = repo.list_by_category(category_id).await?;

    Ok(Json(
        stickers
            .iter()
            .map(|sticker| StickerResponse::from_sticker(sticker, &state.config.public_url))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/sticker",
    tag = "stickers",
    summary = "Upload sticker",
    description = "Upload a sticker image into one of the caller's categories. The content type \
                   is sniffed from the bytes; PNG, JPEG, GIF, WEBP and SVG are accepted, up to 1 MiB.",
    params(UploadStickerQuery),
    request_body(
        content_type = "multipart/form-data",
        description = "Image payload in the `file` field"
    ),
    responses(
        (status = 201, description = "Sticker created", body = StickerResponse),
        (status = 400, description = "Missing file, file too large, or invalid file type"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Category not found or not owned by the caller"),
        (status = 500, description = "Could not save file")
    )
)]
pub async fn upload_sticker(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<UploadStickerQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StickerResponse>)> {
    let category_id = query.category_id;

    {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        resolve_owned_category(&mut conn, category_id, &current_user).await?;
    }

    // Drain the multipart stream, keeping only the file field. The size cap
    // is enforced incrementally so an oversized upload fails without being
    // buffered whole.
    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        match field.name().unwrap_or("") {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());

                let mut data = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read file chunk: {e}"),
                })? {
                    if data.len() + chunk.len() > MAX_STICKER_BYTES {
                        return Err(Error::BadRequest {
                            message: "File too large. Max 1MB.".to_string(),
                        });
                    }
                    data.extend_from_slice(&chunk);
                }

                content = Some(data);
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    let content = content.filter(|data| !data.is_empty()).ok_or_else(|| Error::BadRequest {
        message: "No file provided".to_string(),
    })?;

    let name = sanitize_filename(filename.as_deref())?;

    // Trust the bytes, not the client-declared content type
    let mime_type = sniff::sniff_mime(&content).ok_or_else(|| Error::BadRequest {
        message: "Invalid file type. Allowed types: PNG, JPEG, GIF, WEBP, SVG".to_string(),
    })?;

    let folder = format!("stickers/{category_id}");
    state.storage.ensure_folder(&folder).await?;

    // Collision-resistant storage name: concurrent uploads of the same
    // filename into one category land on distinct blobs
    let path = format!("{}/{}-{}", folder, Uuid::new_v4().simple(), name);

    state.storage.write(&path, &content).await?;

    // Blob write succeeded; only now create the metadata record. If the
    // insert fails, remove the blob again so neither side is left dangling.
    let sticker = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = Stickers::new(&mut conn);

        let create_request = StickerCreateDBRequest {
            category_id,
            name,
            path: path.clone(),
            mime_type: mime_type.to_string(),
            uploaded_by: Some(current_user.id.clone()),
        };

        match repo.create(&create_request).await {
            Ok(sticker) => sticker,
            Err(e) => {
                let _ = state.storage.delete(&path).await;
                return Err(e.into());
            }
        }
    };

    tracing::info!(
        sticker_id = %sticker.id,
        category_id = %category_id,
        mime_type = %sticker.mime_type,
        size_bytes = content.len(),
        "Uploaded sticker"
    );

    Ok((
        StatusCode::CREATED,
        Json(StickerResponse::from_sticker(&sticker, &state.config.public_url)),
    ))
}

#[utoipa::path(
    delete,
    path = "/sticker/{sticker_id}",
    tag = "stickers",
    summary = "Delete sticker",
    description = "Delete a sticker. Only the user who uploaded it may delete it; the blob is \
                   removed best-effort before the record.",
    params(
        ("sticker_id" = Uuid, Path, description = "Sticker to delete")
    ),
    responses(
        (status = 200, description = "Sticker deleted"),
        (status = 403, description = "Caller is not the uploader"),
        (status = 404, description = "Sticker not found")
    )
)]
pub async fn delete_sticker(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(sticker_id): Path<StickerId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Stickers::new(&mut conn);

    let sticker = repo.get_by_id(sticker_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Sticker".to_string(),
    })?;

    // Existence is checked first, so a missing sticker is 404 even for an
    // anonymous caller; only then does ownership decide between 403 and 200
    let is_uploader = matches!(
        (&caller, &sticker.uploaded_by),
        (Some(user), Some(uploader)) if &user.id == uploader
    );
    if !is_uploader {
        return Err(Error::Forbidden {
            message: "Forbidden".to_string(),
        });
    }

    // Best-effort blob deletion: a blob that is already gone, or a storage
    // hiccup, must not keep the metadata row alive
    match state.storage.delete(&sticker.path).await {
        Ok(()) | Err(StorageError::NotFound) => {}
        Err(e) => {
            tracing::warn!(sticker_id = %sticker.id, "Failed to delete sticker blob: {e}");
        }
    }

    repo.delete(sticker.id).await?;

    tracing::info!(sticker_id = %sticker.id, "Deleted sticker");

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/sticker/{sticker_id}/image",
    tag = "stickers",
    summary = "Download sticker image",
    description = "Returns the raw sticker bytes. Any authenticated user may download any sticker.",
    params(
        ("sticker_id" = Uuid, Path, description = "Sticker to download")
    ),
    responses(
        (status = 200, description = "Raw image bytes"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Sticker or its file not found")
    )
)]
pub async fn download_sticker(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sticker_id): Path<StickerId>,
) -> Result<([(header::HeaderName, String); 2], Vec<u8>)> {
    let sticker = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = Stickers::new(&mut conn);
        repo.get_by_id(sticker_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Sticker".to_string(),
        })?
    };

    // A missing blob here means the metadata and blob store have drifted;
    // surfaced as 404 "File not found"
    let bytes = state.storage.read(&sticker.path).await?;

    Ok((
        [
            (header::CONTENT_TYPE, sticker.mime_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", sticker.name.replace('"', "")),
            ),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, AUTH_HEADER};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    fn png_payload(extra_bytes: usize) -> Vec<u8> {
        let mut payload = PNG_MAGIC.to_vec();
        payload.resize(PNG_MAGIC.len() + extra_bytes, 0xAB);
        payload
    }

    async fn create_category(server: &TestServer, user: &str, name: &str) -> Uuid {
        let response = server
            .post("/api/v1/sticker/categories")
            .add_header(AUTH_HEADER, user)
            .json(&json!({ "name": name }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
    }

    async fn upload(
        server: &TestServer,
        user: &str,
        category_id: Uuid,
        filename: &str,
        bytes: Vec<u8>,
    ) -> axum_test::TestResponse {
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(bytes).file_name(filename).mime_type("image/png"),
        );
        server
            .post("/api/v1/sticker")
            .add_query_param("categoryId", category_id)
            .add_header(AUTH_HEADER, user)
            .multipart(form)
            .await
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_list_download_roundtrip(pool: PgPool) {
        let (server, _storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        let bytes = png_payload(10 * 1024);
        let response = upload(&server, "alice", category_id, "smile.png", bytes.clone()).await;
        response.assert_status(StatusCode::CREATED);
        let sticker: serde_json::Value = response.json();
        assert_eq!(sticker["name"], "smile.png");
        assert_eq!(sticker["mimeType"], "image/png");
        assert_eq!(sticker["uploadedBy"], "alice");
        let url = sticker["url"].as_str().unwrap();
        assert!(url.ends_with(&format!("/api/v1/sticker/{}/image", sticker["id"].as_str().unwrap())));

        // The new sticker shows up in the category listing
        let response = server
            .get(&format!("/api/v1/sticker/categories/{category_id}/stickers"))
            .add_header(AUTH_HEADER, "alice")
            .await;
        response.assert_status(StatusCode::OK);
        let stickers: Vec<serde_json::Value> = response.json();
        assert_eq!(stickers.len(), 1);
        assert_eq!(stickers[0]["id"], sticker["id"]);

        // Stickers are readable by any logged-in user, not just the owner
        let response = server
            .get(&format!("/api/v1/sticker/{}/image", sticker["id"].as_str().unwrap()))
            .add_header(AUTH_HEADER, "bob")
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.as_bytes().as_ref(), bytes.as_slice());
        assert_eq!(response.headers()[axum::http::header::CONTENT_TYPE], "image/png");
    }

    #[sqlx::test]
    async fn test_upload_requires_file_field(pool: PgPool) {
        let (server, _storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        let form = MultipartForm::new().add_text("note", "no file here");
        let response = server
            .post("/api/v1/sticker")
            .add_query_param("categoryId", category_id)
            .add_header(AUTH_HEADER, "alice")
            .multipart(form)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "No file provided");

        // An empty file field is the same as no file
        let response = upload(&server, "alice", category_id, "empty.png", Vec::new()).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_upload_size_ceiling(pool: PgPool) {
        let (server, _storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        // 2 MiB with a valid PNG magic still gets rejected on size
        let response = upload(&server, "alice", category_id, "big.png", png_payload(2 * 1024 * 1024)).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "File too large. Max 1MB.");
    }

    #[sqlx::test]
    async fn test_upload_sniffs_content_type(pool: PgPool) {
        let (server, _storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        // The .png name and declared mime type do not save a text payload
        let response = upload(&server, "alice", category_id, "fake.png", b"plain text, not an image".to_vec()).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Invalid file type. Allowed types: PNG, JPEG, GIF, WEBP, SVG");

        // SVG has no magic bytes but is allowlisted
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"/>"#.to_vec();
        let response = upload(&server, "alice", category_id, "icon.svg", svg).await;
        response.assert_status(StatusCode::CREATED);
        let sticker: serde_json::Value = response.json();
        assert_eq!(sticker["mimeType"], "image/svg+xml");
    }

    #[sqlx::test]
    async fn test_category_ownership_is_masked_as_not_found(pool: PgPool) {
        let (server, _storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        // Another user probing the category gets 404, never 403
        let response = server
            .get(&format!("/api/v1/sticker/categories/{category_id}/stickers"))
            .add_header(AUTH_HEADER, "bob")
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let response = upload(&server, "bob", category_id, "sneaky.png", png_payload(16)).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        // Indistinguishable from a category that does not exist at all
        let response = server
            .get(&format!("/api/v1/sticker/categories/{}/stickers", Uuid::new_v4()))
            .add_header(AUTH_HEADER, "bob")
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_delete_requires_uploader(pool: PgPool) {
        let (server, _storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        let response = upload(&server, "alice", category_id, "keep.png", png_payload(64)).await;
        let sticker: serde_json::Value = response.json();
        let sticker_id = sticker["id"].as_str().unwrap().to_string();

        // Non-uploader and anonymous callers are both forbidden
        let response = server
            .delete(&format!("/api/v1/sticker/{sticker_id}"))
            .add_header(AUTH_HEADER, "bob")
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        let response = server.delete(&format!("/api/v1/sticker/{sticker_id}")).await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

        // The sticker survived both attempts
        let response = server
            .get(&format!("/api/v1/sticker/{sticker_id}/image"))
            .add_header(AUTH_HEADER, "alice")
            .await;
        response.assert_status(StatusCode::OK);
    }

    #[sqlx::test]
    async fn test_delete_by_uploader_removes_sticker_and_blob(pool: PgPool) {
        let (server, storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        let response = upload(&server, "alice", category_id, "gone.png", png_payload(64)).await;
        let sticker: serde_json::Value = response.json();
        let sticker_id = sticker["id"].as_str().unwrap().to_string();

        let response = server
            .delete(&format!("/api/v1/sticker/{sticker_id}"))
            .add_header(AUTH_HEADER, "alice")
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        // Gone from listing and download, and no blob left on disk
        let response = server
            .get(&format!("/api/v1/sticker/categories/{category_id}/stickers"))
            .add_header(AUTH_HEADER, "alice")
            .await;
        let stickers: Vec<serde_json::Value> = response.json();
        assert!(stickers.is_empty());

        let response = server
            .get(&format!("/api/v1/sticker/{sticker_id}/image"))
            .add_header(AUTH_HEADER, "alice")
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

        let category_dir = storage_dir.path().join("stickers").join(category_id.to_string());
        let remaining = std::fs::read_dir(&category_dir).map(|dir| dir.count()).unwrap_or(0);
        assert_eq!(remaining, 0);

        // Deleting again is a plain 404
        let response = server
            .delete(&format!("/api/v1/sticker/{sticker_id}"))
            .add_header(AUTH_HEADER, "alice")
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_download_requires_authentication(pool: PgPool) {
        let (server, _storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        let response = upload(&server, "alice", category_id, "smile.png", png_payload(64)).await;
        let sticker: serde_json::Value = response.json();

        let response = server
            .get(&format!("/api/v1/sticker/{}/image", sticker["id"].as_str().unwrap()))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_download_with_missing_blob_is_not_found(pool: PgPool) {
        let (server, storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        let response = upload(&server, "alice", category_id, "drift.png", png_payload(64)).await;
        let sticker: serde_json::Value = response.json();

        // Simulate metadata/blob drift by removing the blobs out-of-band
        std::fs::remove_dir_all(storage_dir.path().join("stickers")).unwrap();

        let response = server
            .get(&format!("/api/v1/sticker/{}/image", sticker["id"].as_str().unwrap()))
            .add_header(AUTH_HEADER, "alice")
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "File not found");
    }

    #[sqlx::test]
    async fn test_concurrent_style_uploads_get_distinct_paths(pool: PgPool) {
        let (server, storage_dir) = create_test_app(pool).await;
        let category_id = create_category(&server, "alice", "emoji").await;

        // Same filename twice: both succeed and both blobs exist
        upload(&server, "alice", category_id, "same.png", png_payload(8))
            .await
            .assert_status(StatusCode::CREATED);
        upload(&server, "alice", category_id, "same.png", png_payload(8))
            .await
            .assert_status(StatusCode::CREATED);

        let category_dir = storage_dir.path().join("stickers").join(category_id.to_string());
        let blobs = std::fs::read_dir(&category_dir).unwrap().count();
        assert_eq!(blobs, 2);
    }
}
