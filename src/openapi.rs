//! OpenAPI document assembly.

use crate::api::models::categories::{CategoryCreate, CategoryResponse};
use crate::api::models::stickers::StickerResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "stickerd",
        description = "Sticker storage service: user-owned sticker categories with validated image uploads"
    ),
    servers(
        (url = "/api/v1", description = "Sticker API")
    ),
    paths(
        crate::api::handlers::categories::get_categories,
        crate::api::handlers::categories::create_category,
        crate::api::handlers::stickers::get_stickers,
        crate::api::handlers::stickers::upload_sticker,
        crate::api::handlers::stickers::delete_sticker,
        crate::api::handlers::stickers::download_sticker,
    ),
    components(schemas(CategoryCreate, CategoryResponse, StickerResponse)),
    tags(
        (name = "categories", description = "Sticker category management"),
        (name = "stickers", description = "Sticker upload, retrieval and deletion")
    )
)]
pub struct ApiDoc;
