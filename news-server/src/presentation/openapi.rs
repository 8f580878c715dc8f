use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::news::{
    CreatePostDto, ListPostsResponseDto, PostDto, PostEnvelopeDto, PostRefDto, ReorderPostsDto,
    SuccessDto, UpdatePostDto,
};
use crate::presentation::handlers::upload::UploadResponseDto;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::news::list_posts,
        crate::presentation::handlers::news::create_post,
        crate::presentation::handlers::news::update_post,
        crate::presentation::handlers::news::delete_post,
        crate::presentation::handlers::news::reorder_posts,
        crate::presentation::handlers::upload::upload_image
    ),
    components(
        schemas(
            CreatePostDto,
            UpdatePostDto,
            PostRefDto,
            ReorderPostsDto,
            PostDto,
            PostEnvelopeDto,
            ListPostsResponseDto,
            SuccessDto,
            UploadResponseDto
        )
    ),
    tags(
        (name = "news", description = "News post endpoints"),
        (name = "upload", description = "Image upload")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
