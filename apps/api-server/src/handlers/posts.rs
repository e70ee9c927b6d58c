//! Publishing and reading posts.

use actix_web::{HttpResponse, web};

use murmur_core::domain::PostId;
use murmur_shared::dto::{CreatePostRequest, ToggleLikeResponse};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts
///
/// Responds once the post and the author's own timeline row are committed;
/// follower timelines fill in the background.
pub async fn publish(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let entry = state
        .service
        .publish_post(
            Some(identity.user_id),
            &req.content,
            req.spoiler_of.as_deref(),
            req.nsfw,
        )
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

/// GET /api/posts/{id}
pub async fn show(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let post = state
        .service
        .post(identity.user_id(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts/{id}/toggle_like
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .service
        .toggle_post_like(Some(identity.user_id), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ToggleLikeResponse {
        liked: outcome.active,
        likes_count: outcome.count,
    }))
}
