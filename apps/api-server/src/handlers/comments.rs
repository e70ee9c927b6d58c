//! Comments on posts.

use actix_web::{HttpRequest, HttpResponse, web};

use murmur_core::domain::{CommentId, FeedFilter, PostId};
use murmur_shared::dto::{BackwardPageQuery, CreateCommentRequest, ToggleLikeResponse};

use super::{backward, stream};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/posts/{id}/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<PostId>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .service
        .create_comment(Some(identity.user_id), path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

/// GET /api/posts/{id}/comments
///
/// A page of comments, or with `Accept: text/event-stream` a live stream of new
/// comments by other users.
pub async fn list(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<PostId>,
    query: web::Query<BackwardPageQuery>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    if stream::wants_event_stream(&req) {
        let user_id = identity.user_id().ok_or(AppError::Unauthorized)?;
        // 404 before subscribing to a post that does not exist
        state.service.post(Some(user_id), post_id).await?;
        return Ok(stream::subscribe(&state, user_id, FeedFilter::Comments(post_id)));
    }

    let comments = state
        .service
        .comments(identity.user_id(), post_id, &backward(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// POST /api/comments/{id}/toggle_like
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<CommentId>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .service
        .toggle_comment_like(Some(identity.user_id), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ToggleLikeResponse {
        liked: outcome.active,
        likes_count: outcome.count,
    }))
}
