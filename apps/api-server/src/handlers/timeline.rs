//! The personal timeline.

use actix_web::{HttpRequest, HttpResponse, web};

use murmur_core::domain::FeedFilter;
use murmur_shared::dto::BackwardPageQuery;

use super::{backward, stream};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/timeline?last=&before=
pub async fn timeline(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<BackwardPageQuery>,
) -> AppResult<HttpResponse> {
    if stream::wants_event_stream(&req) {
        return Ok(stream::subscribe(&state, identity.user_id, FeedFilter::Timeline));
    }

    let entries = state
        .service
        .timeline(Some(identity.user_id), &backward(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}
