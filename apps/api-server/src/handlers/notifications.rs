//! Notifications and their read state.

use actix_web::{HttpRequest, HttpResponse, web};

use murmur_core::domain::{FeedFilter, NotificationId};
use murmur_shared::dto::{BackwardPageQuery, MarkAllReadResponse, UnreadCountResponse};

use super::{backward, stream};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/notifications?last=&before=
pub async fn list(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<BackwardPageQuery>,
) -> AppResult<HttpResponse> {
    if stream::wants_event_stream(&req) {
        return Ok(stream::subscribe(
            &state,
            identity.user_id,
            FeedFilter::Notifications,
        ));
    }

    let notifications = state
        .service
        .notifications(Some(identity.user_id), &backward(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(notifications))
}

pub async fn unread_count(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let unread = state
        .service
        .unread_notifications(Some(identity.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(UnreadCountResponse { unread }))
}

/// POST /api/notifications/{id}/mark_as_read
pub async fn mark_read(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<NotificationId>,
) -> AppResult<HttpResponse> {
    state
        .service
        .mark_notification_read(Some(identity.user_id), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/mark_notifications_as_read
pub async fn mark_all_read(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let updated = state
        .service
        .mark_all_notifications_read(Some(identity.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(MarkAllReadResponse { updated }))
}
