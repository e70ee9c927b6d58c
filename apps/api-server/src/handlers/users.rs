//! Accounts, profiles and the follow graph.

use actix_web::{HttpResponse, web};

use murmur_shared::dto::{
    AuthResponse, BackwardPageQuery, CreateUserRequest, ForwardPageQuery, LoginRequest,
    ToggleFollowResponse, UserSearchQuery,
};

use super::{backward, forward};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/users
pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state.service.create_user(&req.email, &req.handle).await?;
    Ok(HttpResponse::Created().json(user))
}

/// POST /api/login
///
/// Issues a token for an existing account. There is no password; delivering the
/// token out of band is left to the deployment.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let user = state.service.login(&body.email).await?;
    let token = state.tokens.generate_token(user.id, &user.handle)?;

    tracing::info!(user_id = user.id, "Token issued");
    Ok(HttpResponse::Ok().json(AuthResponse::bearer(
        token,
        state.tokens.expiration_seconds(),
        user.id,
        user.handle,
    )))
}

/// GET /api/users?search=&first=&after=
pub async fn search(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<UserSearchQuery>,
) -> AppResult<HttpResponse> {
    let UserSearchQuery {
        search,
        first,
        after,
    } = query.into_inner();
    let page = forward(ForwardPageQuery { first, after });
    let users = state
        .service
        .search_users(identity.user_id(), search.as_deref(), &page)
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/users/{handle}
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let profile = state.service.user(identity.user_id(), &path).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /api/users/{handle}/toggle_follow
pub async fn toggle_follow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .service
        .toggle_follow_handle(Some(identity.user_id), &path)
        .await?;
    Ok(HttpResponse::Ok().json(ToggleFollowResponse {
        following: outcome.active,
        followers_count: outcome.count,
    }))
}

pub async fn followers(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<ForwardPageQuery>,
) -> AppResult<HttpResponse> {
    let users = state
        .service
        .followers(identity.user_id(), &path, &forward(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn followees(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<ForwardPageQuery>,
) -> AppResult<HttpResponse> {
    let users = state
        .service
        .followees(identity.user_id(), &path, &forward(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/users/{handle}/posts?last=&before=
pub async fn posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<BackwardPageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .service
        .posts_by(identity.user_id(), &path, &backward(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}
