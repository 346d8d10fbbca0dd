//! User account and subscription endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    routing::{get, post},
};
use foodgram_common::AppResult;
use foodgram_core::{CreateUserInput, DeleteAccountInput, SetPasswordInput, UserView};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    pagination::{PageParams, PageWindow, Paginated},
    response::{RegisteredUserResponse, UserResponse},
};

/// List users.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let window = PageWindow::resolve(params, &state.pagination)?;
    let page = state
        .user_service
        .list(viewer.as_ref(), window.offset(), window.limit)
        .await?;

    Ok(Json(Paginated::new(
        page,
        window,
        query.as_deref(),
        UserResponse::from,
    )?))
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<RegisteredUserResponse>)> {
    let user = state.user_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Get the current user.
async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    // Following yourself is impossible.
    Json(
        UserView {
            user,
            is_subscribed: false,
        }
        .into(),
    )
}

/// Delete the current user's account.
async fn delete_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteAccountInput>,
) -> AppResult<StatusCode> {
    state.user_service.delete_account(&user, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a user by ID.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let view = state.user_service.get(viewer.as_ref(), &id).await?;
    Ok(Json(view.into()))
}

/// Change the current user's password.
async fn set_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SetPasswordInput>,
) -> AppResult<StatusCode> {
    state.user_service.set_password(&user, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Authors the current user follows.
async fn subscriptions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let window = PageWindow::resolve(params, &state.pagination)?;
    let page = state
        .follow_service
        .subscriptions(&user, window.offset(), window.limit)
        .await?;

    Ok(Json(Paginated::new(
        page,
        window,
        query.as_deref(),
        UserResponse::from,
    )?))
}

/// Follow an author.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let author = state.follow_service.follow(&user, &id).await?;
    Ok((StatusCode::CREATED, Json(author.into())))
}

/// Unfollow an author.
async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.follow_service.unfollow(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list).post(register))
        .route("/users/me/", get(me).delete(delete_me))
        .route("/users/set_password/", post(set_password))
        .route("/users/subscriptions/", get(subscriptions))
        .route("/users/{id}/", get(show))
        .route("/users/{id}/subscribe/", post(subscribe).delete(unsubscribe))
}
