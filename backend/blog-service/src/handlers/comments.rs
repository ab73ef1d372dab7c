/// Comment handlers - HTTP endpoints for comment operations
use super::{validated, PageQuery};
use crate::error::Result;
use crate::limits::{comment as limit, LIKES_COUNT_RANGE};
use crate::models::{CreateComment, EditComment};
use crate::services::CommentService;
use crate::state::AppState;
use crate::validation::{FieldRule, Schema};
use actix_web::{web, HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

fn content() -> FieldRule {
    FieldRule::string("content")
        .length(limit::CONTENT_LENGTH_RANGE)
        .trim()
}

static CREATE_COMMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("postId").required(),
        FieldRule::object_id("userId").required(),
        content().required(),
        FieldRule::uuid_v4("attachmentKey").nullable(),
        FieldRule::integer("likesCount").range(LIKES_COUNT_RANGE),
    ])
});

static EDIT_COMMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("id").required(),
        FieldRule::object_id("userId").required(),
        content().required(),
    ])
});

static OWNED_COMMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("id").required(),
        FieldRule::object_id("userId").required(),
    ])
});

static BY_ID: Lazy<Schema> = Lazy::new(|| Schema::new(vec![FieldRule::object_id("id").required()]));

static BY_KEY: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::uuid_v4("key").required()]));

static BY_POST: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::object_id("postId").required()]));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedPath {
    id: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct IdPath {
    id: String,
}

#[derive(Debug, Deserialize)]
struct KeyPath {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostPath {
    post_id: String,
}

fn service(state: &AppState) -> CommentService {
    CommentService::new(state.store.clone())
}

/// Comment on an existing post
pub async fn create_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let input: CreateComment = validated(&state, &CREATE_COMMENT, &req, Some(body.into_inner()))?;
    let comment = service(&state).create_comment(input).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn edit_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let input: EditComment = validated(&state, &EDIT_COMMENT, &req, Some(body.into_inner()))?;
    service(&state).edit_comment(input).await?;
    Ok(HttpResponse::Ok().json(true))
}

pub async fn delete_comment(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let OwnedPath { id, user_id } = validated(&state, &OWNED_COMMENT, &req, None)?;
    service(&state).delete_comment(&id, &user_id).await?;
    Ok(HttpResponse::Ok().json(true))
}

pub async fn get_comment_by_id(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let IdPath { id } = validated(&state, &BY_ID, &req, None)?;
    let comment = service(&state).get_comment_by_id(&id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn get_comment_by_key(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let KeyPath { key } = validated(&state, &BY_KEY, &req, None)?;
    let comment = service(&state).get_comment_by_key(&key).await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// Comments of one post, oldest first
pub async fn get_post_comments(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let PostPath { post_id } = validated(&state, &BY_POST, &req, None)?;
    let page = service(&state)
        .list_post_comments(&post_id, query.checked()?)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn like_comment(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let IdPath { id } = validated(&state, &BY_ID, &req, None)?;
    let total = service(&state).like_comment(&id).await?;
    Ok(HttpResponse::Ok().json(total))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/comment/create/{postId}/{userId}",
        web::post().to(create_comment),
    )
    .route("/comment/id/{id}", web::get().to(get_comment_by_id))
    .route("/comment/key/{key}", web::get().to(get_comment_by_key))
    .route("/comment/all/{postId}", web::get().to(get_post_comments))
    .route("/comment/like/{id}", web::get().to(like_comment))
    .route("/comment/{id}/{userId}", web::put().to(edit_comment))
    .route("/comment/{id}/{userId}", web::delete().to(delete_comment));
}
