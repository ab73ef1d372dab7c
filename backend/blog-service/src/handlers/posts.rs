/// Post handlers - HTTP endpoints for post operations
use super::{validated, PageQuery};
use crate::error::Result;
use crate::limits::{post as limit, LIKES_COUNT_RANGE};
use crate::models::{CreatePost, EditPost};
use crate::services::PostService;
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

fn category() -> FieldRule {
    FieldRule::string("category")
        .length(limit::CATEGORY_LENGTH_RANGE)
        .trim()
}

static CREATE_POST: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("userId").required(),
        content().required(),
        category().required(),
        FieldRule::uuid_v4("attachmentKey").nullable(),
        FieldRule::integer("likesCount").range(LIKES_COUNT_RANGE),
    ])
});

static EDIT_POST: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("id").required(),
        FieldRule::object_id("userId").required(),
        content(),
        category(),
    ])
});

static OWNED_POST: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("id").required(),
        FieldRule::object_id("userId").required(),
    ])
});

static BY_ID: Lazy<Schema> = Lazy::new(|| Schema::new(vec![FieldRule::object_id("id").required()]));

static BY_KEY: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::uuid_v4("key").required()]));

static BY_AUTHOR: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::object_id("authorId").required()]));

static BY_CATEGORY: Lazy<Schema> = Lazy::new(|| Schema::new(vec![category().required()]));

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
struct AuthorPath {
    author_id: String,
}

#[derive(Debug, Deserialize)]
struct CategoryPath {
    category: String,
}

fn service(state: &AppState) -> PostService {
    PostService::new(state.store.clone())
}

/// Create a new post
pub async fn create_post(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let input: CreatePost = validated(&state, &CREATE_POST, &req, Some(body.into_inner()))?;
    let post = service(&state).create_post(input).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Edit a post (author only)
pub async fn edit_post(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let input: EditPost = validated(&state, &EDIT_POST, &req, Some(body.into_inner()))?;
    service(&state).edit_post(input).await?;
    Ok(HttpResponse::Ok().json(true))
}

/// Delete a post (author only)
pub async fn delete_post(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let OwnedPath { id, user_id } = validated(&state, &OWNED_POST, &req, None)?;
    service(&state).delete_post(&id, &user_id).await?;
    Ok(HttpResponse::Ok().json(true))
}

pub async fn get_post_by_id(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let IdPath { id } = validated(&state, &BY_ID, &req, None)?;
    let post = service(&state).get_post_by_id(&id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn get_post_by_key(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let KeyPath { key } = validated(&state, &BY_KEY, &req, None)?;
    let post = service(&state).get_post_by_key(&key).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Posts written by one user, newest first
pub async fn get_user_posts(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let AuthorPath { author_id } = validated(&state, &BY_AUTHOR, &req, None)?;
    let page = service(&state)
        .list_user_posts(&author_id, query.checked()?)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_category_posts(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let CategoryPath { category } = validated(&state, &BY_CATEGORY, &req, None)?;
    let page = service(&state)
        .list_category_posts(&category, query.checked()?)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Every post, with the author's public name joined in
pub async fn get_all_posts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = service(&state).list_all_posts(query.checked()?).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn like_post(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let IdPath { id } = validated(&state, &BY_ID, &req, None)?;
    let total = service(&state).like_post(&id).await?;
    Ok(HttpResponse::Ok().json(total))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/post/create/{userId}", web::post().to(create_post))
        .route("/post/all", web::get().to(get_all_posts))
        .route("/post/id/{id}", web::get().to(get_post_by_id))
        .route("/post/key/{key}", web::get().to(get_post_by_key))
        .route("/post/alluserposts/{authorId}", web::get().to(get_user_posts))
        .route("/post/category/{category}", web::get().to(get_category_posts))
        .route("/post/like/{id}", web::get().to(like_post))
        .route("/post/{id}/{userId}", web::put().to(edit_post))
        .route("/post/{id}/{userId}", web::delete().to(delete_post));
}
