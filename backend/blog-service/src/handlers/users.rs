/// User handlers - HTTP endpoints for user operations
use super::validated;
use crate::db::user_repo::UserLookup;
use crate::error::Result;
use crate::limits::{user as limit, PASSWORD_LENGTH_RANGE};
use crate::models::{CreateUser, EditUser};
use crate::services::{parse_object_id, UserService};
use crate::state::AppState;
use crate::validation::{FieldRule, Schema};
use actix_web::{web, HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

static CREATE_USER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::mobile_number("phoneNumber").required(),
        FieldRule::string("displayName")
            .length(limit::DISPLAY_NAME_LENGTH_RANGE)
            .trim()
            .required(),
        FieldRule::username("userName").trim().required(),
        FieldRule::string("password").length(PASSWORD_LENGTH_RANGE).required(),
        FieldRule::uuid_v4("avatarKey").nullable(),
    ])
});

static EDIT_USER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("id").required(),
        FieldRule::mobile_number("phoneNumber"),
        FieldRule::string("displayName")
            .length(limit::DISPLAY_NAME_LENGTH_RANGE)
            .trim(),
        FieldRule::username("userName").trim(),
        FieldRule::string("password").length(PASSWORD_LENGTH_RANGE),
        FieldRule::uuid_v4("avatarKey").nullable(),
    ])
});

static BY_ID: Lazy<Schema> = Lazy::new(|| Schema::new(vec![FieldRule::object_id("id").required()]));

static BY_KEY: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::uuid_v4("key").required()]));

static BY_USER_NAME: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::username("userName").required()]));

static BY_PHONE_NUMBER: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::mobile_number("phoneNumber").required()]));

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
struct UserNamePath {
    user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneNumberPath {
    phone_number: String,
}

fn service(state: &AppState) -> UserService {
    UserService::new(state.store.clone())
}

/// Register a new user
pub async fn create_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let input: CreateUser = validated(&state, &CREATE_USER, &req, Some(body.into_inner()))?;
    service(&state).create_user(input).await?;
    Ok(HttpResponse::Ok().json(true))
}

/// Edit a user's profile
pub async fn edit_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let input: EditUser = validated(&state, &EDIT_USER, &req, Some(body.into_inner()))?;
    service(&state).edit_user(input).await?;
    Ok(HttpResponse::Ok().json(true))
}

pub async fn delete_user(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let IdPath { id } = validated(&state, &BY_ID, &req, None)?;
    service(&state).delete_user(&id).await?;
    Ok(HttpResponse::Ok().json(true))
}

pub async fn get_user_by_id(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let IdPath { id } = validated(&state, &BY_ID, &req, None)?;
    let user = service(&state)
        .get_user(UserLookup::Id(parse_object_id(&id)?))
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn get_user_by_key(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let KeyPath { key } = validated(&state, &BY_KEY, &req, None)?;
    let user = service(&state).get_user(UserLookup::Key(key)).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn get_user_by_user_name(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let UserNamePath { user_name } = validated(&state, &BY_USER_NAME, &req, None)?;
    let user = service(&state)
        .get_user(UserLookup::UserName(user_name))
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn get_user_by_phone_number(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let PhoneNumberPath { phone_number } = validated(&state, &BY_PHONE_NUMBER, &req, None)?;
    let user = service(&state)
        .get_user(UserLookup::PhoneNumber(phone_number))
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// `true` when the username already belongs to someone
pub async fn check_user_name(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let UserNamePath { user_name } = validated(&state, &BY_USER_NAME, &req, None)?;
    let taken = service(&state).is_user_name_taken(&user_name).await?;
    Ok(HttpResponse::Ok().json(taken))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/user/create", web::post().to(create_user))
        .route("/user/{id}", web::put().to(edit_user))
        .route("/user/{id}", web::delete().to(delete_user))
        .route("/user/id/{id}", web::get().to(get_user_by_id))
        .route("/user/key/{key}", web::get().to(get_user_by_key))
        .route("/user/username/{userName}", web::get().to(get_user_by_user_name))
        .route("/user/username/{userName}/check", web::get().to(check_user_name))
        .route(
            "/user/phonenumber/{phoneNumber}",
            web::get().to(get_user_by_phone_number),
        );
}
