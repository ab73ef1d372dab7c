/// Counter handlers - HTTP endpoints for view/rating facts
use super::{validated, PageQuery};
use crate::error::Result;
use crate::limits::counter as limit;
use crate::models::{CreateCounter, TargetType};
use crate::services::CounterService;
use crate::state::AppState;
use crate::validation::{FieldRule, Schema};
use actix_web::{web, HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

static CREATE_COUNTER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(vec![
        FieldRule::object_id("targetId").required(),
        FieldRule::integer("targetType")
            .one_of(TargetType::CODES)
            .required(),
        FieldRule::string("counterField")
            .max_length(limit::COUNTER_FIELD_MAX_LENGTH)
            .trim()
            .required(),
        FieldRule::object_id("userId").required(),
        FieldRule::integer("value").range(limit::VALUE_RANGE),
    ])
});

static BY_TARGET: Lazy<Schema> =
    Lazy::new(|| Schema::new(vec![FieldRule::object_id("targetId").required()]));

static BY_ID: Lazy<Schema> = Lazy::new(|| Schema::new(vec![FieldRule::object_id("id").required()]));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetPath {
    target_id: String,
}

#[derive(Debug, Deserialize)]
struct IdPath {
    id: String,
}

fn service(state: &AppState) -> CounterService {
    CounterService::new(state.store.clone())
}

/// Record a counter fact
pub async fn create_counter(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let input: CreateCounter = validated(&state, &CREATE_COUNTER, &req, Some(body.into_inner()))?;
    service(&state).record(input).await?;
    Ok(HttpResponse::Ok().json(true))
}

pub async fn get_target_counters(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let TargetPath { target_id } = validated(&state, &BY_TARGET, &req, None)?;
    let page = service(&state)
        .list_target_counters(&target_id, query.checked()?)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_counter_by_id(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let IdPath { id } = validated(&state, &BY_ID, &req, None)?;
    let counter = service(&state).get_counter(&id).await?;
    Ok(HttpResponse::Ok().json(counter))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/counter/create", web::put().to(create_counter))
        .route("/counter/target/{targetId}", web::get().to(get_target_counters))
        .route("/counter/id/{id}", web::get().to(get_counter_by_id));
}
