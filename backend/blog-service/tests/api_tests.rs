//! HTTP-level tests for the blog API over the in-memory store.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use blog_service::{handlers, AppState};
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

macro_rules! blog_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::in_memory()))
                .configure(handlers::configure),
        )
        .await
    };
}

fn new_user(user_name: &str, phone_number: &str) -> Value {
    json!({
        "userName": user_name,
        "displayName": "Blog Writer",
        "phoneNumber": phone_number,
        "password": "correct-horse",
    })
}

fn create_user_request(user_name: &str, phone_number: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/user/create")
        .set_json(new_user(user_name, phone_number))
}

fn user_by_name_request(user_name: &str) -> test::TestRequest {
    test::TestRequest::get().uri(&format!("/api/user/username/{}", user_name))
}

#[actix_web::test]
async fn test_create_user_and_reject_taken_user_name() {
    let app = blog_app!();

    let resp = test::call_service(
        &app,
        create_user_request("writer.one", "09121234567").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created, json!(true));

    let resp = test::call_service(
        &app,
        create_user_request("writer.one", "09127654321").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 422);
    assert_eq!(body["code"], "usernameAlreadyTaken");

    let taken: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/user/username/writer.one/check")
            .to_request(),
    )
    .await;
    assert_eq!(taken, json!(true));
}

#[actix_web::test]
async fn test_invalid_user_name_is_bad_request() {
    let app = blog_app!();

    let resp = test::call_service(
        &app,
        create_user_request("..bad", "09121234567").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["code"], "badRequest");
    assert!(body["message"].as_str().unwrap().contains("userName"));
}

#[actix_web::test]
async fn test_phone_number_is_stored_in_canonical_form() {
    let app = blog_app!();

    let resp = test::call_service(
        &app,
        create_user_request("phone.owner", "0912 123 4567").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let user: Value =
        test::call_and_read_body_json(&app, user_by_name_request("phone.owner").to_request())
            .await;
    assert_eq!(user["phoneNumber"], "+989121234567");
    assert!(user.get("password").is_none());

    let found: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/user/phonenumber/09121234567")
            .to_request(),
    )
    .await;
    assert_eq!(found["userName"], "phone.owner");
}

#[actix_web::test]
async fn test_delete_missing_user_is_not_found() {
    let app = blog_app!();

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/user/{}", ObjectId::new().to_hex()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "userNotFound");
}

#[actix_web::test]
async fn test_comment_on_missing_post_is_not_found() {
    let app = blog_app!();

    test::call_service(
        &app,
        create_user_request("commenter", "09121234567").to_request(),
    )
    .await;
    let user: Value =
        test::call_and_read_body_json(&app, user_by_name_request("commenter").to_request()).await;
    let user_id = user["id"].as_str().unwrap();
    let missing_post = ObjectId::new().to_hex();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/comment/create/{}/{}", missing_post, user_id))
            .set_json(json!({ "content": "into the void" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "postNotFound");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/comment/all/{}", missing_post))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_only_the_author_can_edit_a_post() {
    let app = blog_app!();

    for (name, phone) in [("author", "09121111111"), ("intruder", "09122222222")] {
        let resp = test::call_service(&app, create_user_request(name, phone).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let author: Value =
        test::call_and_read_body_json(&app, user_by_name_request("author").to_request()).await;
    let intruder: Value =
        test::call_and_read_body_json(&app, user_by_name_request("intruder").to_request()).await;

    let post: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/post/create/{}", author["id"].as_str().unwrap()))
            .set_json(json!({ "content": "original words", "category": "essays" }))
            .to_request(),
    )
    .await;
    let post_id = post["id"].as_str().unwrap();
    assert_eq!(post["likesCount"], 0);
    assert_eq!(post["commentsCount"], 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!(
                "/api/post/{}/{}",
                post_id,
                intruder["id"].as_str().unwrap()
            ))
            .set_json(json!({ "content": "hijacked" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "permissionDenied");

    let stored: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/post/id/{}", post_id))
            .to_request(),
    )
    .await;
    assert_eq!(stored["content"], "original words");
}

#[actix_web::test]
async fn test_likes_accumulate() {
    let app = blog_app!();

    test::call_service(&app, create_user_request("liked", "09121234567").to_request()).await;
    let user: Value =
        test::call_and_read_body_json(&app, user_by_name_request("liked").to_request()).await;
    let post: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/post/create/{}", user["id"].as_str().unwrap()))
            .set_json(json!({ "content": "like me", "category": "misc" }))
            .to_request(),
    )
    .await;
    let like_uri = format!("/api/post/like/{}", post["id"].as_str().unwrap());

    let mut totals = Vec::new();
    for _ in 0..3 {
        let total: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(&like_uri).to_request(),
        )
        .await;
        totals.push(total["total"].clone());
    }
    assert_eq!(totals, vec![json!(1), json!(2), json!(3)]);
}

#[actix_web::test]
async fn test_post_listing_pages_and_joins_author() {
    let app = blog_app!();

    test::call_service(&app, create_user_request("prolific", "09121234567").to_request()).await;
    let user: Value =
        test::call_and_read_body_json(&app, user_by_name_request("prolific").to_request()).await;
    let create_uri = format!("/api/post/create/{}", user["id"].as_str().unwrap());

    for n in 0..12 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&create_uri)
                .set_json(json!({ "content": format!("post {}", n), "category": "daily" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let first: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/post/all").to_request(),
    )
    .await;
    assert_eq!(first["data"].as_array().unwrap().len(), 10);
    assert_eq!(first["meta"]["totalCount"], 12);
    assert_eq!(first["meta"]["itemsPerPage"], 10);
    assert_eq!(first["meta"]["currentPage"], 0);
    assert_eq!(first["meta"]["nextPage"], 1);
    assert!(first["meta"]["previousPage"].is_null());
    assert_eq!(first["data"][0]["author"][0]["userName"], "prolific");
    assert!(first["data"][0]["id"].is_string());

    let second: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/post/all?page=1").to_request(),
    )
    .await;
    assert_eq!(second["data"].as_array().unwrap().len(), 2);
    assert_eq!(second["meta"]["previousPage"], 0);
    assert!(second["meta"]["nextPage"].is_null());
}

#[actix_web::test]
async fn test_counter_lifecycle() {
    let app = blog_app!();
    let target_id = ObjectId::new().to_hex();

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/counter/create")
            .set_json(json!({
                "targetId": target_id,
                "targetType": 2,
                "counterField": "views",
                "userId": ObjectId::new().to_hex(),
                "value": 1,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let listed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/counter/target/{}", target_id))
            .to_request(),
    )
    .await;
    assert_eq!(listed["meta"]["totalCount"], 1);
    let counter_id = listed["data"][0]["id"].as_str().unwrap().to_string();

    let counter: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/counter/id/{}", counter_id))
            .to_request(),
    )
    .await;
    assert_eq!(counter["counterField"], "views");
    assert_eq!(counter["targetType"], 2);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/counter/id/{}", ObjectId::new().to_hex()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "counterNotFound");
}

#[actix_web::test]
async fn test_unknown_target_type_is_rejected() {
    let app = blog_app!();

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/counter/create")
            .set_json(json!({
                "targetId": ObjectId::new().to_hex(),
                "targetType": 9,
                "counterField": "views",
                "userId": ObjectId::new().to_hex(),
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let app = blog_app!();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/user/create")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"userName\": ")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "badRequest");
}

#[actix_web::test]
async fn test_health_endpoints() {
    let app = blog_app!();

    let live: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/health/live").to_request(),
    )
    .await;
    assert_eq!(live, json!({ "alive": true }));

    let health: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/health").to_request(),
    )
    .await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["service"], "blog-service");
}

#[actix_web::test]
async fn test_page_beyond_addressable_range_is_bad_request() {
    let app = blog_app!();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/post/all?page=18446744073709551615")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "badRequest");
}

#[actix_web::test]
async fn test_initial_likes_count_is_bounded() {
    let app = blog_app!();

    test::call_service(&app, create_user_request("bounded", "09121234567").to_request()).await;
    let user: Value =
        test::call_and_read_body_json(&app, user_by_name_request("bounded").to_request()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/post/create/{}", user["id"].as_str().unwrap()))
            .set_json(json!({
                "content": "inflated",
                "category": "misc",
                "likesCount": i64::MAX,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_comment_routes_enforce_authorship() {
    let app = blog_app!();

    for (name, phone) in [("poster", "09121111111"), ("stranger", "09122222222")] {
        let resp = test::call_service(&app, create_user_request(name, phone).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let poster: Value =
        test::call_and_read_body_json(&app, user_by_name_request("poster").to_request()).await;
    let stranger: Value =
        test::call_and_read_body_json(&app, user_by_name_request("stranger").to_request()).await;
    let poster_id = poster["id"].as_str().unwrap();
    let stranger_id = stranger["id"].as_str().unwrap();

    let post: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/post/create/{}", poster_id))
            .set_json(json!({ "content": "discuss", "category": "talk" }))
            .to_request(),
    )
    .await;
    let post_id = post["id"].as_str().unwrap();

    let comment: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/comment/create/{}/{}", post_id, poster_id))
            .set_json(json!({ "content": "first!" }))
            .to_request(),
    )
    .await;
    let comment_id = comment["id"].as_str().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/comment/{}/{}", comment_id, stranger_id))
            .set_json(json!({ "content": "not yours" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "forbiddenAccess");

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/comment/{}/{}", comment_id, stranger_id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let like: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/comment/like/{}", comment_id))
            .to_request(),
    )
    .await;
    assert_eq!(like, json!({ "total": 1 }));

    let edited: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/comment/{}/{}", comment_id, poster_id))
            .set_json(json!({ "content": "edited" }))
            .to_request(),
    )
    .await;
    assert_eq!(edited, json!(true));

    let listed: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/comment/all/{}", post_id))
            .to_request(),
    )
    .await;
    assert_eq!(listed["meta"]["totalCount"], 1);
    assert_eq!(listed["data"][0]["content"], "edited");
    assert_eq!(listed["data"][0]["likesCount"], 1);

    let deleted: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/comment/{}/{}", comment_id, poster_id))
            .to_request(),
    )
    .await;
    assert_eq!(deleted, json!(true));

    let stored_post: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/post/id/{}", post_id))
            .to_request(),
    )
    .await;
    assert_eq!(stored_post["commentsCount"], 0);
}

#[actix_web::test]
async fn test_edit_user_profile() {
    let app = blog_app!();

    for (name, phone) in [("editor", "09121111111"), ("occupied", "09122222222")] {
        let resp = test::call_service(&app, create_user_request(name, phone).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let user: Value =
        test::call_and_read_body_json(&app, user_by_name_request("editor").to_request()).await;
    let edit_uri = format!("/api/user/{}", user["id"].as_str().unwrap());

    let edited: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri(&edit_uri)
            .set_json(json!({ "displayName": "Renamed Writer" }))
            .to_request(),
    )
    .await;
    assert_eq!(edited, json!(true));

    let reloaded: Value =
        test::call_and_read_body_json(&app, user_by_name_request("editor").to_request()).await;
    assert_eq!(reloaded["displayName"], "Renamed Writer");

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&edit_uri)
            .set_json(json!({ "userName": "occupied" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
