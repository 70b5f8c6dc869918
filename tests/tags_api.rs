mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{TestApp, TestRequest};
use recipe_api::db::{attribute, Tag};

const TAGS_URL: &str = "/api/recipe/tags/";

fn detail_url(id: i64) -> String {
    format!("/api/recipe/tags/{}/", id)
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_auth_required() {
    let app = TestApp::new().await;

    app.send(TestRequest::get(TAGS_URL))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_tags() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    attribute::create::<Tag>(&app.db, user.id, "Vegan").await.unwrap();
    attribute::create::<Tag>(&app.db, user.id, "Dessert").await.unwrap();

    let res = app
        .send(TestRequest::get(TAGS_URL).token(&token))
        .await
        .assert_status(StatusCode::OK);

    let body = res.json();
    assert_eq!(names(&body), vec!["Vegan", "Dessert"]);
    assert!(body[0]["id"].is_i64());
}

#[tokio::test]
async fn test_tags_limited_to_user() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let other = app.create_user("user2@example.com", "testpass123").await;
    attribute::create::<Tag>(&app.db, other.id, "Fruity").await.unwrap();
    let tag = attribute::create::<Tag>(&app.db, user.id, "Comfort Food")
        .await
        .unwrap();

    let res = app
        .send(TestRequest::get(TAGS_URL).token(&token))
        .await
        .assert_status(StatusCode::OK);

    assert_eq!(res.json(), json!([{ "id": tag.id, "name": "Comfort Food" }]));
}

#[tokio::test]
async fn test_retrieve_single_tag() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let tag = attribute::create::<Tag>(&app.db, user.id, "Dinner").await.unwrap();

    let res = app
        .send(TestRequest::get(&detail_url(tag.id)).token(&token))
        .await
        .assert_status(StatusCode::OK);

    assert_eq!(res.json()["name"], "Dinner");
}

#[tokio::test]
async fn test_other_users_tag_is_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.authenticated_user("user@example.com").await;
    let other = app.create_user("user2@example.com", "testpass123").await;
    let tag = attribute::create::<Tag>(&app.db, other.id, "Private").await.unwrap();

    app.send(TestRequest::get(&detail_url(tag.id)).token(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.send(TestRequest::delete(&detail_url(tag.id)).token(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert!(attribute::exists::<Tag>(&app.db, tag.id).await.unwrap());
}

#[tokio::test]
async fn test_update_tag() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let tag = attribute::create::<Tag>(&app.db, user.id, "After Dinner")
        .await
        .unwrap();

    let res = app
        .send(
            TestRequest::patch(&detail_url(tag.id))
                .token(&token)
                .json(&json!({ "name": "Dessert" })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(res.json()["name"], "Dessert");

    let tag: Tag = attribute::get_for_user(&app.db, tag.id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tag.name, "Dessert");
}

#[tokio::test]
async fn test_update_tag_blank_name_rejected() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let tag = attribute::create::<Tag>(&app.db, user.id, "Lunch").await.unwrap();

    app.send(
        TestRequest::patch(&detail_url(tag.id))
            .token(&token)
            .json(&json!({ "name": "  " })),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_tag() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let tag = attribute::create::<Tag>(&app.db, user.id, "Breakfast")
        .await
        .unwrap();

    app.send(TestRequest::delete(&detail_url(tag.id)).token(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert!(!attribute::exists::<Tag>(&app.db, tag.id).await.unwrap());
}

#[tokio::test]
async fn test_deleting_tag_unlinks_it_from_recipes() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let tag = attribute::create::<Tag>(&app.db, user.id, "Breakfast")
        .await
        .unwrap();
    let recipe = app.create_recipe(&user, "Porridge").await;
    recipe.add_tag(&app.db, &tag).await.unwrap();

    app.send(TestRequest::delete(&detail_url(tag.id)).token(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let res = app
        .send(TestRequest::get(&format!("/api/recipe/recipes/{}/", recipe.id)).token(&token))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(res.json()["tags"], json!([]));
}

#[tokio::test]
async fn test_filter_tags_assigned_to_recipes() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let tag1 = attribute::create::<Tag>(&app.db, user.id, "Breakfast")
        .await
        .unwrap();
    attribute::create::<Tag>(&app.db, user.id, "Lunch").await.unwrap();
    let recipe = app.create_recipe(&user, "Green Eggs on Toast").await;
    recipe.add_tag(&app.db, &tag1).await.unwrap();

    let res = app
        .send(TestRequest::get(&format!("{}?assigned_only=1", TAGS_URL)).token(&token))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(names(&res.json()), vec!["Breakfast"]);

    let res = app
        .send(TestRequest::get(&format!("{}?assigned_only=0", TAGS_URL)).token(&token))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(names(&res.json()), vec!["Lunch", "Breakfast"]);
}

#[tokio::test]
async fn test_filtered_tags_unique() {
    let app = TestApp::new().await;
    let (user, token) = app.authenticated_user("user@example.com").await;
    let tag = attribute::create::<Tag>(&app.db, user.id, "Breakfast")
        .await
        .unwrap();
    attribute::create::<Tag>(&app.db, user.id, "Dinner").await.unwrap();
    let recipe1 = app.create_recipe(&user, "Pancakes").await;
    let recipe2 = app.create_recipe(&user, "Porridge").await;
    recipe1.add_tag(&app.db, &tag).await.unwrap();
    recipe2.add_tag(&app.db, &tag).await.unwrap();

    let res = app
        .send(TestRequest::get(&format!("{}?assigned_only=1", TAGS_URL)).token(&token))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(names(&res.json()), vec!["Breakfast"]);
}

#[tokio::test]
async fn test_assigned_only_must_be_integer() {
    let app = TestApp::new().await;
    let (_, token) = app.authenticated_user("user@example.com").await;

    let res = app
        .send(TestRequest::get(&format!("{}?assigned_only=yes", TAGS_URL)).token(&token))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert!(res.json()["error"]["details"]["assigned_only"].is_array());
}
