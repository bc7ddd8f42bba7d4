use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use bistro::config::Config;
use bistro::services::MemoryMailer;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "Secret1!";

fn assert_price(value: &Value, expected: f64) {
    let actual = value.as_f64().expect("price is not a number");
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

struct TestApp {
    router: Router,
    mailer: Arc<MemoryMailer>,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.observability.metrics_enabled = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> TestApp {
    let mailer = Arc::new(MemoryMailer::new());
    let state = bistro::api::create_app_state_with_mailer(test_config(), mailer.clone())
        .await
        .expect("Failed to create app state");

    TestApp {
        router: bistro::api::router(state).await,
        mailer,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, email: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": PASSWORD })),
        )
        .await
    }

    /// Path and query of the confirmation link mailed to `email`.
    fn confirmation_path(&self, email: &str) -> String {
        let mail = self.mailer.last_to(email).expect("no confirmation email");
        assert_eq!(mail.subject, "Confirm your email");

        let link = mail
            .body
            .split_whitespace()
            .find(|word| word.starts_with("http"))
            .expect("no link in email");
        let url = url::Url::parse(link).unwrap();
        format!("{}?{}", url.path(), url.query().unwrap())
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn signed_in_user(&self, email: &str) -> String {
        let (status, _) = self.register(email).await;
        assert_eq!(status, StatusCode::CREATED);

        let path = self.confirmation_path(email);
        let (status, _) = self.call("GET", &path, None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_controller_and_health() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Test controller is working!");

    let (status, body) = app.call("GET", "/api/system/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], true);

    let (status, _) = app.call("GET", "/api/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_seeded_catalog() {
    let app = spawn_app().await;

    let (status, body) = app.call("GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories.len(), 8);
    assert_eq!(categories[0]["name"], "Salads");
    assert_eq!(categories[7]["name"], "OnTheSide");

    let (status, body) = app.call("GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let products = body["data"].as_array().unwrap();
    assert_eq!(products.len(), 4);
    assert_eq!(products[0]["name"], "Caesar Salad");
    assert_price(&products[0]["price"], 12.99);

    let (status, body) = app.call("GET", "/api/dish/3", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Kung Pao Chicken");
    assert_eq!(body["data"]["contains_nuts"], true);

    let (status, body) = app.call("GET", "/api/products/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = app.call("GET", "/api/categories/42", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_filters() {
    let app = spawn_app().await;

    let (status, body) = app
        .call(
            "GET",
            "/api/products?is_vegetarian=true&max_spiciness=1",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let products = body["data"].as_array().unwrap();
    assert!(!products.is_empty());
    for product in products {
        assert_eq!(product["is_vegetarian"], true);
        assert!(product["spiciness"].as_i64().unwrap() <= 1);
    }

    let (_, body) = app
        .call("GET", "/api/products/filtered?nuts=true", None, None)
        .await;
    let products = body["data"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Kung Pao Chicken");

    let (_, body) = app
        .call("GET", "/api/products?category_id=2&spiciness=2", None, None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .call(
            "GET",
            "/api/products?min_spiciness=3&max_spiciness=1",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("GET", "/api/products?spiciness=9", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_and_login_flow() {
    let app = spawn_app().await;
    let email = "alice@example.com";

    let (status, body) = app.register("  Alice@Example.com ").await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["data"]["user_id"].as_str().unwrap().to_string();

    let (status, body) = app.login(email, PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Email not confirmed");

    let (status, _) = app.register(email).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            "GET",
            &format!("/api/auth/confirm-email?user_id={user_id}&token=deadbeef"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Error confirming email");

    let (status, _) = app
        .call("GET", "/api/auth/confirm-email?token=abc", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let path = app.confirmation_path(email);
    assert!(path.contains(&user_id));
    let (status, _) = app.call("GET", &path, None, None).await;
    assert_eq!(status, StatusCode::OK);

    // Tokens are single use
    let (status, _) = app.call("GET", &path, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.login(email, "Wrong1!pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app.login("nobody@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app.login(email, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    let token = body["data"]["token"].as_str().unwrap();

    let (status, body) = app.call("GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["id"], user_id.as_str());
    assert_eq!(body["data"]["email_confirmed"], true);
}

#[tokio::test]
async fn test_registration_validation() {
    let app = spawn_app().await;

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "bob@example.com", "password": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("at least 6"));
    assert!(error.contains("digit"));

    let (status, _) = app.register("not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_registration_is_rolled_back_when_mail_fails() {
    let app = spawn_app().await;
    let email = "carol@example.com";

    app.mailer.set_failing(true);
    let (status, _) = app.register(email).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    app.mailer.set_failing(false);
    let (status, _) = app.register(email).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;

    let (status, _) = app.call("GET", "/api/basket", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("GET", "/api/basket", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            "POST",
            "/api/basket",
            None,
            Some(json!({ "product_id": 1, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("DELETE", "/api/products/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_basket_merges_repeated_adds() {
    let app = spawn_app().await;
    let token = app.signed_in_user("dave@example.com").await;

    let (status, first) = app
        .call(
            "POST",
            "/api/basket",
            Some(&token),
            Some(json!({ "product_id": 1, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["quantity"], 2);

    let (status, second) = app
        .call(
            "POST",
            "/api/basket",
            Some(&token),
            Some(json!({ "product_id": 1, "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["quantity"], 5);
    assert_eq!(second["data"]["id"], first["data"]["id"]);

    let (status, body) = app.call("GET", "/api/basket", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let lines = body["data"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 5);
    assert_eq!(lines[0]["product"]["name"], "Caesar Salad");
}

#[tokio::test]
async fn test_basket_add_validation() {
    let app = spawn_app().await;
    let token = app.signed_in_user("erin@example.com").await;

    for body in [
        json!({ "product_id": 1, "quantity": 0 }),
        json!({ "product_id": 1, "quantity": -2 }),
        json!({ "quantity": 1 }),
        json!({ "product_id": 1 }),
        json!({ "product_id": 1, "quantity": 3_000_000_000_i64 }),
        json!({ "product_id": "one", "quantity": 1 }),
    ] {
        let (status, response) = app
            .call("POST", "/api/basket", Some(&token), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], json!(false));
        assert!(response["error"].is_string());
    }

    let (status, _) = app
        .call(
            "POST",
            "/api/basket",
            Some(&token),
            Some(json!({ "product_id": 999, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.call("GET", "/api/basket", Some(&token), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_basket_items_are_private() {
    let app = spawn_app().await;
    let owner = app.signed_in_user("frank@example.com").await;
    let other = app.signed_in_user("grace@example.com").await;

    let (_, body) = app
        .call(
            "POST",
            "/api/basket",
            Some(&owner),
            Some(json!({ "product_id": 2, "quantity": 1 })),
        )
        .await;
    let item_id = body["data"]["id"].as_i64().unwrap();
    let item_path = format!("/api/basket/{item_id}");

    let (status, _) = app
        .call("PUT", &item_path, Some(&other), Some(json!({ "quantity": 9 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("DELETE", &item_path, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.call("GET", "/api/basket", Some(&other), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, body) = app
        .call("PUT", &item_path, Some(&owner), Some(json!({ "quantity": 7 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 7);

    let (status, _) = app
        .call("PUT", &item_path, Some(&owner), Some(json!({ "quantity": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("DELETE", &item_path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("DELETE", &item_path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_admin() {
    let app = spawn_app().await;
    let token = app.signed_in_user("admin@example.com").await;

    let new_product = json!({
        "name": "Mango Sticky Rice",
        "price": 6.5,
        "spiciness": 0,
        "vegeterian": true,
        "category_id": 7
    });

    let (status, _) = app
        .call("POST", "/api/products", None, Some(new_product.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call("POST", "/api/dish/add", Some(&token), Some(new_product))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_vegetarian"], true);
    assert_price(&body["data"]["price"], 6.5);
    let id = body["data"]["id"].as_i64().unwrap();
    let path = format!("/api/products/{id}");

    let (status, _) = app
        .call(
            "PUT",
            &path,
            Some(&token),
            Some(json!({ "id": id + 1, "name": "X", "price": 1, "category_id": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            "PUT",
            &path,
            Some(&token),
            Some(json!({ "name": "X", "price": 1, "category_id": 99 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            "PUT",
            &path,
            Some(&token),
            Some(json!({
                "id": id,
                "name": "Mango Sticky Rice",
                "price": 7.25,
                "spiciness": 1,
                "is_vegetarian": true,
                "category_id": 7
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_price(&body["data"]["price"], 7.25);
    assert_eq!(body["data"]["spiciness"], 1);

    let (status, _) = app
        .call(
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Bad", "price": 1.999, "category_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting a product removes it from baskets too
    app.call(
        "POST",
        "/api/basket",
        Some(&token),
        Some(json!({ "product_id": id, "quantity": 2 })),
    )
    .await;
    let (status, _) = app.call("DELETE", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.call("GET", "/api/basket", Some(&token), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let (status, _) = app.call("DELETE", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_admin() {
    let app = spawn_app().await;
    let token = app.signed_in_user("chef@example.com").await;

    let (status, _) = app
        .call(
            "POST",
            "/api/categories",
            Some(&token),
            Some(json!({ "name": "Desserts" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "POST",
            "/api/categories",
            Some(&token),
            Some(json!({ "name": "soups" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Soups");
    let id = body["data"]["id"].as_i64().unwrap();
    let path = format!("/api/categories/{id}");

    let (status, _) = app
        .call(
            "PUT",
            &path,
            Some(&token),
            Some(json!({ "id": 1, "name": "OnTheSide" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            "PUT",
            &path,
            Some(&token),
            Some(json!({ "id": id, "name": "OnTheSide" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "OnTheSide");

    // Seeded category 1 still holds the Caesar Salad
    let (status, _) = app
        .call("DELETE", "/api/categories/1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.call("DELETE", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("GET", &path, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
