//! Integration tests for the API server.

use std::sync::OnceLock;

use api::routes::orders::AppState;
use auth::{Role, TokenConfig, TokenService};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Datelike, Duration, Utc};
use common::{ProductId, UserId};
use domain::{Money, NewOrder, Order, OrderLine, Product, UserProfile};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryStore, OrderStore, ProductStore, UserStore};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with_state() -> (Router, AppState<MemoryStore>) {
    let tokens = TokenService::new(&TokenConfig::new("test-access", "test-refresh"));
    let state = api::create_state(MemoryStore::new(), tokens);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

fn setup() -> Router {
    setup_with_state().0
}

fn bearer(state: &AppState<MemoryStore>, user: UserId, role: Role) -> String {
    let token = state.tokens.issue_access(user, role).unwrap();
    format!("Bearer {token}")
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn order_payload(product: ProductId, quantity: u32, total_cents: i64) -> serde_json::Value {
    serde_json::json!({
        "orderItems": [{ "product": product, "quantity": quantity, "price": total_cents }],
        "shippingInfo": { "city": "Hanoi" },
        "paymentInfo": { "method": "card" },
        "itemsPrice": total_cents,
        "taxPrice": 0,
        "shippingPrice": 0,
        "totalPrice": total_cents
    })
}

async fn seed_product(state: &AppState<MemoryStore>, price_cents: i64, stock: u32) -> Product {
    let product = Product::new("Widget", Money::from_cents(price_cents), stock);
    state.manager.store().insert_product(&product).await.unwrap();
    product
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_create_order_requires_token() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/order/new",
            None,
            order_payload(ProductId::new(), 1, 1000),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_fetch_order() {
    let (app, state) = setup_with_state();
    let user = UserId::new();
    let auth = bearer(&state, user, Role::Customer);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/order/new",
            Some(&auth),
            order_payload(ProductId::new(), 2, 2000),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["order"]["orderStatus"], "Processing");
    assert_eq!(created["order"]["totalPrice"], 2000);
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!("/api/v1/order/{order_id}"), Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["order"]["id"], order_id.as_str());
    assert_eq!(fetched["order"]["orderItems"][0]["quantity"], 2);
    assert!(fetched["order"]["paidAt"].as_str().is_some());
}

#[tokio::test]
async fn test_fetch_order_projects_owner_identity() {
    let (app, state) = setup_with_state();
    let user = UserId::new();
    let auth = bearer(&state, user, Role::Customer);
    state
        .manager
        .store()
        .upsert_profile(&UserProfile::new(user, "An Nguyen", "an@example.com"))
        .await
        .unwrap();

    let created = body_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/order/new",
                Some(&auth),
                order_payload(ProductId::new(), 1, 500),
            ))
            .await
            .unwrap(),
    )
    .await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    let fetched = body_json(
        app.oneshot(get_request(&format!("/api/v1/order/{order_id}"), Some(&auth)))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(fetched["order"]["user"]["name"], "An Nguyen");
    assert_eq!(fetched["order"]["user"]["email"], "an@example.com");
}

#[tokio::test]
async fn test_fetch_missing_order_is_404() {
    let (app, state) = setup_with_state();
    let auth = bearer(&state, UserId::new(), Role::Customer);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/order/{}", uuid::Uuid::new_v4()),
            Some(&auth),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_my_orders_only_returns_callers_orders() {
    let (app, state) = setup_with_state();
    let user = UserId::new();
    let auth = bearer(&state, user, Role::Customer);
    let other_auth = bearer(&state, UserId::new(), Role::Customer);

    for (auth, cents) in [(&auth, 100), (&other_auth, 200), (&auth, 300)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/order/new",
                Some(auth),
                order_payload(ProductId::new(), 1, cents),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = body_json(
        app.oneshot(get_request("/api/v1/orders/me", Some(&auth)))
            .await
            .unwrap(),
    )
    .await;

    let orders = json["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["totalPrice"], 100);
    assert_eq!(orders[1]["totalPrice"], 300);
}

#[tokio::test]
async fn test_admin_orders_requires_admin_role() {
    let (app, state) = setup_with_state();
    let auth = bearer(&state, UserId::new(), Role::Customer);

    let response = app
        .oneshot(get_request("/api/v1/admin/orders", Some(&auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_orders_sums_total_amount() {
    let (app, state) = setup_with_state();
    let customer = bearer(&state, UserId::new(), Role::Customer);
    let admin = bearer(&state, UserId::new(), Role::Admin);

    for cents in [100, 200, 50] {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/order/new",
                Some(&customer),
                order_payload(ProductId::new(), 1, cents),
            ))
            .await
            .unwrap();
    }

    let json = body_json(
        app.oneshot(get_request("/api/v1/admin/orders", Some(&admin)))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(json["success"], true);
    assert_eq!(json["totalAmount"], 350);
    assert_eq!(json["orders"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_status_update_decrements_stock_and_terminal_is_immutable() {
    let (app, state) = setup_with_state();
    let customer = bearer(&state, UserId::new(), Role::Customer);
    let admin = bearer(&state, UserId::new(), Role::Admin);
    let product = seed_product(&state, 1000, 5).await;

    let created = body_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/order/new",
                Some(&customer),
                order_payload(product.id, 2, 2000),
            ))
            .await
            .unwrap(),
    )
    .await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/admin/order/{order_id}");

    // Processing -> Shipped consumes stock.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&admin),
            serde_json::json!({ "status": "Shipped" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        state
            .manager
            .store()
            .get_product(product.id)
            .await
            .unwrap()
            .unwrap()
            .stock,
        3
    );

    // Shipped -> Delivered.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&admin),
            serde_json::json!({ "status": "Delivered" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Terminal order rejects any further transition, stock untouched.
    let response = app
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&admin),
            serde_json::json!({ "status": "Delivered" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        state
            .manager
            .store()
            .get_product(product.id)
            .await
            .unwrap()
            .unwrap()
            .stock,
        1
    );
}

#[tokio::test]
async fn test_status_update_rejects_unknown_status_string() {
    let (app, state) = setup_with_state();
    let admin = bearer(&state, UserId::new(), Role::Admin);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/admin/order/{}", uuid::Uuid::new_v4()),
            Some(&admin),
            serde_json::json!({ "status": "Teleported" }),
        ))
        .await
        .unwrap();

    // Typed status parsing rejects the body before any lookup happens.
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_status_update_missing_order_is_404() {
    let (app, state) = setup_with_state();
    let admin = bearer(&state, UserId::new(), Role::Admin);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/v1/admin/order/{}", uuid::Uuid::new_v4()),
            Some(&admin),
            serde_json::json!({ "status": "Shipped" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_add_merges_quantities() {
    let (app, state) = setup_with_state();
    let user = UserId::new();
    let auth = bearer(&state, user, Role::Customer);
    let product = seed_product(&state, 1000, 10).await;

    for quantity in [2, 3] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart",
                Some(&auth),
                serde_json::json!({ "productId": product.id, "quantity": quantity }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["message"].as_str().is_some());
    }

    let cart = state
        .manager
        .store()
        .find_open_cart(user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cart.cart.len(), 1);
    assert_eq!(cart.cart[0].quantity, 5);
    assert_eq!(cart.cart[0].price, Money::from_cents(1000));
}

#[tokio::test]
async fn test_cart_add_missing_product_is_404() {
    let (app, state) = setup_with_state();
    let user = UserId::new();
    let auth = bearer(&state, user, Role::Customer);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/cart",
            Some(&auth),
            serde_json::json!({ "productId": uuid::Uuid::new_v4(), "quantity": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.manager.store().order_count().await, 0);
}

#[tokio::test]
async fn test_income_report_groups_by_month() {
    let (app, state) = setup_with_state();
    let admin = bearer(&state, UserId::new(), Role::Admin);
    let user = UserId::new();

    let backdated = |cents: i64, days_ago: i64| {
        let mut order = Order::checkout(
            user,
            NewOrder {
                order_items: vec![OrderLine::new(ProductId::new(), 1, Money::from_cents(cents))],
                shipping_info: serde_json::Value::Null,
                payment_info: serde_json::Value::Null,
                items_price: Money::from_cents(cents),
                tax_price: Money::zero(),
                shipping_price: Money::zero(),
                total_price: Money::from_cents(cents),
            },
        )
        .unwrap();
        order.created_at = Utc::now() - Duration::days(days_ago);
        order
    };

    let a = backdated(100, 40);
    let b = backdated(200, 40);
    let c = backdated(50, 0);
    for order in [&a, &b, &c] {
        state.manager.store().insert_order(order).await.unwrap();
    }

    let json = body_json(
        app.oneshot(get_request("/api/v1/admin/income", Some(&admin)))
            .await
            .unwrap(),
    )
    .await;

    let report = json.as_array().unwrap();
    assert_eq!(report.len(), 2);
    let total_for = |month: u32| {
        report
            .iter()
            .find(|r| r["month"] == month)
            .map(|r| r["total"].as_i64().unwrap())
    };
    assert_eq!(total_for(a.created_at.month()), Some(300));
    assert_eq!(total_for(c.created_at.month()), Some(50));
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let (app, state) = setup_with_state();
    let user = UserId::new();
    let pair = state.tokens.issue_pair(user, Role::Customer).unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/refresh",
            None,
            serde_json::json!({ "refreshToken": pair.refresh_token }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let access = json["accessToken"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(
            "/api/v1/orders/me",
            Some(&format!("Bearer {access}")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (app, state) = setup_with_state();
    let pair = state
        .tokens
        .issue_pair(UserId::new(), Role::Customer)
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/refresh",
            None,
            serde_json::json!({ "refreshToken": pair.access_token }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_crud_flow() {
    let (app, state) = setup_with_state();
    let admin = bearer(&state, UserId::new(), Role::Admin);
    let customer = bearer(&state, UserId::new(), Role::Customer);

    // Create (admin only).
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            Some(&customer),
            serde_json::json!({ "name": "Widget", "price": 1000, "stock": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let created = body_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/products",
                Some(&admin),
                serde_json::json!({ "name": "Widget", "price": 1000, "stock": 5 }),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(created["success"], true);
    let product_id = created["product"]["id"].as_str().unwrap().to_string();

    // List as an authenticated customer.
    let listed = body_json(
        app.clone()
            .oneshot(get_request("/api/v1/products", Some(&customer)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listed["products"].as_array().unwrap().len(), 1);

    // Partial update.
    let updated = body_json(
        app.clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/v1/products/{product_id}"),
                Some(&admin),
                serde_json::json!({ "stock": 12 }),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(updated["product"]["stock"], 12);
    assert_eq!(updated["product"]["name"], "Widget");

    // Delete, then the lookup 404s.
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/v1/products/{product_id}"),
            Some(&admin),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/products/{product_id}"),
            Some(&customer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
