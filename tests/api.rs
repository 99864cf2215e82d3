use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use elecxo_commerce::{router, AppState, Config, Seed};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

fn app() -> Router {
    let config = Config { payment_delay: Duration::ZERO, ..Config::default() };
    router(AppState::new(&config, Seed::bundled().unwrap()).unwrap())
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder.header("content-type", "application/json").body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn amount(value: &Value) -> f64 { value["amount"].as_str().unwrap().parse().unwrap() }

#[tokio::test]
async fn health_check() {
    let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (status, body) = send(&app(), Method::GET, "/api/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn storefront_filters_and_sorts() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/products?category=audio&sort=price_asc", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert!(!data.is_empty());
    assert!(data.iter().all(|p| p["category_id"] == "audio"));
    assert!(data.iter().all(|p| p.get("cost_price").is_none()));
    let prices: Vec<f64> = data.iter().map(|p| amount(&p["price"])).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    let (_, body) = send(&app, Method::GET, "/api/v1/products?in_stock=true&per_page=100", None, None).await;
    assert!(body["data"].as_array().unwrap().iter().all(|p| p["stock"].as_u64().unwrap() > 0));
}

#[tokio::test]
async fn variant_quote_adds_deltas() {
    let (status, body) = send(&app(), Method::POST, "/api/v1/products/p-iphone-15-pro/quote", None, Some(json!({ "storage": "256gb" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["unit_price"]), 1099.0);
    assert_eq!(body["selection"]["color"], "Natural Titanium");
}

#[tokio::test]
async fn admin_routes_require_a_known_user() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/v1/admin/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/api/v1/admin/dashboard", Some("u-ghost"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&app, Method::GET, "/api/v1/admin/dashboard", Some("u-viewer"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["total_orders"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn role_changes_need_permission_and_level() {
    let app = app();
    let role = Some(json!({ "role": "admin" }));
    let (status, _) = send(&app, Method::PUT, "/api/v1/admin/users/u-viewer/role", Some("u-manager"), role.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, Method::PUT, "/api/v1/admin/users/u-viewer/role", Some("u-admin"), role).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn staff_cannot_delete_orders() {
    let app = app();
    let (status, _) = send(&app, Method::DELETE, "/api/v1/admin/orders/o-1004", Some("u-staff"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, Method::POST, "/api/v1/admin/orders/o-1004/status", Some("u-staff"), Some(json!({ "status": "delivered" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("pending"));
}

fn checkout_form(email: &str) -> Value {
    json!({
        "customer": { "first_name": "Sok", "last_name": "Dara", "email": email, "phone": "012345678" },
        "shipping_address": { "street": "1 Street 51", "city": "Phnom Penh", "postal_code": "12000", "country": "Cambodia" },
        "shipping_method": "standard"
    })
}

#[tokio::test]
async fn checkout_rejects_invalid_form() {
    let app = app();
    send(&app, Method::POST, "/api/v1/cart/s-bad", None, Some(json!({ "product_id": "p-usb-c-cable" }))).await;
    let (status, body) = send(&app, Method::POST, "/api/v1/checkout/s-bad", None, Some(checkout_form("not-an-email"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"].is_object());
}

#[tokio::test]
async fn cart_to_paid_order() {
    let app = app();
    let (status, cart) = send(&app, Method::POST, "/api/v1/cart/s-1", None, Some(json!({ "product_id": "p-usb-c-cable", "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(amount(&cart["subtotal"]), 39.98);

    let (status, data) = send(&app, Method::POST, "/api/v1/checkout/s-1", None, Some(checkout_form("dara@example.com"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&data["totals"]["shipping"]), 5.0);
    assert_eq!(amount(&data["totals"]["total"]), 44.98);

    let card = json!({ "method": "card", "card": { "holder": "Sok Dara", "number": "4242 4242 4242 4242", "expiry": "12/29", "cvc": "123" } });
    let (status, order) = send(&app, Method::POST, "/api/v1/checkout/s-1/pay", None, Some(card)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["payment_status"], "paid");
    assert_eq!(amount(&order["total"]), 44.98);

    let (status, _) = send(&app, Method::GET, "/api/v1/checkout/s-1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, cart) = send(&app, Method::GET, "/api/v1/cart/s-1", None, None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let uri = format!("/api/v1/admin/orders/{}", order["id"].as_str().unwrap());
    let (status, fetched) = send(&app, Method::GET, &uri, Some("u-staff"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["order_number"], 1006);
}

#[tokio::test]
async fn card_payment_needs_card_details() {
    let app = app();
    send(&app, Method::POST, "/api/v1/cart/s-2", None, Some(json!({ "product_id": "p-usb-c-cable" }))).await;
    send(&app, Method::POST, "/api/v1/checkout/s-2", None, Some(checkout_form("dara@example.com"))).await;
    let (status, _) = send(&app, Method::POST, "/api/v1/checkout/s-2/pay", None, Some(json!({ "method": "card" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&app, Method::GET, "/api/v1/checkout/s-2", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
