//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::{
    AppState, MAX_IMAGE_SIZE,
    auth::{auth_guard, log_in_endpoint, register_endpoint},
    category::{create_category_endpoint, delete_category_endpoint, list_categories_endpoint},
    endpoints,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint,
    },
};

/// The largest request body accepted when creating a transaction.
///
/// This leaves room for the text fields and multipart framing around an image
/// of [MAX_IMAGE_SIZE] bytes, so that oversized images are reported by the
/// upload check rather than cut off by the body limit.
const TRANSACTION_BODY_LIMIT: usize = MAX_IMAGE_SIZE + 1024 * 1024;

/// Return a router with all the app's routes.
///
/// Cross-origin requests are allowed from any origin so that a browser client
/// served from elsewhere can call the API. Preflight requests are answered
/// before the auth guard runs.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index))
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint)
                .post(create_transaction_endpoint)
                .layer(DefaultBodyLimit::max(TRANSACTION_BODY_LIMIT)),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let uploads = ServeDir::new(&state.upload_dir)
        .not_found_service(get_404_not_found.into_service());

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::UPLOADS, uploads)
        .fallback(get_404_not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// The root path '/' reports that the server is up.
async fn get_index() -> &'static str {
    "Frugal Ledger API is running..."
}

#[cfg(test)]
mod router_tests {
    use axum::http::{Method, StatusCode};
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use tempfile::{TempDir, tempdir};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    use crate::{AppState, MAX_IMAGE_SIZE, build_router, endpoints, endpoints::format_endpoint};

    fn get_test_server() -> (TestServer, TempDir) {
        let dir = tempdir().unwrap();
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            dir.path().join("uploads"),
        )
        .unwrap()
        .with_password_cost(4);

        let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

        (server, dir)
    }

    fn stored_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path().join("uploads")).unwrap().count()
    }

    async fn register(server: &TestServer, email: &str) -> String {
        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"name": "Alice", "email": email, "password": "hunter22"}))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["token"]
            .as_str()
            .expect("response should contain a token")
            .to_owned()
    }

    async fn create_category(server: &TestServer, token: &str, name: &str, kind: &str) -> i64 {
        let response = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(token)
            .json(&json!({"name": name, "type": kind}))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["id"].as_i64().unwrap()
    }

    fn transaction_form(amount: &str, description: &str, category_id: i64) -> MultipartForm {
        MultipartForm::new()
            .add_text("amount", amount)
            .add_text("description", description)
            .add_text("categoryId", category_id.to_string())
    }

    fn image_part(file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Part {
        Part::bytes(bytes).file_name(file_name).mime_type(mime_type)
    }

    async fn list_transactions(server: &TestServer, token: &str) -> Vec<Value> {
        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .await;
        response.assert_status_ok();

        response.json()
    }

    #[tokio::test]
    async fn root_reports_server_is_running() {
        let (server, _dir) = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        response.assert_text("Frugal Ledger API is running...");
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (server, _dir) = get_test_server();

        let response = server.get("/api/budgets").await;

        response.assert_status_not_found();
        assert!(response.json::<Value>()["message"].is_string());
    }

    #[tokio::test]
    async fn missing_receipt_is_json_not_found() {
        let (server, _dir) = get_test_server();

        let response = server.get("/uploads/image-404.png").await;

        response.assert_status_not_found();
        assert!(response.json::<Value>()["message"].is_string());
    }

    #[tokio::test]
    async fn preflight_is_answered_without_token() {
        let (server, _dir) = get_test_server();

        let response = server
            .method(Method::OPTIONS, endpoints::TRANSACTIONS)
            .add_header("Origin", "http://localhost:5173")
            .add_header("Access-Control-Request-Method", "POST")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
    }

    #[tokio::test]
    async fn responses_allow_cross_origin_requests() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;

        let response = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .add_header("Origin", "http://localhost:5173")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
    }

    #[tokio::test]
    async fn protected_routes_need_token() {
        let (server, _dir) = get_test_server();

        for path in [
            endpoints::CATEGORIES.to_owned(),
            endpoints::TRANSACTIONS.to_owned(),
            format_endpoint(endpoints::TRANSACTION, 1),
        ] {
            let response = server.get(&path).await;

            response.assert_status_unauthorized();
            response.assert_json(&json!({"message": "Not authorized, no token"}));
        }
    }

    #[tokio::test]
    async fn register_never_returns_password() {
        let (server, _dir) = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"name": "Alice", "email": "alice@example.com", "password": "hunter22"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        let mut fields: Vec<&str> = body
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        fields.sort();
        assert_eq!(fields, vec!["email", "id", "name", "token"]);
    }

    #[tokio::test]
    async fn registering_same_email_twice_fails() {
        let (server, _dir) = get_test_server();
        register(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"name": "Alice", "email": "alice@example.com", "password": "hunter22"}))
            .await;

        response.assert_status_bad_request();
        assert!(response.json::<Value>()["message"].is_string());
    }

    #[tokio::test]
    async fn failed_log_ins_are_indistinguishable() {
        let (server, _dir) = get_test_server();
        register(&server, "alice@example.com").await;

        let wrong_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "alice@example.com", "password": "wrong password"}))
            .await;
        let unknown_email = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "bob@example.com", "password": "hunter22"}))
            .await;

        wrong_password.assert_status_unauthorized();
        unknown_email.assert_status_unauthorized();
        assert_eq!(wrong_password.as_bytes(), unknown_email.as_bytes());
    }

    #[tokio::test]
    async fn created_transaction_appears_in_list() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "EXPENSE").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .multipart(transaction_form("50000", "Lunch", food).add_text("date", "2025-04-01"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Value>();
        assert_eq!(created["amount"], json!(50000.0));
        assert_eq!(created["date"], json!("2025-04-01T00:00:00Z"));
        assert_eq!(created["imageUrl"], Value::Null);

        let transactions = list_transactions(&server, &token).await;
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["id"], created["id"]);
        assert_eq!(transactions[0]["amount"], json!(50000.0));
        assert_eq!(
            transactions[0]["category"],
            json!({"name": "Food", "type": "EXPENSE"})
        );
    }

    #[tokio::test]
    async fn transactions_are_listed_newest_first() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "EXPENSE").await;

        for date in ["2025-04-02", "2025-04-03", "2025-04-01"] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(&token)
                .multipart(transaction_form("10", "Snack", food).add_text("date", date))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let dates: Vec<Value> = list_transactions(&server, &token)
            .await
            .into_iter()
            .map(|transaction| transaction["date"].clone())
            .collect();

        assert_eq!(
            dates,
            vec![
                json!("2025-04-03T00:00:00Z"),
                json!("2025-04-02T00:00:00Z"),
                json!("2025-04-01T00:00:00Z"),
            ]
        );
    }

    #[tokio::test]
    async fn omitted_date_is_time_of_request() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "EXPENSE").await;
        let before = OffsetDateTime::now_utc();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .multipart(transaction_form("50000", "Lunch", food))
            .await;

        response.assert_status(StatusCode::CREATED);
        let date = response.json::<Value>()["date"].as_str().unwrap().to_owned();
        let date = OffsetDateTime::parse(&date, &Rfc3339).unwrap();
        assert!(date >= before);
    }

    #[tokio::test]
    async fn invalid_fields_are_all_reported() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .multipart(
                MultipartForm::new()
                    .add_text("amount", "-5")
                    .add_text("date", "yesterday"),
            )
            .await;

        response.assert_status_bad_request();
        let errors = response.json::<Value>()["errors"].clone();
        for field in ["amount", "categoryId", "date", "description"] {
            assert!(errors[field].is_array(), "expected an error for {field}");
        }
    }

    #[tokio::test]
    async fn text_file_receipt_is_rejected_without_creating_row() {
        let (server, dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "EXPENSE").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .multipart(transaction_form("50000", "Lunch", food).add_part(
                "image",
                image_part("notes.txt", "text/plain", b"hello".to_vec()),
            ))
            .await;

        response.assert_status_bad_request();
        assert!(response.json::<Value>()["errors"]["image"].is_array());
        assert!(list_transactions(&server, &token).await.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn oversized_receipt_is_rejected_without_creating_row() {
        let (server, dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "EXPENSE").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .multipart(transaction_form("50000", "Lunch", food).add_part(
                "image",
                image_part("receipt.png", "image/png", vec![0; MAX_IMAGE_SIZE + 1]),
            ))
            .await;

        response.assert_status_bad_request();
        assert!(response.json::<Value>()["errors"]["image"].is_array());
        assert!(list_transactions(&server, &token).await.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn another_users_category_is_rejected_and_image_removed() {
        let (server, dir) = get_test_server();
        let alice = register(&server, "alice@example.com").await;
        let bob = register(&server, "bob@example.com").await;
        let alices_category = create_category(&server, &alice, "Food", "EXPENSE").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&bob)
            .multipart(transaction_form("50000", "Lunch", alices_category).add_part(
                "image",
                image_part("receipt.jpg", "image/jpeg", vec![1, 2, 3]),
            ))
            .await;

        response.assert_status_bad_request();
        assert!(response.json::<Value>()["errors"]["categoryId"].is_array());
        assert!(list_transactions(&server, &alice).await.is_empty());
        assert!(list_transactions(&server, &bob).await.is_empty());
        assert_eq!(stored_files(&dir), 0);
    }

    #[tokio::test]
    async fn receipt_survives_transaction_delete() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        let food = create_category(&server, &token, "Food", "EXPENSE").await;

        let created = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .multipart(transaction_form("50000", "Lunch", food).add_part(
                "image",
                image_part("receipt.PNG", "image/png", vec![137, 80, 78, 71]),
            ))
            .await
            .json::<Value>();
        let image_url = created["imageUrl"].as_str().unwrap().to_owned();
        assert!(image_url.starts_with("uploads/image-"));
        assert!(image_url.ends_with(".png"));

        let path = format_endpoint(endpoints::TRANSACTION, created["id"].as_i64().unwrap());
        server
            .delete(&path)
            .authorization_bearer(&token)
            .await
            .assert_json(&json!({"message": "Transaction removed"}));

        assert!(list_transactions(&server, &token).await.is_empty());
        server
            .get(&path)
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
        let image = server.get(&format!("/{image_url}")).await;
        image.assert_status_ok();
        assert_eq!(image.as_bytes().to_vec(), vec![137, 80, 78, 71]);
    }

    #[tokio::test]
    async fn other_users_transactions_are_not_found() {
        let (server, _dir) = get_test_server();
        let alice = register(&server, "alice@example.com").await;
        let bob = register(&server, "bob@example.com").await;
        let food = create_category(&server, &alice, "Food", "EXPENSE").await;
        let created = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&alice)
            .multipart(transaction_form("50000", "Lunch", food))
            .await
            .json::<Value>();
        let path = format_endpoint(endpoints::TRANSACTION, created["id"].as_i64().unwrap());

        server
            .get(&path)
            .authorization_bearer(&bob)
            .await
            .assert_status_not_found();
        server
            .delete(&path)
            .authorization_bearer(&bob)
            .await
            .assert_status_not_found();

        let detail = server.get(&path).authorization_bearer(&alice).await;
        detail.assert_status_ok();
        assert_eq!(detail.json::<Value>()["category"]["id"], json!(food));
    }

    #[tokio::test]
    async fn category_in_use_can_be_deleted_after_its_transactions() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        let rent = create_category(&server, &token, "Rent", "EXPENSE").await;
        let created = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .multipart(transaction_form("2500000", "April rent", rent))
            .await
            .json::<Value>();
        let category_path = format_endpoint(endpoints::CATEGORY, rent);

        server
            .delete(&category_path)
            .authorization_bearer(&token)
            .await
            .assert_status_bad_request();

        server
            .delete(&format_endpoint(
                endpoints::TRANSACTION,
                created["id"].as_i64().unwrap(),
            ))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        let response = server
            .delete(&category_path)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"message": "Category removed"}));
    }

    #[tokio::test]
    async fn categories_are_listed_newest_first() {
        let (server, _dir) = get_test_server();
        let token = register(&server, "alice@example.com").await;
        create_category(&server, &token, "Rent", "EXPENSE").await;
        create_category(&server, &token, "Wages", "INCOME").await;

        let names: Vec<Value> = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Value>>()
            .into_iter()
            .map(|category| category["name"].clone())
            .collect();

        assert_eq!(names, vec![json!("Wages"), json!("Rent")]);
    }
}
