pub mod api;
pub mod auth;

use crate::errors::AuthError;
use crate::middleware::auth::AuthMiddleware;
use actix_web::web;

/// Route table shared by the server and the endpoint tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AuthError::Validation(format!("Invalid request body: {}", err)).into()
    }))
    .route("/health", web::get().to(api::health))
    .service(
        web::scope("/users")
            .route("/signup", web::post().to(auth::signup))
            .route("/login", web::post().to(auth::login))
            .route("/refresh-token", web::post().to(auth::refresh_token))
            .service(
                web::resource("/me")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::me)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::test_support::{auth_service, test_config, token_service};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    macro_rules! test_app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(auth_service(&$db)))
                    .app_data(web::Data::new(token_service(&$db)))
                    .app_data(web::Data::new(test_config()))
                    .app_data(web::Data::new($db.clone()))
                    .configure(routes),
            )
            .await
        };
    }

    macro_rules! post {
        ($uri:expr, $body:expr $(,)?) => {
            test::TestRequest::post()
                .uri($uri)
                .set_json($body)
                .to_request()
        };
    }

    #[actix_web::test]
    async fn test_signup_and_login_scenario() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        let res = test::call_service(
            &app,
            post!(
                "/users/signup",
                json!({"name": "Ana", "email": "ana@x.com", "password": "secret123"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let user: Value = test::read_body_json(res).await;
        assert_eq!(user["name"], "Ana");
        assert_eq!(user["email"], "ana@x.com");
        assert!(user["id"].is_string());
        assert!(user.get("password").is_none());

        let res = test::call_service(
            &app,
            post!(
                "/users/login",
                json!({"email": "ana@x.com", "password": "secret123"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert!(body["token"].is_string());
        assert!(body["refreshToken"].is_string());
        assert!(body["expireTime"].is_string());
        assert_eq!(body["user"]["userId"], user["id"]);
        assert_eq!(body["user"]["name"], "Ana");
        assert_eq!(body["user"]["userType"], 0);
    }

    #[actix_web::test]
    async fn test_bad_login_is_indistinguishable() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        test::call_service(
            &app,
            post!(
                "/users/signup",
                json!({"name": "Ana", "email": "ana@x.com", "password": "secret123"}),
            ),
        )
        .await;

        let wrong = test::call_service(
            &app,
            post!("/users/login", json!({"email": "ana@x.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        let wrong_body: Value = test::read_body_json(wrong).await;

        let unknown = test::call_service(
            &app,
            post!(
                "/users/login",
                json!({"email": "nobody@x.com", "password": "secret123"}),
            ),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        let unknown_body: Value = test::read_body_json(unknown).await;

        assert_eq!(wrong_body, unknown_body);
    }

    #[actix_web::test]
    async fn test_short_password_rejected_and_nothing_stored() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        let res = test::call_service(
            &app,
            post!(
                "/users/signup",
                json!({"name": "Ana", "email": "ana@x.com", "password": "short"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = test::call_service(
            &app,
            post!("/users/login", json!({"email": "ana@x.com", "password": "short"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        let res = test::call_service(&app, post!("/users/login", json!({"email": "ana@x.com"}))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[actix_web::test]
    async fn test_duplicate_signup_conflicts() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);
        let body = json!({"email": "ana@x.com", "password": "secret123"});

        let first = test::call_service(&app, post!("/users/signup", body.clone())).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = test::call_service(&app, post!("/users/signup", body)).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_padded_email_conflicts_and_logs_in_trimmed() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        let first = test::call_service(
            &app,
            post!("/users/signup", json!({"email": "ana@x.com", "password": "secret123"})),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        let padded = test::call_service(
            &app,
            post!("/users/signup", json!({"email": "ana@x.com ", "password": "secret123"})),
        )
        .await;
        assert_eq!(padded.status(), StatusCode::CONFLICT);

        let login = test::call_service(
            &app,
            post!("/users/login", json!({"email": " ana@x.com", "password": "secret123"})),
        )
        .await;
        assert_eq!(login.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_refresh_token_endpoint() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        test::call_service(
            &app,
            post!(
                "/users/signup",
                json!({"email": "ana@x.com", "password": "secret123"}),
            ),
        )
        .await;
        let res = test::call_service(
            &app,
            post!(
                "/users/login",
                json!({"email": "ana@x.com", "password": "secret123"}),
            ),
        )
        .await;
        let login: Value = test::read_body_json(res).await;

        let res = test::call_service(
            &app,
            post!(
                "/users/refresh-token",
                json!({"refreshToken": login["refreshToken"]}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert!(body["token"].is_string());

        let res = test::call_service(
            &app,
            post!("/users/refresh-token", json!({"refreshToken": "garbage"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_me_requires_valid_bearer_token() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        test::call_service(
            &app,
            post!(
                "/users/signup",
                json!({"name": "Ana", "email": "ana@x.com", "password": "secret123"}),
            ),
        )
        .await;
        let res = test::call_service(
            &app,
            post!(
                "/users/login",
                json!({"email": "ana@x.com", "password": "secret123"}),
            ),
        )
        .await;
        let login: Value = test::read_body_json(res).await;
        let token = login["token"].as_str().unwrap();

        let anonymous = test::TestRequest::get().uri("/users/me").to_request();
        let res = test::call_service(&app, anonymous).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let forged = test::TestRequest::get()
            .uri("/users/me")
            .insert_header(("Authorization", "Bearer not.a.token"))
            .to_request();
        let res = test::call_service(&app, forged).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let authed = test::TestRequest::get()
            .uri("/users/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let res = test::call_service(&app, authed).await;
        assert_eq!(res.status(), StatusCode::OK);
        let me: Value = test::read_body_json(res).await;
        assert_eq!(me["id"], login["user"]["userId"]);
        assert_eq!(me["email"], "ana@x.com");
    }

    #[actix_web::test]
    async fn test_health_reports_healthy_with_custom_secret() {
        let db = Database::in_memory().unwrap();
        let app = test_app!(db);

        let req = test::TestRequest::get().uri("/health").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"]["storage_reachable"], true);
    }
}
