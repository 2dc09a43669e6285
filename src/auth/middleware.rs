use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

/// Rejects requests without a valid bearer token and stores the
/// [`AuthUser`] in request extensions for the handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().ok(),
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Missing Authorization header"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let token = match header_value.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(t) => t.to_owned(),
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"message": "Authorization header must start with Bearer"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let auth_user = match AuthUser::from_token(&token, &config.jwt_secret) {
        Ok(user) => user,
        Err(e) => {
            let resp = HttpResponse::Unauthorized().json(json!({"message": e.to_string()}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use crate::model::role::Role;
    use actix_web::{App, HttpResponse, http::StatusCode, middleware::from_fn, test, web};

    async fn whoami(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(user.email)
    }

    #[actix_web::test]
    async fn protected_scope_requires_bearer_token() {
        let config = Config::for_tests();
        let token = generate_access_token(
            3,
            "grace@dayflow.test".to_string(),
            Role::Employee.id(),
            Some(9),
            &config.jwt_secret,
            config.access_token_ttl,
        )
        .expect("token generation should succeed");

        let app = test::init_service(
            App::new().app_data(Data::new(config)).service(
                web::scope("/attendance")
                    .wrap(from_fn(auth_middleware))
                    .route("/today", web::get().to(whoami)),
            ),
        )
        .await;

        let anonymous = test::TestRequest::get().uri("/attendance/today").to_request();
        let resp = test::call_service(&app, anonymous).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let basic = test::TestRequest::get()
            .uri("/attendance/today")
            .insert_header(("Authorization", "Basic abc"))
            .to_request();
        let resp = test::call_service(&app, basic).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let authed = test::TestRequest::get()
            .uri("/attendance/today")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, authed).await;
        assert_eq!(body, "grace@dayflow.test");
    }
}
