use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Decodes a bearer token into an identity.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, AppError> {
        let claims = verify_token(token, secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }

    /// The caller's own employee id.
    pub fn require_employee(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::not_found("Employee not found"))
    }
}

pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::Unauthorized("Missing token".into())));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            tracing::error!("Config missing from app data");
            return ready(Err(AppError::Internal));
        };

        ready(AuthUser::from_token(token, &config.jwt_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::test::TestRequest;

    fn token_for(role: Role, employee_id: Option<u64>, config: &Config) -> String {
        generate_access_token(
            5,
            "jane@dayflow.test".to_string(),
            role.id(),
            employee_id,
            &config.jwt_secret,
            config.access_token_ttl,
        )
        .expect("token generation should succeed")
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(Config::for_tests()))
            .to_http_request();

        let err = AuthUser::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn valid_token_yields_identity() {
        let config = Config::for_tests();
        let token = token_for(Role::Employee, Some(11), &config);
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .app_data(Data::new(config))
            .to_http_request();

        let user = AuthUser::extract(&req).await.expect("token should be accepted");
        assert_eq!(user.user_id, 5);
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.require_employee().unwrap(), 11);
        assert!(matches!(user.require_admin(), Err(AppError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn tampered_token_is_rejected() {
        let config = Config::for_tests();
        let token = token_for(Role::Admin, None, &config);
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}x")))
            .app_data(Data::new(config))
            .to_http_request();

        assert!(AuthUser::extract(&req).await.is_err());
    }

    #[test]
    fn admin_without_profile_has_no_employee_scope() {
        let admin = AuthUser {
            user_id: 1,
            email: "admin@dayflow.com".to_string(),
            role: Role::Admin,
            employee_id: None,
        };
        assert!(admin.require_admin().is_ok());
        assert!(matches!(admin.require_employee(), Err(AppError::NotFound(_))));
    }
}
