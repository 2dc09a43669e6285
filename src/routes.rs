use crate::{
    api::{admin, attendance, employee, leave},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    register: Limiter,
    protected: Limiter,
}

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .with_context(|| format!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            register: build_limiter(config.rate_register_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiters: Limiters) {
    // Public routes
    cfg.service(
        web::scope(&format!("{api_prefix}/auth"))
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(limiters.register.clone())
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::scope("/attendance")
                    .route("/check-in", web::post().to(attendance::check_in))
                    .route("/check-out", web::post().to(attendance::check_out))
                    .route("/today", web::get().to(attendance::today))
                    .route("/history", web::get().to(attendance::history))
                    .route("/calendar", web::get().to(attendance::calendar))
                    .route("/stats", web::get().to(attendance::stats)),
            )
            .service(
                web::scope("/leave")
                    .route("/apply", web::post().to(leave::apply))
                    .route("/my", web::get().to(leave::my_leaves))
                    .route("/balance", web::get().to(leave::balance))
                    .route("/pending", web::get().to(leave::pending))
                    .route("/all", web::get().to(leave::all))
                    // /leave/{id}/status
                    .route("/{id}/status", web::patch().to(leave::update_status)),
            )
            .service(
                web::scope("/employee").service(
                    web::resource("/profile")
                        .route(web::get().to(employee::get_profile))
                        .route(web::patch().to(employee::update_profile)),
                ),
            )
            .service(
                web::scope("/admin")
                    .route("/dashboard/stats", web::get().to(admin::dashboard_stats))
                    .route(
                        "/dashboard/weekly-attendance",
                        web::get().to(admin::weekly_attendance),
                    )
                    .route("/dashboard/departments", web::get().to(admin::departments))
                    // /admin/employees
                    .service(
                        web::resource("/employees")
                            .route(web::get().to(admin::list_employees))
                            .route(web::post().to(admin::create_employee)),
                    )
                    .route("/attendance/daily", web::get().to(admin::daily_attendance))
                    .route("/attendance/mark-absent", web::post().to(admin::mark_absent))
                    .route("/activity", web::get().to(admin::activity)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiters_accept_configured_rates() {
        assert!(Limiters::from_config(&Config::for_tests()).is_ok());
    }

    #[test]
    fn zero_rate_is_clamped_instead_of_failing() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
