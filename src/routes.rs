use crate::{api::attendance, config::Config};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per peer-IP limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimits {
    record: Limiter,
    query: Limiter,
}

impl RateLimits {
    pub fn new(record_per_min: u32, query_per_min: u32) -> Result<Self> {
        Ok(Self {
            record: build_limiter(record_per_min)?,
            query: build_limiter(query_per_min)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.rate_record_per_min, config.rate_query_per_min)
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests/min"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

/// Cross-origin policy for browser clients. `*` opens the API to any origin
/// without credentials.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let base = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return base.allow_any_origin();
    }
    allowed_origins
        .iter()
        .fold(base.supports_credentials(), |cors, origin| {
            cors.allowed_origin(origin)
        })
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limits: &RateLimits) {
    cfg.service(
        web::scope(api_prefix).service(
            web::scope("/attendance")
                // /attendance/record
                .service(
                    web::resource("/record")
                        .wrap(limits.record.clone())
                        .route(web::post().to(attendance::record_attendance)),
                )
                // /attendance/user/{user_id}
                .service(
                    web::resource("/user/{user_id}")
                        .wrap(limits.query.clone())
                        .route(web::get().to(attendance::user_records)),
                )
                // /attendance/today/{user_id}
                .service(
                    web::resource("/today/{user_id}")
                        .wrap(limits.query.clone())
                        .route(web::get().to(attendance::today)),
                )
                // /attendance/range
                .service(
                    web::resource("/range")
                        .wrap(limits.query.clone())
                        .route(web::get().to(attendance::range)),
                )
                // /attendance/export
                .service(
                    web::resource("/export")
                        .wrap(limits.query.clone())
                        .route(web::get().to(attendance::export)),
                ),
        ),
    );
}
