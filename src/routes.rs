use crate::{
    api::{balance, leave_request},
    config::{ANY_ORIGIN, Config},
    error::ApiError,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    dev::Service,
    guard,
    http::{Method, StatusCode, header},
    middleware::Condition,
    web,
};

// Per-IP limiter for the API scope
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst");
    Governor::new(&cfg)
}

// Browser access for the leave form and the dashboards
fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(24 * 60 * 60);

    if origins.iter().any(|origin| origin == ANY_ORIGIN) {
        cors.allow_any_origin()
    } else {
        origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

/// Extractor failures answer with the same `{"error": ..}` body as the
/// handlers do.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, _req| {
            tracing::error!(error = %err, "Failed to parse request body");
            ApiError::InvalidJson.into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        tracing::error!(error = %err, "Failed to parse query string");
        ApiError::InvalidQuery.into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let limiter = Condition::new(
        config.rate_per_min > 0,
        build_limiter(config.rate_per_min),
    );

    cfg.app_data(json_config()).app_data(query_config());

    // An OPTIONS without Origin is not a browser preflight and the CORS layer
    // would refuse it, so it is answered ahead of the API scope.
    cfg.service(
        web::resource(format!("{}/leaves", config.api_prefix))
            .guard(guard::Options())
            .guard(guard::fn_guard(|ctx| {
                !ctx.head().headers().contains_key(header::ORIGIN)
            }))
            .to(leave_request::preflight),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(build_cors(&config.cors_allowed_origins))
            // browser preflights are answered by the CORS layer with an empty 200
            .wrap_fn(|req, srv| {
                let is_options = req.method() == Method::OPTIONS;
                let fut = srv.call(req);
                async move {
                    let mut res = fut.await?;
                    if is_options && res.status() == StatusCode::OK {
                        *res.response_mut().status_mut() = StatusCode::NO_CONTENT;
                    }
                    Ok(res)
                }
            })
            .wrap(limiter) // rate limiting
            .service(
                web::scope("/leaves")
                    // /leaves
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::list_leaves))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leaves/employee?email=
                    .service(
                        web::resource("/employee")
                            .route(web::get().to(leave_request::employee_leaves)),
                    )
                    // /leaves/decision, GET from email links, POST from clients
                    .service(
                        web::resource("/decision")
                            .route(web::get().to(leave_request::decide_leave_link))
                            .route(web::post().to(leave_request::decide_leave)),
                    ),
            )
            .service(web::resource("/balance").route(web::get().to(balance::get_balance))),
    );
}
