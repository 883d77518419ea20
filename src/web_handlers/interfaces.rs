use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer};
use log::{debug, error, info};
use serde::Deserialize;

use crate::error::Error;
use crate::interfaces::Subconverter;
use crate::models::ProxyValidator;
use crate::rulesets::RulesetProvider;
use crate::settings::Settings;
use crate::utils::Fetcher;

/// Shared state handed to every request.
pub struct AppState {
    pub settings: Settings,
    pub subconverter: Subconverter,
    pub fetcher: Arc<dyn Fetcher>,
    pub rulesets: Arc<dyn RulesetProvider>,
}

/// Query parameters for subscription conversion
#[derive(Deserialize, Debug, Default, Clone)]
pub struct SubconverterQuery {
    /// Subscription URLs, `|`-separated
    pub url: Option<String>,
    /// Target client; the configured default when absent
    pub target: Option<String>,
    /// Remark substrings to keep, `|`-separated
    pub include: Option<String>,
    /// Remark substrings to drop, `|`-separated
    pub exclude: Option<String>,
    pub sort: Option<bool>,
    pub udp: Option<bool>,
    pub tfo: Option<bool>,
    /// Skip certificate verification
    pub scv: Option<bool>,
    pub tls13: Option<bool>,
    /// Append baseline rules
    pub rule: Option<bool>,
    /// Strict proxy validation
    pub strict: Option<bool>,
    /// Surge version
    pub ver: Option<u32>,
    /// Prefix remarks with the proxy type
    pub append_type: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct RulesetQuery {
    pub name: Option<String>,
}

fn split_patterns(value: &str) -> Vec<String> {
    value
        .split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn content_type(format: &str) -> &'static str {
    match format {
        "yaml" => "application/yaml; charset=utf-8",
        "json" => "application/json",
        _ => "text/plain; charset=utf-8",
    }
}

fn error_status(error: &Error) -> StatusCode {
    match error {
        e if e.is_caller_error() => StatusCode::BAD_REQUEST,
        Error::UnknownRuleset(_) => StatusCode::NOT_FOUND,
        Error::Fetch { .. } => StatusCode::BAD_GATEWAY,
        Error::EmptyResult { .. }
        | Error::MalformedPayload { .. }
        | Error::UnsupportedScheme { .. }
        | Error::MissingRequiredField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &Error) -> HttpResponse {
    let status = error_status(error);
    if status.is_server_error() {
        error!("Request failed: {}", error);
    } else {
        debug!("Request rejected: {}", error);
    }
    HttpResponse::build(status)
        .content_type("text/plain; charset=utf-8")
        .body(error.to_string())
}

/// Handler for subscription conversion
pub async fn sub_handler(
    query: web::Query<SubconverterQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let query = query.into_inner();

    let url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return HttpResponse::BadRequest().body("Missing url parameter"),
    };

    let mut options = state
        .settings
        .base_options(query.target.as_deref().unwrap_or_default());
    if let Some(include) = query.include.as_deref() {
        options = options.with_include(split_patterns(include));
    }
    if let Some(exclude) = query.exclude.as_deref() {
        options = options.with_exclude(split_patterns(exclude));
    }
    if let Some(sort) = query.sort {
        options = options.with_sort(sort);
    }
    if let Some(rule) = query.rule {
        options = options.with_rules(rule);
    }
    if let Some(ver) = query.ver {
        options = options.with_surge_version(ver);
    }
    if let Some(append_type) = query.append_type {
        options.clash.append_type = append_type;
        options.quanx.append_type = append_type;
    }
    // Request flags override the configured ones only when present
    if query.udp.is_some() {
        options.udp = query.udp.into();
    }
    if query.tfo.is_some() {
        options.tfo = query.tfo.into();
    }
    if query.scv.is_some() {
        options.skip_cert_verify = query.scv.into();
    }
    if query.tls13.is_some() {
        options.tls13 = query.tls13.into();
    }

    let format = match state.subconverter.output_format(&options.target) {
        Some(format) => format,
        None => return error_response(&Error::UnknownTarget(options.target)),
    };

    info!("Converting {} to {}", url, options.target);
    let timeout = Duration::from_secs(state.settings.fetch_timeout_secs);
    let strict = query.strict;
    let worker_state = state.clone();
    let result = web::block(move || -> crate::error::Result<Vec<u8>> {
        let state = worker_state;
        match strict {
            Some(strict) if strict != state.subconverter.validator().is_strict() => {
                let validator = ProxyValidator::new(strict)?;
                state.subconverter.convert_url_with(
                    state.fetcher.as_ref(),
                    &url,
                    timeout,
                    &options,
                    &validator,
                )
            }
            _ => state
                .subconverter
                .convert_url(state.fetcher.as_ref(), &url, timeout, &options),
        }
    })
    .await;

    match result {
        Ok(Ok(body)) => HttpResponse::Ok().content_type(content_type(format)).body(body),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!("Conversion worker failed: {}", e);
            HttpResponse::InternalServerError().body("Conversion worker failed")
        }
    }
}

/// Serves a configured ruleset by name
pub async fn getruleset_handler(
    query: web::Query<RulesetQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let name = match query.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return HttpResponse::BadRequest().body("Missing name parameter"),
    };

    let worker_state = state.clone();
    match web::block(move || worker_state.rulesets.get_ruleset(&name)).await {
        Ok(Ok(body)) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(body),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!("Ruleset worker failed: {}", e);
            HttpResponse::InternalServerError().body("Ruleset worker failed")
        }
    }
}

pub async fn version_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
}

pub async fn health_handler(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "targets": state.subconverter.supported_targets(),
    }))
}

/// Register the API endpoints with Actix Web
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/sub", web::get().to(sub_handler))
        .route("/getruleset", web::get().to(getruleset_handler))
        .route("/version", web::get().to(version_handler))
        .route("/health", web::get().to(health_handler));
}

/// Binds and runs the HTTP server until it is stopped.
pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let bind_address = state.settings.bind_address();
    let state = web::Data::new(state);

    info!("subconv listening on {}", bind_address);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(config))
        .bind(bind_address)?
        .run()
        .await
}
