use worker::{Context, Env, FormEntry, Request, Response, Result, RouteContext, Router};

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::models::{HealthResponse, ParseResponse};
use crate::upload::{
    FILE_FIELD, check_content_length, missing_file, parse_upload, require_form, validate_upload,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: ServiceConfig,
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let config = match ServiceConfig::from_env(&env) {
        Ok(config) => config,
        Err(error) => {
            worker::console_error!("invalid service configuration: {error}");
            return error.into_response();
        }
    };

    Router::with_data(AppState { config })
        .get("/health", health_route)
        .post_async("/parse", parse_route)
        .run(req, env)
        .await
}

fn health_route(_req: Request, _ctx: RouteContext<AppState>) -> Result<Response> {
    Response::from_json(&HealthResponse::ok())
}

async fn parse_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match parse_response(&mut req, &ctx.data.config).await {
        Ok(response) => {
            worker::console_log!(
                "statement parsed: method={}, pages={}, rows={}",
                response.method_used,
                response.pages_processed,
                response.rows.len()
            );
            Response::from_json(&response)
        }
        Err(error) => {
            worker::console_error!("parse request failed: {error}");
            error.into_response()
        }
    }
}

async fn parse_response(req: &mut Request, config: &ServiceConfig) -> Result<ParseResponse, ApiError> {
    let content_length = req.headers().get("Content-Length")?;
    check_content_length(content_length.as_deref(), config)?;

    let form = require_form(req.form_data().await)?;
    let file = match form.get(FILE_FIELD) {
        Some(FormEntry::File(file)) => file,
        Some(FormEntry::Field(_)) | None => return Err(missing_file()),
    };
    validate_upload(&file.name(), file.size(), config)?;

    let bytes = file.bytes().await?;
    parse_upload(bytes, config)
}
