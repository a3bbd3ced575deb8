mod metrics_middleware;

use self::metrics_middleware::MetricsMiddleware;
use crate::action_executor::ActionExecutor;
use crate::actions::{self, Action};
use crate::config::Config;
use crate::error::MembershipError;
use actix_web::dev::Server;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Responder, ResponseError};
use failure::Error;
use log::*;
use serde::Serialize;

#[derive(Clone)]
struct WebApi {
    action_executor: ActionExecutor,
}

fn register_action<A>(cfg: &mut web::ServiceConfig, action: A)
where
    A: Action + 'static,
{
    let path_string = action.path();
    let method = action.method();
    let func = move |request: HttpRequest, body: web::Bytes, state: web::Data<WebApi>| async move {
        state.action_executor.execute_http(action, &request, body)
    };
    cfg.route(&path_string, web::method(method).to(func));
}

async fn metrics_endpoint() -> impl Responder {
    crate::metrics::dump()
}

/// Installs every node endpoint, sharing `action_executor` across workers.
pub fn configure(action_executor: ActionExecutor) -> impl FnOnce(&mut web::ServiceConfig) + Clone {
    let state = WebApi { action_executor };
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state));
        register_actions(cfg);
    }
}

fn register_actions(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_endpoint));

    register_action(cfg, actions::PingAction);
    register_action(cfg, actions::ListMembersAction);
    register_action(cfg, actions::PushGossipAction);
}

pub fn start_web(config: &Config, action_executor: ActionExecutor) -> Result<Server, Error> {
    let address = config.bind.clone();
    let configure = configure(action_executor);

    let build_app = move || {
        App::new()
            .wrap(MetricsMiddleware::default())
            .wrap(Logger::default())
            .configure(configure.clone())
    };

    info!("Starting API on {}", address);
    let server = HttpServer::new(build_app).bind(&address)?.run();
    Ok(server)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for MembershipError {
    fn status_code(&self) -> StatusCode {
        match self {
            MembershipError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            MembershipError::UnknownNode(_) => StatusCode::NOT_FOUND,
            MembershipError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
