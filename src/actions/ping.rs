use super::{Action, ActionContext};
use crate::error::MembershipError;
use crate::proto::PingResponse;
use actix_web::web::Bytes;
use actix_web::{http, HttpRequest, HttpResponse};

#[derive(Clone, Copy)]
pub struct PingAction;

impl Action for PingAction {
    type Request = ();
    type Response = PingResponse;

    fn method(&self) -> actix_web::http::Method {
        http::Method::GET
    }

    fn path(&self) -> String {
        "/ping".to_string()
    }

    fn parse_http(&self, _request: &HttpRequest, _body: Bytes) -> Result<(), MembershipError> {
        Ok(())
    }

    fn to_http_response(&self, response: PingResponse) -> HttpResponse {
        HttpResponse::Ok().json(response)
    }

    fn execute(&self, _: (), ctx: &ActionContext) -> Result<PingResponse, MembershipError> {
        Ok(PingResponse::pong(ctx.table.local_id().clone()))
    }
}
