use super::{Action, ActionContext};
use crate::error::MembershipError;
use crate::gossip::ReceiveReport;
use crate::proto::Ack;
use actix_web::web::Bytes;
use actix_web::{http, HttpRequest, HttpResponse};

#[derive(Clone, Copy)]
pub struct PushGossipAction;

impl Action for PushGossipAction {
    type Request = Bytes;
    type Response = ReceiveReport;

    fn method(&self) -> actix_web::http::Method {
        http::Method::POST
    }

    fn path(&self) -> String {
        "/gossip".to_string()
    }

    fn parse_http(&self, _request: &HttpRequest, body: Bytes) -> Result<Bytes, MembershipError> {
        Ok(body)
    }

    fn to_http_response(&self, _response: ReceiveReport) -> HttpResponse {
        HttpResponse::Ok().json(Ack::default())
    }

    fn execute(&self, body: Bytes, ctx: &ActionContext) -> Result<ReceiveReport, MembershipError> {
        ctx.receiver.receive(&body)
    }
}
