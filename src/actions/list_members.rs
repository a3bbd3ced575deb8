use super::{Action, ActionContext};
use crate::error::MembershipError;
use crate::proto::MemberView;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse};

#[derive(Clone, Copy)]
pub struct ListMembersAction;

impl Action for ListMembersAction {
    type Request = ();
    type Response = Vec<MemberView>;

    fn method(&self) -> actix_web::http::Method {
        actix_web::http::Method::GET
    }

    fn path(&self) -> String {
        "/members".to_string()
    }

    fn parse_http(&self, _request: &HttpRequest, _body: Bytes) -> Result<(), MembershipError> {
        Ok(())
    }

    fn to_http_response(&self, response: Vec<MemberView>) -> HttpResponse {
        HttpResponse::Ok().json(response)
    }

    fn execute(&self, _: (), ctx: &ActionContext) -> Result<Vec<MemberView>, MembershipError> {
        let members = ctx.table.snapshot();
        Ok(members.iter().map(MemberView::from).collect())
    }
}
