use crate::error::MembershipError;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse};

mod action_context;
mod list_members;
mod ping;
mod push_gossip;

pub use self::action_context::ActionContext;
pub use self::list_members::ListMembersAction;
pub use self::ping::PingAction;
pub use self::push_gossip::PushGossipAction;

/// One endpoint of the node API: how to route it, parse it, run it against
/// the local node and render the result.
pub trait Action: Copy {
    type Request;
    type Response;

    fn method(&self) -> actix_web::http::Method;
    fn path(&self) -> String;
    fn parse_http(&self, request: &HttpRequest, body: Bytes) -> Result<Self::Request, MembershipError>;
    fn to_http_response(&self, response: Self::Response) -> HttpResponse;
    fn execute(
        &self,
        request: Self::Request,
        ctx: &ActionContext,
    ) -> Result<Self::Response, MembershipError>;
}
