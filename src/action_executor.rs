use crate::actions::{Action, ActionContext};
use crate::error::MembershipError;
use crate::gossip::MembershipTable;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse};

#[derive(Clone)]
pub struct ActionExecutor {
    context: ActionContext,
}

impl ActionExecutor {
    pub fn new(table: MembershipTable) -> Self {
        Self {
            context: ActionContext::new(table),
        }
    }

    pub fn execute<A: Action>(&self, action: A, request: A::Request) -> Result<A::Response, MembershipError> {
        action.execute(request, &self.context)
    }

    pub fn execute_http<A: Action>(
        &self,
        action: A,
        request: &HttpRequest,
        body: Bytes,
    ) -> Result<HttpResponse, MembershipError> {
        let parsed = action.parse_http(request, body)?;
        let response = self.execute(action, parsed)?;
        Ok(action.to_http_response(response))
    }
}
