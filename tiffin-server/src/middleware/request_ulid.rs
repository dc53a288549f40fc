//! Request identifiers for correlating log lines.

use http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use ulid::Ulid;

/// Makes a fresh [ULID] for every request lacking a `request_id` header.
///
/// [ULID]: https://github.com/ulid/spec
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Ulid::new().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}
