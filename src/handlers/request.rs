use std::collections::BTreeMap;

use tracing::trace;

use super::{RequestHandler, ResourceAction};
use crate::engine::{BrowserRef, Request};

/// Sets fixed header fields on every outbound request.
pub struct HeaderRewriter {
    headers: BTreeMap<String, String>,
}

impl HeaderRewriter {
    pub fn new(headers: BTreeMap<String, String>) -> Self {
        Self { headers }
    }
}

impl RequestHandler for HeaderRewriter {
    fn on_before_resource_load(
        &self,
        _browser: &BrowserRef,
        request: &mut dyn Request,
    ) -> ResourceAction {
        for (name, value) in &self.headers {
            request.set_header(name, value);
        }

        trace!("Rewrote {} headers for {}", self.headers.len(), request.url());

        ResourceAction::Continue
    }
}
