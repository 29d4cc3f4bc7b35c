//! Request-scoped types shared by the limiter and the response strategies

use serde::{Deserialize, Serialize};

/// What the core needs to know about an inbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Caller network address as seen by the request layer
    pub client_addr: String,
    /// Authenticated subject, if any
    pub identity: Option<String>,
    /// Route pattern, e.g. `POST /chats/:id/messages`
    pub route: String,
}

impl RequestContext {
    pub fn new(client_addr: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            client_addr: client_addr.into(),
            identity: None,
            route: route.into(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}
