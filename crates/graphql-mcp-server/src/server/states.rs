use std::sync::Arc;

use crate::session::Session;

/// The lifecycle of the GraphQL session behind the server.
///
/// A configuration attempt always passes through `Configuring`, which drops any previous session,
/// so a failed reconfiguration never leaves stale tools behind.
#[derive(Debug, Clone, Default)]
pub(crate) enum State {
    #[default]
    Unconfigured,
    Configuring,
    Configured(Arc<Session>),
}

impl State {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            State::Unconfigured => "unconfigured",
            State::Configuring => "configuring",
            State::Configured(_) => "configured",
        }
    }

    pub(crate) fn session(&self) -> Option<&Arc<Session>> {
        match self {
            State::Configured(session) => Some(session),
            State::Unconfigured | State::Configuring => None,
        }
    }
}
