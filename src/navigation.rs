//! Screen routing.
//!
//! Views never switch screens themselves; they ask a [`Navigator`] and the
//! app loop applies the change on its next tick.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Generation brief form
    Generate,
    /// Progress overlay for the active run
    Progress,
    /// Results of the last run
    Results,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that forwards routes over an unbounded channel
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        if self.tx.send(route).is_err() {
            tracing::debug!(?route, "Navigation receiver dropped");
        }
    }
}
