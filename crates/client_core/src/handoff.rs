//! Forwards a finished selection to the next screen.

use shared::domain::{HandoffPayload, ScreenId, Selection};
use tracing::debug;

/// Navigation capability provided by the presentation layer.
pub trait Navigator: Send + Sync {
    fn navigate(&self, screen: &ScreenId, payload: HandoffPayload);
}

/// Passes the selection through unchanged. Incomplete selections are forwarded as-is.
pub fn confirm(selection: &Selection, screen: &ScreenId, navigator: &dyn Navigator) {
    debug!(
        %screen,
        complete = selection.is_complete(),
        "handing off location selection"
    );
    navigator.navigate(screen, HandoffPayload::from(selection));
}

#[cfg(test)]
#[path = "tests/handoff_tests.rs"]
mod tests;
