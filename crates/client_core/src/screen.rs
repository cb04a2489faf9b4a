//! Event-driven host for one `SelectionState`.
//!
//! User picks mutate the state synchronously. Directory calls run as tokio
//! tasks and their results come back over a channel; each result is applied
//! as one discrete event by `next_event` or `drain_ready_events`. Nothing is
//! cancelled: superseded sub-region responses are dropped on arrival.

use std::sync::Arc;

use shared::{
    domain::{Region, ScreenId, SubRegion},
    error::DirectoryError,
};
use tokio::{sync::mpsc, task::JoinError};
use tracing::{debug, warn};

use crate::{
    handoff::{self, Navigator},
    selection::{
        ResponseOutcome, SelectionError, SelectionState, SubRegionStatus, SubRegionTicket,
    },
    DirectoryClient,
};

#[derive(Debug)]
pub enum DirectoryEvent {
    RegionsLoaded(Result<Vec<Region>, DirectoryError>),
    SubRegionsLoaded {
        ticket: SubRegionTicket,
        result: Result<Vec<SubRegion>, DirectoryError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Regions(ResponseOutcome),
    SubRegions {
        region: Region,
        outcome: ResponseOutcome,
    },
}

pub struct LocationScreen {
    state: SelectionState,
    directory: Arc<dyn DirectoryClient>,
    events_tx: mpsc::UnboundedSender<DirectoryEvent>,
    events_rx: mpsc::UnboundedReceiver<DirectoryEvent>,
    in_flight: usize,
}

impl LocationScreen {
    /// Creates the screen and starts the region fetch. Must run inside a tokio runtime.
    pub fn mount(directory: Arc<dyn DirectoryClient>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut screen = Self {
            state: SelectionState::new(),
            directory,
            events_tx,
            events_rx,
            in_flight: 0,
        };
        screen.spawn_regions_fetch();
        screen
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Directory responses issued but not yet applied, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn select_region(&mut self, region: impl Into<Region>) -> Result<(), SelectionError> {
        let ticket = self.state.select_region(region.into())?;
        self.spawn_sub_regions_fetch(ticket);
        Ok(())
    }

    pub fn select_sub_region(
        &mut self,
        sub_region: impl Into<SubRegion>,
    ) -> Result<(), SelectionError> {
        self.state.select_sub_region(sub_region.into())
    }

    /// Waits for the next directory response and applies it.
    /// Returns `None` when no request is outstanding.
    pub async fn next_event(&mut self) -> Option<EventOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Applies every response that has already arrived, without waiting.
    pub fn drain_ready_events(&mut self) -> Vec<EventOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            outcomes.push(self.apply(event));
        }
        outcomes
    }

    pub fn confirm(&self, screen: &ScreenId, navigator: &dyn Navigator) {
        handoff::confirm(self.state.selection(), screen, navigator);
    }

    fn spawn_regions_fetch(&mut self) {
        let directory = Arc::clone(&self.directory);
        let events_tx = self.events_tx.clone();
        self.in_flight += 1;
        debug!("fetching region list");
        tokio::spawn(async move {
            let fetch = tokio::spawn(async move { directory.fetch_regions().await });
            let result = fetch.await.unwrap_or_else(|err| Err(task_failure(err)));
            let _ = events_tx.send(DirectoryEvent::RegionsLoaded(result));
        });
    }

    fn spawn_sub_regions_fetch(&mut self, ticket: SubRegionTicket) {
        let directory = Arc::clone(&self.directory);
        let events_tx = self.events_tx.clone();
        self.in_flight += 1;
        debug!(
            region = %ticket.region(),
            generation = ticket.generation(),
            "fetching sub-region list"
        );
        let region = ticket.region().clone();
        tokio::spawn(async move {
            let fetch = tokio::spawn(async move { directory.fetch_sub_regions(&region).await });
            let result = fetch.await.unwrap_or_else(|err| Err(task_failure(err)));
            let _ = events_tx.send(DirectoryEvent::SubRegionsLoaded { ticket, result });
        });
    }

    fn apply(&mut self, event: DirectoryEvent) -> EventOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            DirectoryEvent::RegionsLoaded(result) => {
                if let Err(err) = &result {
                    warn!("region list unavailable: {err}");
                }
                EventOutcome::Regions(self.state.apply_regions(result))
            }
            DirectoryEvent::SubRegionsLoaded { ticket, result } => {
                let outcome = self.state.apply_sub_regions(&ticket, result);
                match (&outcome, self.state.sub_regions()) {
                    (ResponseOutcome::Stale, _) => debug!(
                        region = %ticket.region(),
                        generation = ticket.generation(),
                        "dropping stale sub-region response"
                    ),
                    (ResponseOutcome::Accepted, SubRegionStatus::Failed(err)) => {
                        warn!(region = %ticket.region(), "sub-region list unavailable: {err}")
                    }
                    (ResponseOutcome::Accepted, _) => {
                        debug!(region = %ticket.region(), "sub-region list applied")
                    }
                }
                EventOutcome::SubRegions {
                    region: ticket.region().clone(),
                    outcome,
                }
            }
        }
    }
}

// A panicking or aborted fetch still has to resolve its event.
fn task_failure(err: JoinError) -> DirectoryError {
    DirectoryError::network(format!("directory task failed: {err}"))
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
