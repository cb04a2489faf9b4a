//! Two-level cascading selection: region list, sub-region list, and the picks at each level.
//!
//! This is a synchronous state machine. Network calls happen elsewhere and
//! come back through `apply_regions` / `apply_sub_regions`. Sub-region
//! responses are tagged with the `SubRegionTicket` returned by
//! `select_region` and only the ticket of the latest selection is accepted.

use shared::{
    domain::{HandoffPayload, Region, Selection, SubRegion},
    error::DirectoryError,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionStatus {
    Loading,
    Ready(Vec<Region>),
    Failed(DirectoryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubRegionStatus {
    NoRegionSelected,
    Loading,
    Ready(Vec<SubRegion>),
    Failed(DirectoryError),
}

/// Identifies one outgoing sub-region request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRegionTicket {
    region: Region,
    generation: u64,
}

impl SubRegionTicket {
    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Accepted,
    /// The response no longer matches the current state and was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("region list is not available")]
    RegionsNotReady,
    #[error("sub-region list for the selected region is not available")]
    SubRegionsNotReady,
    #[error("{sub_region} is not a sub-region of {region}")]
    UnknownSubRegion { region: Region, sub_region: SubRegion },
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    regions: RegionStatus,
    sub_regions: SubRegionStatus,
    selection: Selection,
    generation: u64,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    /// State right after mount: regions loading, nothing selected.
    pub fn new() -> Self {
        Self {
            regions: RegionStatus::Loading,
            sub_regions: SubRegionStatus::NoRegionSelected,
            selection: Selection::default(),
            generation: 0,
        }
    }

    pub fn regions(&self) -> &RegionStatus {
        &self.regions
    }

    pub fn sub_regions(&self) -> &SubRegionStatus {
        &self.sub_regions
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.selection.region.as_ref()
    }

    pub fn selected_sub_region(&self) -> Option<&SubRegion> {
        self.selection.sub_region.as_ref()
    }

    pub fn handoff_payload(&self) -> HandoffPayload {
        HandoffPayload::from(&self.selection)
    }

    /// The region list is fetched once; anything after the first result is ignored.
    pub fn apply_regions(&mut self, result: Result<Vec<Region>, DirectoryError>) -> ResponseOutcome {
        if self.regions != RegionStatus::Loading {
            return ResponseOutcome::Stale;
        }
        self.regions = match result {
            Ok(regions) => RegionStatus::Ready(regions),
            Err(err) => RegionStatus::Failed(err),
        };
        ResponseOutcome::Accepted
    }

    /// Picks a region and resets the sub-region level before returning.
    ///
    /// Picking the region that is already selected resets and refetches too.
    /// The caller must issue `fetch_sub_regions(ticket.region())` and feed the
    /// result back with the returned ticket.
    pub fn select_region(&mut self, region: Region) -> Result<SubRegionTicket, SelectionError> {
        if !matches!(self.regions, RegionStatus::Ready(_)) {
            return Err(SelectionError::RegionsNotReady);
        }

        self.generation = self.generation.wrapping_add(1);
        self.selection.region = Some(region.clone());
        self.selection.sub_region = None;
        self.sub_regions = SubRegionStatus::Loading;

        Ok(SubRegionTicket {
            region,
            generation: self.generation,
        })
    }

    /// Whether a response carrying `ticket` may still change the state.
    pub fn is_current(&self, ticket: &SubRegionTicket) -> bool {
        ticket.generation == self.generation
            && self.selection.region.as_ref() == Some(&ticket.region)
            && self.sub_regions == SubRegionStatus::Loading
    }

    pub fn apply_sub_regions(
        &mut self,
        ticket: &SubRegionTicket,
        result: Result<Vec<SubRegion>, DirectoryError>,
    ) -> ResponseOutcome {
        if !self.is_current(ticket) {
            return ResponseOutcome::Stale;
        }
        self.sub_regions = match result {
            Ok(sub_regions) => SubRegionStatus::Ready(sub_regions),
            Err(err) => SubRegionStatus::Failed(err),
        };
        ResponseOutcome::Accepted
    }

    /// Picks a sub-region from the list of the currently selected region.
    pub fn select_sub_region(&mut self, sub_region: SubRegion) -> Result<(), SelectionError> {
        let SubRegionStatus::Ready(sub_regions) = &self.sub_regions else {
            return Err(SelectionError::SubRegionsNotReady);
        };
        let Some(region) = self.selection.region.as_ref() else {
            return Err(SelectionError::SubRegionsNotReady);
        };
        if !sub_regions.contains(&sub_region) {
            return Err(SelectionError::UnknownSubRegion {
                region: region.clone(),
                sub_region,
            });
        }

        self.selection.sub_region = Some(sub_region);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
