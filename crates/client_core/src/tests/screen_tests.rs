use super::*;
use async_trait::async_trait;
use shared::domain::HandoffPayload;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex as StdMutex,
    time::Duration,
};
use tokio::sync::{oneshot, Mutex};

type SubRegionResult = Result<Vec<SubRegion>, DirectoryError>;

struct ScriptedDirectory {
    regions: Mutex<Option<Result<Vec<Region>, DirectoryError>>>,
    gates: Mutex<HashMap<Region, VecDeque<oneshot::Receiver<SubRegionResult>>>>,
    sub_region_calls: Mutex<Vec<Region>>,
}

impl ScriptedDirectory {
    fn with_regions(result: Result<Vec<Region>, DirectoryError>) -> Self {
        Self {
            regions: Mutex::new(Some(result)),
            gates: Mutex::new(HashMap::new()),
            sub_region_calls: Mutex::new(Vec::new()),
        }
    }

    fn serving(codes: &[&str]) -> Self {
        Self::with_regions(Ok(codes.iter().map(|code| Region::from(*code)).collect()))
    }

    /// Holds the next `fetch_sub_regions(region)` until the returned sender fires.
    async fn gate(&self, region: &str) -> oneshot::Sender<SubRegionResult> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .await
            .entry(Region::from(region))
            .or_default()
            .push_back(rx);
        tx
    }
}

#[async_trait]
impl DirectoryClient for ScriptedDirectory {
    async fn fetch_regions(&self) -> Result<Vec<Region>, DirectoryError> {
        self.regions
            .lock()
            .await
            .take()
            .unwrap_or_else(|| Err(DirectoryError::network("regions requested twice")))
    }

    async fn fetch_sub_regions(&self, region: &Region) -> SubRegionResult {
        self.sub_region_calls.lock().await.push(region.clone());
        let gate = self
            .gates
            .lock()
            .await
            .get_mut(region)
            .and_then(VecDeque::pop_front);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(DirectoryError::network("gate dropped"))),
            None => Ok(Vec::new()),
        }
    }
}

struct PanickingDirectory {
    regions: Vec<Region>,
}

#[async_trait]
impl DirectoryClient for PanickingDirectory {
    async fn fetch_regions(&self) -> Result<Vec<Region>, DirectoryError> {
        if self.regions.is_empty() {
            panic!("region directory crashed");
        }
        Ok(self.regions.clone())
    }

    async fn fetch_sub_regions(&self, _region: &Region) -> SubRegionResult {
        panic!("sub-region directory crashed");
    }
}

#[derive(Default)]
struct RecordingNavigator {
    calls: StdMutex<Vec<(ScreenId, HandoffPayload)>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, screen: &ScreenId, payload: HandoffPayload) {
        self.calls
            .lock()
            .expect("navigator lock")
            .push((screen.clone(), payload));
    }
}

fn names(values: &[&str]) -> Vec<SubRegion> {
    values.iter().map(|value| SubRegion::from(*value)).collect()
}

async fn mounted(directory: &Arc<ScriptedDirectory>) -> LocationScreen {
    let mut screen = LocationScreen::mount(directory.clone());
    assert_eq!(
        screen.next_event().await,
        Some(EventOutcome::Regions(ResponseOutcome::Accepted))
    );
    screen
}

#[tokio::test]
async fn complete_flow_hands_off_selection() {
    let directory = Arc::new(ScriptedDirectory::serving(&["SP", "RJ"]));
    let sp_gate = directory.gate("SP").await;
    let mut screen = mounted(&directory).await;

    assert_eq!(
        screen.state().regions(),
        &crate::RegionStatus::Ready(vec![Region::from("SP"), Region::from("RJ")])
    );
    assert_eq!(screen.state().selected_region(), None);

    screen.select_region("SP").expect("select SP");
    assert_eq!(screen.state().sub_regions(), &SubRegionStatus::Loading);
    assert_eq!(screen.state().selected_sub_region(), None);

    sp_gate
        .send(Ok(names(&["Campinas", "Santos"])))
        .expect("release SP");
    assert_eq!(
        screen.next_event().await,
        Some(EventOutcome::SubRegions {
            region: Region::from("SP"),
            outcome: ResponseOutcome::Accepted,
        })
    );
    assert_eq!(
        screen.state().sub_regions(),
        &SubRegionStatus::Ready(names(&["Campinas", "Santos"]))
    );

    screen.select_sub_region("Campinas").expect("select Campinas");

    let navigator = RecordingNavigator::default();
    screen.confirm(&ScreenId::from("Points"), &navigator);
    let calls = navigator.calls.lock().expect("navigator lock");
    assert_eq!(
        calls.as_slice(),
        &[(
            ScreenId::from("Points"),
            HandoffPayload {
                region: Some("SP".into()),
                sub_region: Some("Campinas".into()),
            }
        )]
    );
}

#[tokio::test]
async fn superseded_response_arriving_last_is_discarded() {
    let directory = Arc::new(ScriptedDirectory::serving(&["SP", "RJ"]));
    let sp_gate = directory.gate("SP").await;
    let rj_gate = directory.gate("RJ").await;
    let mut screen = mounted(&directory).await;

    screen.select_region("SP").expect("select SP");
    screen.select_region("RJ").expect("select RJ");
    assert_eq!(screen.in_flight(), 2);

    rj_gate.send(Ok(names(&["B", "C"]))).expect("release RJ");
    assert_eq!(
        screen.next_event().await,
        Some(EventOutcome::SubRegions {
            region: Region::from("RJ"),
            outcome: ResponseOutcome::Accepted,
        })
    );

    sp_gate.send(Ok(names(&["A"]))).expect("release SP");
    assert_eq!(
        screen.next_event().await,
        Some(EventOutcome::SubRegions {
            region: Region::from("SP"),
            outcome: ResponseOutcome::Stale,
        })
    );

    assert_eq!(
        screen.state().sub_regions(),
        &SubRegionStatus::Ready(names(&["B", "C"]))
    );
    assert_eq!(screen.state().selected_region(), Some(&Region::from("RJ")));
    assert_eq!(screen.next_event().await, None);
}

#[tokio::test]
async fn superseded_response_arriving_first_is_discarded() {
    let directory = Arc::new(ScriptedDirectory::serving(&["SP", "RJ"]));
    let sp_gate = directory.gate("SP").await;
    let rj_gate = directory.gate("RJ").await;
    let mut screen = mounted(&directory).await;

    screen.select_region("SP").expect("select SP");
    screen.select_region("RJ").expect("select RJ");

    sp_gate.send(Ok(names(&["A"]))).expect("release SP");
    assert_eq!(
        screen.next_event().await,
        Some(EventOutcome::SubRegions {
            region: Region::from("SP"),
            outcome: ResponseOutcome::Stale,
        })
    );
    assert_eq!(screen.state().sub_regions(), &SubRegionStatus::Loading);

    rj_gate.send(Ok(names(&["B", "C"]))).expect("release RJ");
    screen.next_event().await;
    assert_eq!(
        screen.state().sub_regions(),
        &SubRegionStatus::Ready(names(&["B", "C"]))
    );
}

#[tokio::test]
async fn region_failure_never_requests_sub_regions() {
    let directory = Arc::new(ScriptedDirectory::with_regions(Err(
        DirectoryError::network("connection refused"),
    )));
    let mut screen = LocationScreen::mount(directory.clone());

    assert_eq!(
        screen.next_event().await,
        Some(EventOutcome::Regions(ResponseOutcome::Accepted))
    );
    assert!(matches!(
        screen.state().regions(),
        crate::RegionStatus::Failed(DirectoryError::Network(_))
    ));
    assert_eq!(
        screen.select_region("SP"),
        Err(SelectionError::RegionsNotReady)
    );
    assert_eq!(screen.in_flight(), 0);
    assert!(directory.sub_region_calls.lock().await.is_empty());
}

#[tokio::test]
async fn every_region_pick_triggers_a_fetch() {
    let directory = Arc::new(ScriptedDirectory::serving(&["SP", "RJ"]));
    let mut screen = mounted(&directory).await;

    screen.select_region("SP").expect("select SP");
    screen.select_region("SP").expect("reselect SP");
    screen.select_region("RJ").expect("select RJ");

    while screen.next_event().await.is_some() {}

    let mut calls = directory.sub_region_calls.lock().await.clone();
    calls.sort();
    assert_eq!(
        calls,
        vec![Region::from("RJ"), Region::from("SP"), Region::from("SP")]
    );
    assert_eq!(screen.state().selected_region(), Some(&Region::from("RJ")));
    assert_eq!(screen.state().sub_regions(), &SubRegionStatus::Ready(Vec::new()));
}

#[tokio::test]
async fn failed_sub_region_fetch_can_be_retried_by_reselecting() {
    let directory = Arc::new(ScriptedDirectory::serving(&["SP"]));
    let first = directory.gate("SP").await;
    let second = directory.gate("SP").await;
    let mut screen = mounted(&directory).await;

    screen.select_region("SP").expect("select SP");
    first
        .send(Err(DirectoryError::decode("unexpected payload")))
        .expect("release first");
    screen.next_event().await;
    assert!(matches!(
        screen.state().sub_regions(),
        SubRegionStatus::Failed(DirectoryError::Decode(_))
    ));

    screen.select_region("SP").expect("reselect SP");
    second.send(Ok(names(&["Campinas"]))).expect("release second");
    screen.next_event().await;
    assert_eq!(
        screen.state().sub_regions(),
        &SubRegionStatus::Ready(names(&["Campinas"]))
    );
}

#[tokio::test]
async fn drain_applies_only_arrived_responses() {
    let directory = Arc::new(ScriptedDirectory::serving(&["SP"]));
    let gate = directory.gate("SP").await;
    let mut screen = mounted(&directory).await;

    screen.select_region("SP").expect("select SP");
    assert!(screen.drain_ready_events().is_empty());
    assert_eq!(screen.state().sub_regions(), &SubRegionStatus::Loading);

    gate.send(Ok(names(&["Santos"]))).expect("release");
    let mut outcomes = Vec::new();
    for _ in 0..100 {
        outcomes.extend(screen.drain_ready_events());
        if screen.in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        outcomes,
        vec![EventOutcome::SubRegions {
            region: Region::from("SP"),
            outcome: ResponseOutcome::Accepted,
        }]
    );
    assert_eq!(
        screen.state().sub_regions(),
        &SubRegionStatus::Ready(names(&["Santos"]))
    );
}

#[tokio::test]
async fn panicking_region_fetch_ends_in_failed_state() {
    let directory = Arc::new(PanickingDirectory {
        regions: Vec::new(),
    });
    let mut screen = LocationScreen::mount(directory);

    let outcome = tokio::time::timeout(Duration::from_secs(2), screen.next_event())
        .await
        .expect("region event must arrive");
    assert_eq!(
        outcome,
        Some(EventOutcome::Regions(ResponseOutcome::Accepted))
    );
    assert!(
        matches!(
            screen.state().regions(),
            crate::RegionStatus::Failed(DirectoryError::Network(message))
                if message.contains("directory task failed")
        ),
        "unexpected state: {:?}",
        screen.state().regions()
    );
    assert_eq!(screen.in_flight(), 0);
}

#[tokio::test]
async fn panicking_sub_region_fetch_ends_in_failed_state() {
    let directory = Arc::new(PanickingDirectory {
        regions: vec![Region::from("SP")],
    });
    let mut screen = LocationScreen::mount(directory);
    screen.next_event().await;

    screen.select_region("SP").expect("select SP");
    let outcome = tokio::time::timeout(Duration::from_secs(2), screen.next_event())
        .await
        .expect("sub-region event must arrive");

    assert_eq!(
        outcome,
        Some(EventOutcome::SubRegions {
            region: Region::from("SP"),
            outcome: ResponseOutcome::Accepted,
        })
    );
    assert!(matches!(
        screen.state().sub_regions(),
        SubRegionStatus::Failed(DirectoryError::Network(_))
    ));
    assert_eq!(screen.next_event().await, None);
}
