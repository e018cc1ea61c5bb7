use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use primshape::fetch::{ContentStore, FetchState};
use primshape::part::{SceneObjectGroup, SceneObjectPart};
use uuid::Uuid;

use crate::common::test_utils::{TEXTURE_ID, descriptor_tree, gradient_png, init_logging};

mod common;

/// In-memory content store with an optional artificial delay.
struct FakeStore {
    blobs: HashMap<Uuid, Vec<u8>>,
    delay: Duration,
    hits: AtomicUsize,
}

impl FakeStore {
    fn new() -> Self {
        Self {
            blobs: HashMap::new(),
            delay: Duration::ZERO,
            hits: AtomicUsize::new(0),
        }
    }

    fn with(mut self, id: &str, bytes: Vec<u8>) -> Self {
        self.blobs.insert(Uuid::parse_str(id).unwrap(), bytes);
        self
    }
}

impl ContentStore for FakeStore {
    fn fetch(&self, id: Uuid) -> BoxFuture<'_, Option<Vec<u8>>> {
        Box::pin(async move {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.blobs.get(&id).cloned()
        })
    }
}

fn counted_state() -> (Arc<FetchState>, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let signal = fired.clone();
    let state = Arc::new(FetchState::new(move || {
        signal.fetch_add(1, Ordering::SeqCst);
    }));
    (state, fired)
}

#[tokio::test(flavor = "multi_thread")]
async fn completion_fires_once_across_concurrent_resolvers() {
    init_logging();
    let (state, fired) = counted_state();

    // All fetches are registered before any resolver runs, so a fast
    // resolver cannot observe a premature zero.
    const N: usize = 8;
    for _ in 0..N {
        state.begin();
    }
    assert_eq!(state.outstanding(), N as u32);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    let mut tasks = Vec::new();
    for i in 0..N {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis((i % 3) as u64)).await;
            state.finish();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(state.outstanding(), 0);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn check_done_with_nothing_outstanding_fires_immediately() {
    let (state, fired) = counted_state();

    state.check_done();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // The signal is spent; later checks are no-ops.
    state.check_done();
    state.check_done();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn check_done_waits_while_a_fetch_is_outstanding() {
    let (state, fired) = counted_state();

    state.begin();
    state.check_done();
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    state.finish();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prim_only_group_resolves_without_touching_the_store() {
    let fired = Arc::new(AtomicUsize::new(0));
    let signal = fired.clone();
    let mut group = SceneObjectGroup::new(move || {
        signal.fetch_add(1, Ordering::SeqCst);
    });
    group
        .parts
        .push(SceneObjectPart::from_tree(&descriptor_tree("0", &[], (1.0, 1.0, 1.0))).unwrap());

    let store = FakeStore::new();
    group.resolve_assets(&store).await;

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(store.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_group_resolves_immediately() {
    let fired = Arc::new(AtomicUsize::new(0));
    let signal = fired.clone();
    let mut group = SceneObjectGroup::new(move || {
        signal.fetch_add(1, Ordering::SeqCst);
    });

    group.resolve_assets(&FakeStore::new()).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mixed_group_meshes_sculpts_as_assets_arrive() {
    let fired = Arc::new(AtomicUsize::new(0));
    let signal = fired.clone();
    let mut group = SceneObjectGroup::new(move || {
        signal.fetch_add(1, Ordering::SeqCst);
    });
    group
        .parts
        .push(SceneObjectPart::from_tree(&descriptor_tree("0", &[], (1.0, 1.0, 1.0))).unwrap());
    group
        .parts
        .push(SceneObjectPart::from_tree(&descriptor_tree("1", &[], (1.0, 1.0, 1.0))).unwrap());

    let mut store = FakeStore::new().with(TEXTURE_ID, gradient_png(8, 8));
    store.delay = Duration::from_millis(2);

    group.resolve_assets(&store).await;

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(group.fetch.outstanding(), 0);
    assert_eq!(store.hits.load(Ordering::SeqCst), 1);

    let prim = &group.parts[0];
    assert!(prim.mesh().is_none());
    assert!(!prim.have_all_assets());

    let sculpt = &group.parts[1];
    assert!(sculpt.have_all_assets());
    assert_eq!(sculpt.num_faces(), 1);
    assert!(sculpt.mesh().is_some());
}

#[tokio::test]
async fn mesh_assets_are_retained_for_the_external_decoder() {
    let fired = Arc::new(AtomicUsize::new(0));
    let signal = fired.clone();
    let mut group = SceneObjectGroup::new(move || {
        signal.fetch_add(1, Ordering::SeqCst);
    });
    // SculptType 5 marks an uploaded mesh asset.
    group
        .parts
        .push(SceneObjectPart::from_tree(&descriptor_tree("5", &[], (1.0, 1.0, 1.0))).unwrap());

    let blob = vec![0xde, 0xad, 0xbe, 0xef];
    let store = FakeStore::new().with(TEXTURE_ID, blob.clone());
    group.resolve_assets(&store).await;

    let part = &group.parts[0];
    assert!(part.have_all_assets());
    assert_eq!(part.mesh_asset_data(), Some(blob.as_slice()));
    // Decoding the blob is outside this crate; no geometry yet.
    assert!(part.mesh().is_none());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_assets_still_complete_the_group() {
    init_logging();
    let fired = Arc::new(AtomicUsize::new(0));
    let signal = fired.clone();
    let mut group = SceneObjectGroup::new(move || {
        signal.fetch_add(1, Ordering::SeqCst);
    });
    group
        .parts
        .push(SceneObjectPart::from_tree(&descriptor_tree("1", &[], (1.0, 1.0, 1.0))).unwrap());

    // The store has nothing for the sculpt's texture id.
    group.resolve_assets(&FakeStore::new()).await;

    let part = &group.parts[0];
    assert!(part.have_all_assets());
    assert!(part.mesh().is_none());
    assert_eq!(part.num_faces(), 0);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
