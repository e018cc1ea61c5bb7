//! Scene object parts: descriptor, asset blob and finished geometry.
//!
//! A part is one object in a group. Its lifecycle: parse the descriptor
//! tree, resolve the referenced asset (if any) through the group's
//! [`FetchState`], then build geometry with the generator matching the
//! part's classification. Geometry is replaced wholesale on every
//! rebuild; face counts never accumulate across calls.

use uuid::Uuid;

use crate::descriptor::{Classification, Lod, ParseError, ShapeDescriptor};
use crate::fetch::{ContentStore, FetchState};
use crate::mesher::{self, GeneratedMesh, MeshError};
use crate::tree::Node;

/// One scene object: immutable descriptor plus mutable mesh state.
#[derive(Debug)]
pub struct SceneObjectPart {
    pub descriptor: ShapeDescriptor,
    asset_data: Option<Vec<u8>>,
    mesh: Option<GeneratedMesh>,
    meshed: bool,
    have_all_assets: bool,
}

impl SceneObjectPart {
    /// Parse a part from its descriptor tree. Fails whole; a part is
    /// never constructed from a partially valid descriptor.
    pub fn from_tree(root: &Node) -> Result<Self, ParseError> {
        Ok(Self {
            descriptor: ShapeDescriptor::parse(root)?,
            asset_data: None,
            mesh: None,
            meshed: false,
            have_all_assets: false,
        })
    }

    /// Whether geometry depends on an external asset arriving first.
    pub fn needs_asset(&self) -> bool {
        self.descriptor.classification.asset_id().is_some()
    }

    /// Resolve this part's external asset through the group's fetch
    /// state. Prims need no asset and signal readiness immediately.
    pub async fn resolve_assets(&mut self, fetch: &FetchState, store: &dyn ContentStore) {
        if self.needs_asset() {
            fetch.begin();
            self.resolve_registered(fetch, store).await;
        } else {
            fetch.check_done();
        }
    }

    /// Fetch the asset and resolve the fetch registered for this part.
    /// Pairs with exactly one prior [`FetchState::begin`].
    ///
    /// Success and not-found are handled identically: both resolve the
    /// fetch, with populated or empty bytes. Sculpts mesh as soon as
    /// their texture arrives; mesh assets retain the blob for the
    /// external mesh decoder.
    async fn resolve_registered(&mut self, fetch: &FetchState, store: &dyn ContentStore) {
        let Some(asset_id) = self.descriptor.classification.asset_id() else {
            return;
        };

        let bytes = store.fetch(asset_id).await.unwrap_or_default();
        self.have_all_assets = true;
        self.asset_data = Some(bytes);

        if let Classification::Sculpt { .. } = self.descriptor.classification {
            let data = self.asset_data.take().unwrap_or_default();
            if let Err(e) = self.mesh_sculpt(&data) {
                log::warn!("sculpt {} failed to mesh: {}", self.descriptor.id, e);
            }
        }

        fetch.finish();
    }

    /// Build primitive geometry at the requested LOD, honoring the
    /// descriptor's detail floor. Idempotent while a mesh exists; call
    /// [`clear_mesh_data`](Self::clear_mesh_data) first to regenerate.
    ///
    /// On failure the part keeps whatever mesh it had; the fault never
    /// propagates past this boundary unstructured.
    pub fn mesh_prim(&mut self, lod: Lod) -> Result<(), MeshError> {
        if self.meshed {
            return Ok(());
        }
        let effective = lod.max(self.descriptor.max_lod);
        let raw = mesher::prim::generate(&self.descriptor, effective)?;
        self.mesh = Some(mesher::canonicalize(raw));
        self.meshed = true;
        Ok(())
    }

    /// Build sculpt geometry from the fetched texture bytes.
    pub fn mesh_sculpt(&mut self, data: &[u8]) -> Result<(), MeshError> {
        if self.meshed {
            return Ok(());
        }
        let Classification::Sculpt {
            kind,
            mirror,
            invert,
            ..
        } = self.descriptor.classification
        else {
            return Err(MeshError::Geometry);
        };
        let raw = mesher::sculpt::generate(data, kind, mirror, invert)?;
        self.mesh = Some(mesher::canonicalize(raw));
        self.meshed = true;
        Ok(())
    }

    /// The finished mesh, if generation has succeeded.
    pub fn mesh(&self) -> Option<&GeneratedMesh> {
        self.mesh.as_ref()
    }

    /// Face-group count of the current mesh.
    pub fn num_faces(&self) -> u32 {
        self.mesh.as_ref().map(|m| m.num_faces).unwrap_or(0)
    }

    /// Raw bytes of a fetched mesh asset, for the external mesh decoder.
    pub fn mesh_asset_data(&self) -> Option<&[u8]> {
        self.asset_data.as_deref()
    }

    /// Detail level name the external mesh decoder should select,
    /// honoring the descriptor's detail floor.
    pub fn mesh_lod_level(&self, lod: Lod) -> &'static str {
        match lod.max(self.descriptor.max_lod) {
            Lod::High => "high_lod",
            Lod::Medium => "medium_lod",
            Lod::Low => "low_lod",
        }
    }

    pub fn have_all_assets(&self) -> bool {
        self.have_all_assets
    }

    /// Release geometry and the asset blob. The next mesh call rebuilds
    /// from scratch.
    pub fn clear_mesh_data(&mut self) {
        self.mesh = None;
        self.asset_data = None;
        self.meshed = false;
    }

    /// Texture ids for the finished mesh's face groups, in group order.
    pub fn gather_textures(&self) -> Vec<Uuid> {
        (0..self.num_faces() as usize)
            .map(|face| self.descriptor.textures.face_texture(face))
            .collect()
    }
}

/// A group of parts sharing one fetch state and completion signal.
pub struct SceneObjectGroup {
    pub parts: Vec<SceneObjectPart>,
    pub fetch: FetchState,
}

impl SceneObjectGroup {
    pub fn new(on_all_resolved: impl FnOnce() + Send + 'static) -> Self {
        Self {
            parts: Vec::new(),
            fetch: FetchState::new(on_all_resolved),
        }
    }

    /// Resolve every part's assets concurrently. The group completion
    /// signal fires exactly once, when the last fetch resolves, or
    /// immediately for groups with no assets to fetch.
    ///
    /// Every fetch is registered before any resolver runs, so a fast
    /// resolver can never observe a premature zero counter.
    pub async fn resolve_assets(&mut self, store: &dyn ContentStore) {
        let Self { parts, fetch } = self;
        let pending = parts.iter().filter(|p| p.needs_asset()).count();
        if pending == 0 {
            fetch.check_done();
            return;
        }
        for _ in 0..pending {
            fetch.begin();
        }
        futures::future::join_all(
            parts
                .iter_mut()
                .map(|part| part.resolve_registered(fetch, store)),
        )
        .await;
    }

    /// Texture ids referenced by all finished parts.
    pub fn gather_textures(&self) -> Vec<Uuid> {
        self.parts.iter().flat_map(|p| p.gather_textures()).collect()
    }
}
