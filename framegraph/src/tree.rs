use crate::catalog::{CatalogFrame, CatalogModels};
use crate::date::AbsoluteDate;
use crate::error::{FrameError, FrameResult};
use crate::provider::TransformProvider;
use crate::transform::Transform;
use compact_str::CompactString;
use dashmap::DashMap;
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Default bound on the number of hops between any frame and the root.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Name given to the root frame when none is configured.
pub const DEFAULT_ROOT_NAME: &str = "J2000";

/// Handle on a frame of a [`FrameGraph`].
///
/// Handles are only meaningful for the graph that issued them. A parent is
/// always created before its children, so a parent handle is always smaller
/// than the handles of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(u32);

impl FrameId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// How a frame obtains its transform from its parent.
#[derive(Debug)]
pub(crate) enum FrameLink {
    /// Set at creation, or installed later by a control-frame update.
    Fixed,
    /// Recomputed by the provider for every query date.
    Dynamic(Arc<dyn TransformProvider>),
}

#[derive(Debug)]
struct FrameNode {
    name: CompactString,
    parent: Option<FrameId>,
    depth: usize,
    link: FrameLink,
    /// Transform from the parent to this frame, always replaced as a whole.
    transform: RwLock<Transform>,
}

impl FrameNode {
    fn current_transform(&self) -> Transform {
        *self.transform.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn install(&self, transform: Transform) {
        *self.transform.write().unwrap_or_else(PoisonError::into_inner) = transform;
    }
}

/// The frames crossed when going from one frame to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePath {
    /// Deepest frame shared by both lineages.
    pub common: FrameId,
    /// Frames from the origin up to `common` excluded, child first.
    pub up: Vec<FrameId>,
    /// Frames from the destination up to `common` excluded, child first.
    pub down: Vec<FrameId>,
}

impl FramePath {
    /// Number of parent links crossed.
    pub fn hops(&self) -> usize {
        self.up.len() + self.down.len()
    }
}

/// A tree of reference frames rooted at a single parentless frame.
///
/// Frames live in an arena and refer to their parent by [`FrameId`]. The tree
/// shape never changes once a frame is added, only the transform values of
/// the frames do, so the deepest common ancestor of every pair is memoized
/// forever.
///
/// Queries take `&self` and may run from several threads. Each transform from
/// parent is swapped as a whole under its own lock, but a refresh or a
/// control-frame update racing with a traversal of the same subtree is not
/// ordered: callers needing consistent snapshots must serialize them.
#[derive(Debug)]
pub struct FrameGraph {
    nodes: Vec<FrameNode>,
    names: HashMap<CompactString, FrameId>,
    commons: DashMap<(FrameId, FrameId), FrameId>,
    ancestor_misses: AtomicUsize,
    max_depth: usize,
    pub(crate) catalog: HashMap<CatalogFrame, FrameId>,
    pub(crate) models: CatalogModels,
}

impl FrameGraph {
    /// A graph holding only the root frame `J2000`.
    pub fn new() -> Self {
        Self::with_root(DEFAULT_ROOT_NAME, DEFAULT_MAX_DEPTH)
    }

    /// A graph holding only a root frame named `root_name`, refusing frames
    /// more than `max_depth` links away from the root.
    pub fn with_root(root_name: &str, max_depth: usize) -> Self {
        let name = CompactString::from(root_name);
        let root = FrameNode {
            name: name.clone(),
            parent: None,
            depth: 0,
            link: FrameLink::Fixed,
            transform: RwLock::new(Transform::identity()),
        };
        let mut names = HashMap::new();
        names.insert(name, FrameId(0));
        Self {
            nodes: vec![root],
            names,
            commons: DashMap::new(),
            ancestor_misses: AtomicUsize::new(0),
            max_depth,
            catalog: HashMap::new(),
            models: CatalogModels::default(),
        }
    }

    /// Attach the models used to build the dynamic catalog frames.
    pub fn with_catalog_models(mut self, models: CatalogModels) -> Self {
        self.models = models;
        self
    }

    pub fn root(&self) -> FrameId {
        FrameId(0)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn frame_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn frame_ids(&self) -> impl Iterator<Item = FrameId> + '_ {
        (0..self.nodes.len()).map(|i| FrameId(i as u32))
    }

    /// Add a frame defined by a constant transform from `parent`.
    pub fn add_frame(
        &mut self,
        parent: FrameId,
        name: &str,
        transform: Transform,
    ) -> FrameResult<FrameId> {
        self.insert_node(parent, name, FrameLink::Fixed, transform)
    }

    /// Add a frame whose transform from `parent` is recomputed by `provider`
    /// for each query date.
    pub fn add_dynamic_frame(
        &mut self,
        parent: FrameId,
        name: &str,
        provider: Arc<dyn TransformProvider>,
    ) -> FrameResult<FrameId> {
        self.insert_node(
            parent,
            name,
            FrameLink::Dynamic(provider),
            Transform::identity(),
        )
    }

    pub(crate) fn insert_node(
        &mut self,
        parent: FrameId,
        name: &str,
        link: FrameLink,
        transform: Transform,
    ) -> FrameResult<FrameId> {
        let parent_depth = self.node(parent)?.depth;
        if self.names.contains_key(name) {
            return Err(FrameError::DuplicateFrame(name.to_string()));
        }
        if parent_depth + 1 > self.max_depth {
            return Err(FrameError::TreeTooDeep {
                name: name.to_string(),
                max_depth: self.max_depth,
            });
        }

        let id = FrameId(self.nodes.len() as u32);
        let name = CompactString::from(name);
        debug!(
            "Adding frame '{}' ({}) under '{}' at depth {}",
            name,
            id,
            self.nodes[parent.index()].name,
            parent_depth + 1
        );
        self.nodes.push(FrameNode {
            name: name.clone(),
            parent: Some(parent),
            depth: parent_depth + 1,
            link,
            transform: RwLock::new(transform),
        });
        self.names.insert(name, id);
        Ok(id)
    }

    fn node(&self, id: FrameId) -> FrameResult<&FrameNode> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| FrameError::UnknownFrame(id.to_string()))
    }

    /// Look up a frame by name.
    pub fn find(&self, name: &str) -> Option<FrameId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: FrameId) -> FrameResult<&str> {
        Ok(self.node(id)?.name.as_str())
    }

    /// The parent of `id`, `None` for the root.
    pub fn parent(&self, id: FrameId) -> FrameResult<Option<FrameId>> {
        Ok(self.node(id)?.parent)
    }

    /// Number of links between `id` and the root.
    pub fn depth(&self, id: FrameId) -> FrameResult<usize> {
        Ok(self.node(id)?.depth)
    }

    pub fn is_dynamic(&self, id: FrameId) -> FrameResult<bool> {
        Ok(matches!(self.node(id)?.link, FrameLink::Dynamic(_)))
    }

    /// True when `ancestor` lies strictly above `frame`.
    pub fn is_descendant_of(&self, frame: FrameId, ancestor: FrameId) -> FrameResult<bool> {
        self.node(ancestor)?;
        Ok(self.path_to_root(frame)?.contains(&ancestor))
    }

    /// True when `frame` is `root` itself or one of its descendants.
    pub fn is_in_subtree(&self, frame: FrameId, root: FrameId) -> FrameResult<bool> {
        Ok(frame == root || self.is_descendant_of(frame, root)?)
    }

    /// Ancestors of `id`, from its parent up to the root. Empty for the root.
    pub fn path_to_root(&self, id: FrameId) -> FrameResult<Vec<FrameId>> {
        let mut path = Vec::with_capacity(self.node(id)?.depth);
        let mut current = self.node(id)?.parent;
        while let Some(frame) = current {
            if path.len() >= self.max_depth {
                return Err(FrameError::TreeTooDeep {
                    name: self.node(id)?.name.to_string(),
                    max_depth: self.max_depth,
                });
            }
            path.push(frame);
            current = self.node(frame)?.parent;
        }
        Ok(path)
    }

    /// Deepest frame lying on the lineage of both `a` and `b`, each frame
    /// being part of its own lineage.
    ///
    /// The answer only depends on the tree shape, so it is memoized for both
    /// `(a, b)` and `(b, a)` and never recomputed.
    pub fn find_common_ancestor(&self, a: FrameId, b: FrameId) -> FrameResult<FrameId> {
        if let Some(common) = self.commons.get(&(a, b)) {
            return Ok(*common);
        }

        let mut lineage_a = self.path_to_root(a)?;
        lineage_a.insert(0, a);
        let mut lineage_b = self.path_to_root(b)?;
        lineage_b.insert(0, b);

        // both lineages end at the root: walk them down from there until they split
        let mut common = self.root();
        for (from_a, from_b) in lineage_a.iter().rev().zip(lineage_b.iter().rev()) {
            if from_a != from_b {
                break;
            }
            common = *from_a;
        }

        self.ancestor_misses.fetch_add(1, Ordering::Relaxed);
        trace!(
            "Common ancestor of '{}' and '{}' is '{}'",
            self.nodes[a.index()].name,
            self.nodes[b.index()].name,
            self.nodes[common.index()].name
        );
        self.commons.insert((a, b), common);
        self.commons.insert((b, a), common);
        Ok(common)
    }

    /// Number of common ancestor computations that missed the cache.
    pub fn ancestor_cache_misses(&self) -> usize {
        self.ancestor_misses.load(Ordering::Relaxed)
    }

    /// The frames whose transforms make up the transform from `from` to `to`.
    pub fn path(&self, from: FrameId, to: FrameId) -> FrameResult<FramePath> {
        let common = self.find_common_ancestor(from, to)?;
        Ok(FramePath {
            common,
            up: self.lineage_below(from, common)?,
            down: self.lineage_below(to, common)?,
        })
    }

    fn lineage_below(&self, frame: FrameId, stop: FrameId) -> FrameResult<Vec<FrameId>> {
        let mut lineage = Vec::new();
        let mut current = frame;
        while current != stop {
            lineage.push(current);
            current = self
                .node(current)?
                .parent
                .ok_or_else(|| FrameError::UnknownFrame(stop.to_string()))?;
        }
        Ok(lineage)
    }

    /// Current transform from the parent of `id` to `id`, as last refreshed or
    /// installed.
    pub fn transform_from_parent(&self, id: FrameId) -> FrameResult<Transform> {
        Ok(self.node(id)?.current_transform())
    }

    /// Replace the transform from the parent of `id` to `id`.
    ///
    /// The transform of a dynamic frame is overwritten again at its next
    /// refresh.
    pub fn set_transform(&self, id: FrameId, transform: Transform) -> FrameResult<()> {
        let node = self.node(id)?;
        if node.parent.is_none() {
            return Err(FrameError::RootHasNoParent(node.name.to_string()));
        }
        node.install(transform);
        Ok(())
    }

    /// Bring a dynamic frame to `date`. Constant frames are left untouched.
    ///
    /// On failure the previous transform is kept and the error names the frame
    /// and the date.
    pub fn refresh(&self, id: FrameId, date: AbsoluteDate) -> FrameResult<()> {
        let node = self.node(id)?;
        if let FrameLink::Dynamic(provider) = &node.link {
            Self::evaluate(node, provider.as_ref(), date)?;
        }
        Ok(())
    }

    /// Compute the transform of a dynamic node at `date`, install it and hand
    /// it back, so the caller never sees a value installed for another date.
    fn evaluate(
        node: &FrameNode,
        provider: &dyn TransformProvider,
        date: AbsoluteDate,
    ) -> FrameResult<Transform> {
        let transform = provider.transform_at(date).map_err(|source| {
            warn!(
                "Frame '{}' could not be refreshed at {}: {}",
                node.name, date, source
            );
            FrameError::ModelData {
                frame: node.name.to_string(),
                date,
                source,
            }
        })?;
        trace!("Refreshed frame '{}' at {}", node.name, date);
        node.install(transform);
        Ok(transform)
    }

    fn edge_transform(&self, id: FrameId, date: Option<AbsoluteDate>) -> FrameResult<Transform> {
        let node = self.node(id)?;
        match (&node.link, date) {
            (FrameLink::Fixed, _) => Ok(node.current_transform()),
            (FrameLink::Dynamic(provider), Some(date)) => {
                Self::evaluate(node, provider.as_ref(), date)
            }
            (FrameLink::Dynamic(_), None) => Err(FrameError::DateRequired(node.name.to_string())),
        }
    }

    /// Transform from the common ancestor down to the first frame of `lineage`.
    fn aggregate(&self, lineage: &[FrameId], date: Option<AbsoluteDate>) -> FrameResult<Transform> {
        let mut aggregate = Transform::identity();
        for &frame in lineage {
            aggregate = Transform::compose(&self.edge_transform(frame, date)?, &aggregate);
        }
        Ok(aggregate)
    }

    fn compute_transform(
        &self,
        from: FrameId,
        to: FrameId,
        date: Option<AbsoluteDate>,
    ) -> FrameResult<Transform> {
        if from == to {
            self.node(from)?;
            return Ok(Transform::identity());
        }
        let path = self.path(from, to)?;
        let common_to_from = self.aggregate(&path.up, date)?;
        let common_to_to = self.aggregate(&path.down, date)?;
        Ok(Transform::compose(&common_to_from.inverse(), &common_to_to))
    }

    /// Transform from frame `from` to frame `to` at `date`.
    ///
    /// Every dynamic frame crossed, endpoints included but common ancestor
    /// excluded, is refreshed to `date` first.
    pub fn transform_to(
        &self,
        from: FrameId,
        to: FrameId,
        date: AbsoluteDate,
    ) -> FrameResult<Transform> {
        self.compute_transform(from, to, Some(date))
    }

    /// Transform from frame `from` to frame `to` for paths made only of
    /// constant frames. Fails with [`FrameError::DateRequired`] if a dynamic
    /// frame is crossed.
    pub fn static_transform_to(&self, from: FrameId, to: FrameId) -> FrameResult<Transform> {
        self.compute_transform(from, to, None)
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{FnProvider, ModelError};
    use crate::test_utils::{assert_transform_eq, sample_transform, SpinProvider};
    use nalgebra::{UnitQuaternion, Vector3};

    fn translation(x: f64, y: f64, z: f64) -> Transform {
        Transform::from_translation(Vector3::new(x, y, z))
    }

    /// root
    /// ├── a ── a1 ── a11
    /// │        └──── a12
    /// └── b ── b1
    fn sample_tree() -> (FrameGraph, [FrameId; 6]) {
        let mut graph = FrameGraph::new();
        let root = graph.root();
        let a = graph.add_frame(root, "a", translation(1.0, 0.0, 0.0)).unwrap();
        let a1 = graph.add_frame(a, "a1", sample_transform(0.3)).unwrap();
        let a11 = graph.add_frame(a1, "a11", sample_transform(-0.6)).unwrap();
        let a12 = graph.add_frame(a1, "a12", sample_transform(1.1)).unwrap();
        let b = graph.add_frame(root, "b", sample_transform(2.4)).unwrap();
        let b1 = graph.add_frame(b, "b1", translation(0.0, -3.0, 2.0)).unwrap();
        (graph, [a, a1, a11, a12, b, b1])
    }

    #[test]
    fn test_add_frame() {
        let mut graph = FrameGraph::new();
        let root = graph.root();
        let child = graph.add_frame(root, "child", Transform::identity()).unwrap();
        assert_eq!(graph.frame_count(), 2);
        assert_eq!(graph.name(root).unwrap(), "J2000");
        assert_eq!(graph.name(child).unwrap(), "child");
        assert_eq!(graph.parent(child).unwrap(), Some(root));
        assert_eq!(graph.parent(root).unwrap(), None);
        assert_eq!(graph.depth(child).unwrap(), 1);
        assert_eq!(graph.find("child"), Some(child));
        assert!(child > root);
    }

    #[test]
    fn test_duplicate_and_unknown_frames() {
        let mut graph = FrameGraph::new();
        let root = graph.root();
        graph.add_frame(root, "child", Transform::identity()).unwrap();
        assert!(matches!(
            graph.add_frame(root, "child", Transform::identity()),
            Err(FrameError::DuplicateFrame(_))
        ));
        assert!(matches!(
            graph.add_frame(FrameId(42), "orphan", Transform::identity()),
            Err(FrameError::UnknownFrame(_))
        ));
        assert!(graph.find("orphan").is_none());
    }

    #[test]
    fn test_depth_cap() {
        let mut graph = FrameGraph::with_root("root", 2);
        let f1 = graph.add_frame(graph.root(), "f1", Transform::identity()).unwrap();
        let f2 = graph.add_frame(f1, "f2", Transform::identity()).unwrap();
        let err = graph.add_frame(f2, "f3", Transform::identity()).unwrap_err();
        assert!(matches!(err, FrameError::TreeTooDeep { max_depth: 2, .. }));
        assert_eq!(graph.frame_count(), 3);
    }

    #[test]
    fn test_path_to_root() {
        let (graph, [a, a1, a11, ..]) = sample_tree();
        assert_eq!(graph.path_to_root(a11).unwrap(), vec![a1, a, graph.root()]);
        assert!(graph.path_to_root(graph.root()).unwrap().is_empty());
    }

    #[test]
    fn test_descendants() {
        let (graph, [a, a1, a11, _, b, _]) = sample_tree();
        assert!(graph.is_descendant_of(a11, a).unwrap());
        assert!(graph.is_descendant_of(a11, graph.root()).unwrap());
        assert!(!graph.is_descendant_of(a, a).unwrap());
        assert!(graph.is_in_subtree(a, a).unwrap());
        assert!(!graph.is_descendant_of(a1, b).unwrap());
        assert!(!graph.is_descendant_of(a, a11).unwrap());
    }

    #[test]
    fn test_common_ancestor_table() {
        let (graph, [a, a1, a11, a12, b, b1]) = sample_tree();
        let root = graph.root();
        let cases = [
            (a11, a12, a1),
            (a11, b1, root),
            (a11, a, a),
            (a, a11, a),
            (root, a12, root),
            (b1, root, root),
            (a12, a12, a12),
            (b, b1, b),
            (a1, b, root),
            // sibling of an ancestor
            (a12, a1, a1),
            (b1, a, root),
        ];
        for (x, y, expected) in cases {
            assert_eq!(graph.find_common_ancestor(x, y).unwrap(), expected, "{x} {y}");
            assert_eq!(graph.find_common_ancestor(y, x).unwrap(), expected, "{y} {x}");
        }
    }

    #[test]
    fn test_common_ancestor_is_memoized() {
        let (graph, [_, _, a11, a12, _, b1]) = sample_tree();
        assert_eq!(graph.ancestor_cache_misses(), 0);
        graph.find_common_ancestor(a11, b1).unwrap();
        assert_eq!(graph.ancestor_cache_misses(), 1);
        graph.find_common_ancestor(b1, a11).unwrap();
        graph.find_common_ancestor(a11, b1).unwrap();
        assert_eq!(graph.ancestor_cache_misses(), 1);
        graph.find_common_ancestor(a12, a11).unwrap();
        assert_eq!(graph.ancestor_cache_misses(), 2);
    }

    #[test]
    fn test_path_hops() {
        let (graph, [a, a1, a11, a12, _, b1]) = sample_tree();
        let path = graph.path(a11, a12).unwrap();
        assert_eq!(path.common, a1);
        assert_eq!(path.up, vec![a11]);
        assert_eq!(path.down, vec![a12]);

        let from_root = graph.path(graph.root(), a11).unwrap();
        assert!(from_root.up.is_empty());
        assert_eq!(from_root.down, vec![a11, a1, a]);
        assert_eq!(from_root.hops(), graph.depth(a11).unwrap());

        assert_eq!(graph.path(b1, a11).unwrap().hops(), 5);
        assert_eq!(graph.path(a11, a11).unwrap().hops(), 0);
    }

    #[test]
    fn test_transform_to_self_is_identity() {
        let (graph, frames) = sample_tree();
        for frame in frames.into_iter().chain([graph.root()]) {
            let t = graph
                .transform_to(frame, frame, AbsoluteDate::J2000_EPOCH)
                .unwrap();
            assert_transform_eq(&t, &Transform::identity(), 0.0);
        }
    }

    #[test]
    fn test_transform_down_a_chain() {
        let (graph, [a, a1, a11, ..]) = sample_tree();
        let expected = Transform::compose(
            &Transform::compose(
                &graph.transform_from_parent(a).unwrap(),
                &graph.transform_from_parent(a1).unwrap(),
            ),
            &graph.transform_from_parent(a11).unwrap(),
        );
        let t = graph.static_transform_to(graph.root(), a11).unwrap();
        assert_transform_eq(&t, &expected, 1e-12);
        let back = graph.static_transform_to(a11, graph.root()).unwrap();
        assert_transform_eq(&back, &expected.inverse(), 1e-12);
    }

    #[test]
    fn test_transform_across_branches() {
        let (graph, [_, _, a11, a12, _, b1]) = sample_tree();
        let date = AbsoluteDate::from_j2000_days(12.0);
        let direct = graph.transform_to(a11, b1, date).unwrap();
        let via = Transform::compose(
            &graph.transform_to(a11, a12, date).unwrap(),
            &graph.transform_to(a12, b1, date).unwrap(),
        );
        assert_transform_eq(&direct, &via, 1e-9);
        let round_trip = Transform::compose(&direct, &graph.transform_to(b1, a11, date).unwrap());
        assert_transform_eq(&round_trip, &Transform::identity(), 1e-9);
    }

    #[test]
    fn test_dynamic_frame_is_refreshed() {
        let mut graph = FrameGraph::new();
        let spin = graph
            .add_dynamic_frame(graph.root(), "spin", Arc::new(SpinProvider::new(0.5)))
            .unwrap();
        let tip = graph
            .add_frame(spin, "tip", translation(0.0, 0.0, 1.0))
            .unwrap();
        assert!(graph.is_dynamic(spin).unwrap());
        assert!(!graph.is_dynamic(tip).unwrap());

        let date = AbsoluteDate::from_j2000_seconds(2.0);
        let t = graph.transform_to(graph.root(), spin, date).unwrap();
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -1.0);
        assert!((t.rotation().inverse() * expected).imag().norm() < 1e-15);
        assert_transform_eq(&graph.transform_from_parent(spin).unwrap(), &t, 1e-15);

        // the dynamic frame is an intermediate hop here
        let later = date.shifted_by(2.0);
        graph.transform_to(tip, graph.root(), later).unwrap();
        let refreshed = graph.transform_from_parent(spin).unwrap();
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -2.0);
        assert!((refreshed.rotation().inverse() * expected).imag().norm() < 1e-15);
    }

    #[test]
    fn test_common_ancestor_is_not_refreshed() {
        let mut graph = FrameGraph::new();
        let spin = graph
            .add_dynamic_frame(graph.root(), "spin", Arc::new(SpinProvider::new(1.0)))
            .unwrap();
        let left = graph.add_frame(spin, "left", translation(1.0, 0.0, 0.0)).unwrap();
        let right = graph.add_frame(spin, "right", translation(-1.0, 0.0, 0.0)).unwrap();
        graph
            .transform_to(left, right, AbsoluteDate::from_j2000_seconds(3.0))
            .unwrap();
        assert_transform_eq(
            &graph.transform_from_parent(spin).unwrap(),
            &Transform::identity(),
            0.0,
        );
    }

    #[test]
    fn test_static_query_rejects_dynamic_frames() {
        let mut graph = FrameGraph::new();
        let spin = graph
            .add_dynamic_frame(graph.root(), "spin", Arc::new(SpinProvider::new(1.0)))
            .unwrap();
        let fixed = graph
            .add_frame(graph.root(), "fixed", translation(1.0, 2.0, 3.0))
            .unwrap();
        assert!(graph.static_transform_to(fixed, graph.root()).is_ok());
        assert!(matches!(
            graph.static_transform_to(fixed, spin),
            Err(FrameError::DateRequired(name)) if name == "spin"
        ));
    }

    #[test]
    fn test_model_failure_keeps_previous_transform() {
        let limit = AbsoluteDate::from_j2000_days(1.0);
        let provider = FnProvider::new("short table", move |date: AbsoluteDate| {
            if date > limit {
                Err(ModelError::DataUnavailable {
                    date,
                    reason: "end of table".to_string(),
                })
            } else {
                Ok(Transform::from_translation(Vector3::new(date.j2000_seconds(), 0.0, 0.0)))
            }
        });
        let mut graph = FrameGraph::new();
        let eop = graph
            .add_dynamic_frame(graph.root(), "eop", Arc::new(provider))
            .unwrap();

        graph.refresh(eop, limit).unwrap();
        let before = graph.transform_from_parent(eop).unwrap();

        let late = limit.shifted_by(60.0);
        let err = graph.transform_to(graph.root(), eop, late).unwrap_err();
        match err {
            FrameError::ModelData { frame, date, .. } => {
                assert_eq!(frame, "eop");
                assert_eq!(date, late);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(graph.transform_from_parent(eop).unwrap(), before);
    }

    #[test]
    fn test_set_transform() {
        let (graph, [a, ..]) = sample_tree();
        let t = translation(5.0, 5.0, 5.0);
        graph.set_transform(a, t).unwrap();
        assert_eq!(graph.transform_from_parent(a).unwrap(), t);
        assert!(matches!(
            graph.set_transform(graph.root(), t),
            Err(FrameError::RootHasNoParent(_))
        ));
    }

    #[test]
    fn test_graph_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameGraph>();

        let (graph, [_, _, a11, _, _, b1]) = sample_tree();
        let graph = Arc::new(graph);
        let expected = graph.static_transform_to(a11, b1).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let graph = Arc::clone(&graph);
                std::thread::spawn(move || graph.static_transform_to(a11, b1).unwrap())
            })
            .collect();
        for handle in handles {
            assert_transform_eq(&handle.join().unwrap(), &expected, 0.0);
        }
    }

    #[test]
    fn test_concurrent_queries_at_different_dates() {
        let mut graph = FrameGraph::new();
        let spin = graph
            .add_dynamic_frame(graph.root(), "spin", Arc::new(SpinProvider::new(0.25)))
            .unwrap();
        let tip = graph
            .add_frame(spin, "tip", translation(3.0, 0.0, 0.0))
            .unwrap();

        let dates: Vec<_> = (0..8)
            .map(|i| AbsoluteDate::from_j2000_seconds(4.0 * i as f64))
            .collect();
        let expected: Vec<_> = dates
            .iter()
            .map(|date| graph.transform_to(graph.root(), tip, *date).unwrap())
            .collect();

        let graph = Arc::new(graph);
        let handles: Vec<_> = dates
            .into_iter()
            .zip(expected)
            .map(|(date, expected)| {
                let graph = Arc::clone(&graph);
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let t = graph.transform_to(graph.root(), tip, date).unwrap();
                        assert_transform_eq(&t, &expected, 1e-12);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
