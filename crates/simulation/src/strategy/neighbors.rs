use super::{DetectionStrategy, Scene, StrategyConfig, Verdict};
use crate::SimulationError;
use tracing::debug;
use watchman_graph::DistanceCache;
use watchman_types::{Position, RouterIndex};

/// k-smartest-neighbours hand-over.
///
/// Only routers in the *awake set* listen. A router is active iff awake and
/// detects iff awake on a transmitting tick. After a tick in which at least
/// one router detected the attacker, the awake set becomes the detecting
/// routers plus their neighbour lists; a tick without detections keeps it.
///
/// A router's neighbours are its `k` nearest other routers by street
/// distance, limited to `distance`, ties broken by index. With `lazy` unset
/// every list is computed in `prepare`; otherwise lists are computed on
/// first use and memoised. Lists and cached distances belong to one map
/// build and one router count; either changing drops them all.
///
/// At run start the awake set is the alpha router and its neighbours, or
/// every router when no alpha router is given.
#[derive(Clone, Debug)]
pub struct NeighborStrategy {
    k: usize,
    distance: f64,
    lazy: bool,
    /// Memoised neighbour list per router index.
    neighbors: Vec<Option<Vec<RouterIndex>>>,
    cache: DistanceCache,
    /// Map generation and router count the memo was built for.
    prepared_for: Option<(u64, usize)>,
    awake: Vec<bool>,
}

impl NeighborStrategy {
    pub fn new(k: usize, distance: f64, lazy: bool) -> Self {
        Self {
            k,
            distance,
            lazy,
            neighbors: Vec::new(),
            cache: DistanceCache::new(),
            prepared_for: None,
            awake: Vec::new(),
        }
    }

    pub fn config(&self) -> StrategyConfig {
        StrategyConfig::KSmartestNeighbors {
            k: self.k,
            distance: self.distance,
            lazy: self.lazy,
        }
    }

    /// Number of neighbour lists computed so far.
    pub fn computed_lists(&self) -> usize {
        self.neighbors.iter().filter(|n| n.is_some()).count()
    }

    /// Routers currently listening, in index order.
    pub fn awake(&self) -> Vec<RouterIndex> {
        self.awake
            .iter()
            .enumerate()
            .filter(|(_, &awake)| awake)
            .map(|(i, _)| RouterIndex(i))
            .collect()
    }

    /// Neighbour list of a router, computing it if needed.
    pub fn neighbors_of(
        &mut self,
        scene: &Scene<'_>,
        index: RouterIndex,
    ) -> Result<&[RouterIndex], SimulationError> {
        self.invalidate_if_stale(scene);
        let i = index.get();
        if i >= self.neighbors.len() {
            return Err(SimulationError::OutOfRange {
                index: i,
                count: self.neighbors.len(),
            });
        }
        if self.neighbors[i].is_none() {
            let list = self.compute(scene, index)?;
            self.neighbors[i] = Some(list);
        }
        Ok(self.neighbors[i].as_deref().unwrap_or(&[]))
    }

    /// Drop every memoised list when the map or the router set changed.
    /// Returns whether anything was dropped.
    fn invalidate_if_stale(&mut self, scene: &Scene<'_>) -> bool {
        let key = (scene.map.generation(), scene.routers.len());
        if self.prepared_for == Some(key) {
            return false;
        }
        let dropped = self.computed_lists() > 0 || !self.cache.is_empty();
        self.neighbors.clear();
        self.neighbors.resize(scene.routers.len(), None);
        self.cache.clear();
        self.prepared_for = Some(key);
        dropped
    }

    fn compute(
        &mut self,
        scene: &Scene<'_>,
        index: RouterIndex,
    ) -> Result<Vec<RouterIndex>, SimulationError> {
        let me = &scene.routers[index.get()];
        let mut candidates = Vec::new();
        for other in scene.routers {
            if other.index == index {
                continue;
            }
            let d = scene
                .map
                .network_distance(&mut self.cache, me.location, other.location)?;
            if d <= self.distance {
                candidates.push((d, other.index));
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        candidates.truncate(self.k);
        Ok(candidates.into_iter().map(|(_, i)| i).collect())
    }

    fn wake_with_neighbors(
        &mut self,
        scene: &Scene<'_>,
        centers: &[RouterIndex],
    ) -> Result<(), SimulationError> {
        let mut awake = vec![false; scene.routers.len()];
        for &center in centers {
            if let Some(slot) = awake.get_mut(center.get()) {
                *slot = true;
            }
            for &n in self.neighbors_of(scene, center)? {
                awake[n.get()] = true;
            }
        }
        self.awake = awake;
        Ok(())
    }
}

impl DetectionStrategy for NeighborStrategy {
    fn name(&self) -> &'static str {
        "KSmartestNeighbors"
    }

    fn prepare(&mut self, scene: &Scene<'_>) -> Result<(), SimulationError> {
        if self.invalidate_if_stale(scene) {
            debug!(routers = scene.routers.len(), "Neighbour lists invalidated");
        }
        if self.lazy {
            return Ok(());
        }
        let before = self.computed_lists();
        for i in 0..scene.routers.len() {
            self.neighbors_of(scene, RouterIndex(i))?;
        }
        let computed = self.computed_lists() - before;
        if computed > 0 {
            debug!(computed, k = self.k, "Precomputed neighbour lists");
        }
        Ok(())
    }

    fn on_run_start(
        &mut self,
        scene: &Scene<'_>,
        alpha: Option<RouterIndex>,
    ) -> Result<(), SimulationError> {
        match alpha {
            Some(alpha) => self.wake_with_neighbors(scene, &[alpha]),
            None => {
                self.awake = vec![true; scene.routers.len()];
                Ok(())
            }
        }
    }

    fn evaluate(
        &mut self,
        scene: &Scene<'_>,
        _attacker: Position,
        transmitting: bool,
    ) -> Vec<Verdict> {
        self.awake.resize(scene.routers.len(), false);
        self.awake
            .iter()
            .map(|&awake| Verdict {
                active: awake,
                detects: awake && transmitting,
            })
            .collect()
    }

    fn on_detections(
        &mut self,
        scene: &Scene<'_>,
        detected: &[RouterIndex],
    ) -> Result<(), SimulationError> {
        if detected.is_empty() {
            return Ok(());
        }
        self.wake_with_neighbors(scene, detected)
    }
}
