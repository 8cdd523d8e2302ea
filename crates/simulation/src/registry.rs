//! Deployed routers and their activation state.

use crate::SimulationError;
use std::collections::HashMap;
use tracing::trace;
use watchman_types::{EdgeRef, Position, Router, RouterId, RouterIndex, Tick};

/// Insertion-ordered router store.
///
/// Indices are dense and 0-based; a router keeps its index until the
/// registry is cleared.
#[derive(Debug, Clone, Default)]
pub struct RouterRegistry {
    routers: Vec<Router>,
    by_id: HashMap<RouterId, RouterIndex>,
}

impl RouterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a router at an already resolved position.
    ///
    /// Endpoint validation is the caller's job since only the caller holds
    /// the street map.
    pub fn add(
        &mut self,
        id: RouterId,
        location: EdgeRef,
        position: Position,
        radius: f64,
    ) -> Result<RouterIndex, SimulationError> {
        if self.by_id.contains_key(&id) {
            return Err(SimulationError::DuplicateRouter(id));
        }
        if !(0.0..=1.0).contains(&location.fraction) {
            return Err(SimulationError::InvalidFraction(location.fraction));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(SimulationError::InvalidParameter {
                name: "radius",
                value: radius,
            });
        }

        let index = RouterIndex(self.routers.len());
        self.routers.push(Router {
            id,
            index,
            location,
            position,
            radius,
            active: false,
            active_since: None,
        });
        self.by_id.insert(id, index);
        Ok(index)
    }

    /// Router at a dense index.
    pub fn get(&self, index: RouterIndex) -> Result<&Router, SimulationError> {
        self.routers
            .get(index.get())
            .ok_or(SimulationError::OutOfRange {
                index: index.get(),
                count: self.routers.len(),
            })
    }

    /// Dense index of a router id.
    pub fn index_of(&self, id: RouterId) -> Result<RouterIndex, SimulationError> {
        self.by_id
            .get(&id)
            .copied()
            .ok_or(SimulationError::UnknownId(id))
    }

    /// All routers in index order.
    pub fn as_slice(&self) -> &[Router] {
        &self.routers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Router> {
        self.routers.iter()
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    /// Number of currently active routers.
    pub fn active_count(&self) -> usize {
        self.routers.iter().filter(|r| r.active).count()
    }

    /// Apply an activation decision, returning the new state if it changed.
    pub(crate) fn set_active(
        &mut self,
        index: RouterIndex,
        active: bool,
        tick: Tick,
    ) -> Option<bool> {
        let router = self.routers.get_mut(index.get())?;
        if router.active == active {
            return None;
        }
        router.active = active;
        router.active_since = active.then_some(tick);
        trace!(router = %index, active, tick = %tick, "Router transition");
        Some(active)
    }

    /// Deactivate every router without emitting transitions.
    pub(crate) fn clear_activity(&mut self) {
        for router in &mut self.routers {
            router.active = false;
            router.active_since = None;
        }
    }

    /// Drop every router.
    pub(crate) fn clear(&mut self) {
        self.routers.clear();
        self.by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchman_types::VertexId;

    fn edge(fraction: f64) -> EdgeRef {
        EdgeRef::new(VertexId(0), VertexId(1), fraction)
    }

    fn registry_with(ids: &[u32]) -> RouterRegistry {
        let mut registry = RouterRegistry::new();
        for &id in ids {
            registry
                .add(RouterId(id), edge(0.5), Position::new(5.0, 0.0), 1.0)
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_indices_are_dense_in_insertion_order() {
        let registry = registry_with(&[42, 7, 19]);
        assert_eq!(registry.len(), 3);
        for (i, id) in [42, 7, 19].into_iter().enumerate() {
            let index = registry.index_of(RouterId(id)).unwrap();
            assert_eq!(index, RouterIndex(i));
            assert_eq!(registry.get(index).unwrap().id, RouterId(id));
        }
    }

    #[test]
    fn test_rejections_leave_registry_unchanged() {
        let mut registry = registry_with(&[1]);

        let err = registry
            .add(RouterId(1), edge(0.5), Position::default(), 1.0)
            .unwrap_err();
        assert_eq!(err, SimulationError::DuplicateRouter(RouterId(1)));

        let err = registry
            .add(RouterId(2), edge(1.5), Position::default(), 1.0)
            .unwrap_err();
        assert_eq!(err, SimulationError::InvalidFraction(1.5));

        let err = registry
            .add(RouterId(3), edge(0.5), Position::default(), -1.0)
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter { .. }));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_failures() {
        let registry = registry_with(&[1, 2]);
        assert_eq!(
            registry.get(RouterIndex(2)).unwrap_err(),
            SimulationError::OutOfRange { index: 2, count: 2 }
        );
        assert_eq!(
            registry.index_of(RouterId(99)).unwrap_err(),
            SimulationError::UnknownId(RouterId(99))
        );
    }

    #[test]
    fn test_set_active_reports_transitions_only() {
        let mut registry = registry_with(&[1]);
        let index = RouterIndex(0);

        assert_eq!(registry.set_active(index, true, Tick(3)), Some(true));
        assert_eq!(registry.get(index).unwrap().active_since, Some(Tick(3)));
        assert_eq!(registry.set_active(index, true, Tick(4)), None);
        assert_eq!(registry.get(index).unwrap().active_since, Some(Tick(3)));
        assert_eq!(registry.active_count(), 1);

        assert_eq!(registry.set_active(index, false, Tick(5)), Some(false));
        assert_eq!(registry.get(index).unwrap().active_since, None);

        registry.set_active(index, true, Tick(6));
        registry.clear_activity();
        assert_eq!(registry.active_count(), 0);
    }
}
