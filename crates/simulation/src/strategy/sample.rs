use super::{DetectionStrategy, Scene, StrategyConfig, Verdict};
use crate::SimulationError;
use watchman_types::{Position, RouterIndex};

/// Stateless proximity check: every router within `distance` (inclusive)
/// of the attacker is active and detects a transmission.
#[derive(Clone, Debug)]
pub struct SampleStrategy {
    distance: f64,
}

impl SampleStrategy {
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }

    pub fn config(&self) -> StrategyConfig {
        StrategyConfig::Sample {
            distance: self.distance,
        }
    }
}

impl DetectionStrategy for SampleStrategy {
    fn name(&self) -> &'static str {
        "Sample"
    }

    fn on_run_start(
        &mut self,
        _scene: &Scene<'_>,
        _alpha: Option<RouterIndex>,
    ) -> Result<(), SimulationError> {
        Ok(())
    }

    fn evaluate(
        &mut self,
        scene: &Scene<'_>,
        attacker: Position,
        transmitting: bool,
    ) -> Vec<Verdict> {
        scene
            .routers
            .iter()
            .map(|router| {
                let near = router.in_range(attacker, self.distance);
                Verdict {
                    active: near,
                    detects: near && transmitting,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchman_graph::StreetMap;
    use watchman_types::{EdgeRef, Router, RouterId, VertexId};

    fn router_at(x: f64) -> Router {
        Router {
            id: RouterId(0),
            index: RouterIndex(0),
            location: EdgeRef::new(VertexId(0), VertexId(1), 0.5),
            position: Position::new(x, 0.0),
            radius: 10.0,
            active: false,
            active_since: None,
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let map = StreetMap::new();
        let routers = [router_at(5.0)];
        let scene = Scene {
            map: &map,
            routers: &routers,
        };
        let mut strategy = SampleStrategy::new(2.0);

        let at_edge = strategy.evaluate(&scene, Position::new(3.0, 0.0), true);
        assert_eq!(
            at_edge,
            vec![Verdict {
                active: true,
                detects: true
            }]
        );

        let outside = strategy.evaluate(&scene, Position::new(3.0 - 1e-9, 0.0), true);
        assert_eq!(outside, vec![Verdict::default()]);
    }

    #[test]
    fn test_silent_tick_keeps_router_active() {
        let map = StreetMap::new();
        let routers = [router_at(5.0)];
        let scene = Scene {
            map: &map,
            routers: &routers,
        };
        let verdicts = SampleStrategy::new(2.0).evaluate(&scene, Position::new(5.0, 0.0), false);
        assert!(verdicts[0].active);
        assert!(!verdicts[0].detects);
    }
}
