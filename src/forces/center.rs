//! Center force: a linear spring pulling every node toward a target point.

use super::{ForceContext, ForceOperator, ForceSetup};
use crate::node::Point;

/// Pulls nodes toward `center` in proportion to their signed offset
#[derive(Debug, Clone, PartialEq)]
pub struct CenterForce {
    pub center: Point,
    pub strength: f64,
}

impl CenterForce {
    pub fn new(center: Point, strength: f64) -> Self {
        Self { center, strength }
    }
}

impl Default for CenterForce {
    fn default() -> Self {
        Self::new(Point::default(), 0.1)
    }
}

impl ForceOperator for CenterForce {
    fn initialize(&mut self, _setup: &mut ForceSetup<'_>) {}

    fn apply(&mut self, ctx: &mut ForceContext<'_>) {
        let k = self.strength * ctx.alpha;
        let axes = ctx.dimensions.count();
        for node in ctx.nodes.iter_mut() {
            for axis in 0..axes {
                let dv = (self.center.axis(axis) - node.coord(axis)) * k;
                node.accelerate(axis, dv);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::test_support::{nodes, run_once};

    #[test]
    fn pulls_toward_center_proportionally() {
        let mut nodes = nodes(&[(10.0, 0.0), (0.0, -20.0)]);
        let mut force = CenterForce::new(Point::default(), 0.5);
        run_once(&mut force, &mut nodes, &[], 1.0);

        assert_eq!(nodes[0].vx, -5.0);
        assert_eq!(nodes[0].vy, 0.0);
        assert_eq!(nodes[1].vy, 10.0);
    }

    #[test]
    fn scales_with_alpha() {
        let mut nodes = nodes(&[(10.0, 10.0)]);
        let mut force = CenterForce::new(Point::new_2d(20.0, 10.0), 1.0);
        run_once(&mut force, &mut nodes, &[], 0.25);

        assert_eq!(nodes[0].vx, 2.5);
        assert_eq!(nodes[0].vy, 0.0);
    }

    #[test]
    fn leaves_fixed_nodes_alone() {
        let mut nodes = nodes(&[(10.0, 10.0)]);
        nodes[0].fx = Some(10.0);
        nodes[0].fy = Some(10.0);
        let mut force = CenterForce::default();
        run_once(&mut force, &mut nodes, &[], 1.0);

        assert_eq!((nodes[0].vx, nodes[0].vy), (0.0, 0.0));
    }
}
