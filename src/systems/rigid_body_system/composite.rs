use rapier2d::na::{Isometry2, Point2, Vector2};
use rapier2d::prelude::{Real, RigidBodyHandle, RigidBodySet};

/// A kinematic member and its collider half extents (meters).
#[derive(Clone, Copy, Debug)]
pub(super) struct Member {
    pub handle: RigidBodyHandle,
    pub half_extents: Vector2<Real>,
}

/// Kinematic bodies turned together about a pivot.
///
/// A requested rotation is not applied at once. It is queued and handed out
/// in slices across the substeps of the next step, so the walls sweep through
/// the space between poses and the solver sees their velocity.
pub(super) struct KinematicComposite {
    members: Vec<Member>,
    pivot: Vector2<Real>,
    pending: Real,
    /// Largest distance from the pivot to any member corner.
    reach: Real,
    /// Half the thinnest member dimension; no point may travel further in one substep.
    max_travel: Real,
}

impl KinematicComposite {
    pub fn new(members: Vec<Member>) -> Self {
        let max_travel = members
            .iter()
            .map(|m| m.half_extents.x.min(m.half_extents.y))
            .fold(Real::INFINITY, Real::min);
        Self {
            members,
            pivot: Vector2::zeros(),
            pending: 0.0,
            reach: 0.0,
            max_travel,
        }
    }

    pub fn queue_rotation(&mut self, delta: Real, pivot: Vector2<Real>, bodies: &RigidBodySet) {
        self.pivot = pivot;
        self.pending += delta;
        self.reach = self
            .members
            .iter()
            .filter_map(|m| bodies.get(m.handle).map(|body| corner_reach(body.position(), m.half_extents, pivot)))
            .fold(0.0, Real::max);
    }

    pub fn is_idle(&self) -> bool {
        self.pending == 0.0
    }

    /// Substeps needed to turn the queued angle without any member point
    /// moving more than `max_travel` per substep.
    pub fn substeps_needed(&self) -> u32 {
        if self.is_idle() || !(self.max_travel > 0.0 && self.max_travel.is_finite()) {
            return 1;
        }
        let sweep = self.pending.abs() * self.reach / self.max_travel;
        (sweep.ceil() as u32).max(1)
    }

    /// Sets the next kinematic pose of every member for one of `substeps` slices.
    pub fn advance(&self, substeps: u32, bodies: &mut RigidBodySet) {
        if self.is_idle() {
            return;
        }
        let slice = self.pending / substeps.max(1) as Real;
        for member in &self.members {
            let Some(body) = bodies.get_mut(member.handle) else {
                continue;
            };
            let current = *body.next_position();
            let offset = current.translation.vector - self.pivot;
            let turned = Isometry2::rotation(slice) * Point2::from(offset);
            let angle = current.rotation.angle() + slice;
            body.set_next_kinematic_position(Isometry2::new(self.pivot + turned.coords, angle));
        }
    }

    pub fn finish(&mut self) {
        self.pending = 0.0;
    }
}

fn corner_reach(position: &Isometry2<Real>, half_extents: Vector2<Real>, pivot: Vector2<Real>) -> Real {
    [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)]
        .into_iter()
        .map(|(sx, sy)| {
            let corner = position.transform_point(&Point2::new(sx * half_extents.x, sy * half_extents.y));
            (corner.coords - pivot).norm()
        })
        .fold(0.0, Real::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier2d::prelude::RigidBodyBuilder;

    fn wall(bodies: &mut RigidBodySet, x: Real, y: Real, hx: Real, hy: Real) -> Member {
        let handle = bodies.insert(RigidBodyBuilder::kinematic_position_based().translation(Vector2::new(x, y)).build());
        Member {
            handle,
            half_extents: Vector2::new(hx, hy),
        }
    }

    #[test]
    fn fast_turns_need_more_substeps() {
        let mut bodies = RigidBodySet::new();
        let members = vec![wall(&mut bodies, 5.0, 0.0, 0.5, 5.0), wall(&mut bodies, -5.0, 0.0, 0.5, 5.0)];
        let mut composite = KinematicComposite::new(members);
        assert_eq!(composite.substeps_needed(), 1);

        composite.queue_rotation(0.01, Vector2::zeros(), &bodies);
        let slow = composite.substeps_needed();
        composite.queue_rotation(0.29, Vector2::zeros(), &bodies);
        let fast = composite.substeps_needed();

        // Corner reach |(5.5, 5)| ~ 7.43 and max travel 0.5: 0.3 rad sweeps ~4.46 travels.
        assert_eq!(slow, 1);
        assert_eq!(fast, 5);
    }

    #[test]
    fn advance_slices_the_queued_angle() {
        let mut bodies = RigidBodySet::new();
        let member = wall(&mut bodies, 4.0, 0.0, 0.5, 0.5);
        let mut composite = KinematicComposite::new(vec![member]);
        composite.queue_rotation(std::f32::consts::FRAC_PI_2, Vector2::zeros(), &bodies);

        composite.advance(2, &mut bodies);
        let next = *bodies[member.handle].next_position();
        assert!((next.rotation.angle() - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
        assert!((next.translation.vector.norm() - 4.0).abs() < 1e-4);

        composite.finish();
        assert!(composite.is_idle());
    }
}
