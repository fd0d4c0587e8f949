//! Semi-implicit (symplectic) Euler.
//!
//! v ← v + (F/m)·Δt, then p ← p + v·Δt with the *updated* v. Swapping the two
//! lines gives explicit Euler, which drifts in energy on orbits.

use rayon::prelude::*;

use crate::config::ExecutionPolicy;

/// One axis of one particle array: positions, velocities and the net force.
#[derive(Debug)]
pub struct Axis<'a> {
    pub p: &'a mut [f64],
    pub v: &'a mut [f64],
    pub f: &'a [f64],
}

#[inline]
fn kick_drift(p: &mut f64, v: &mut f64, f: f64, m: f64, dt: f64) {
    *v += f / m * dt;
    *p += *v * dt;
}

/// Advance every particle on every axis by `dt`.
///
/// Each index only touches its own slots, so the parallel path produces the
/// same bits as the sequential one. Masses are assumed positive; the store
/// guarantees it.
pub fn semi_implicit_euler(axes: [Axis<'_>; 3], m: &[f64], dt: f64, policy: ExecutionPolicy) {
    for axis in axes {
        match policy {
            ExecutionPolicy::Sequential => {
                let rows = axis.p.iter_mut().zip(axis.v.iter_mut()).zip(axis.f).zip(m);
                for (((p, v), &f), &mi) in rows {
                    kick_drift(p, v, f, mi, dt);
                }
            }
            ExecutionPolicy::Parallel => {
                axis.p
                    .par_iter_mut()
                    .zip(axis.v.par_iter_mut())
                    .zip(axis.f.par_iter())
                    .zip(m.par_iter())
                    .for_each(|(((p, v), &f), &mi)| kick_drift(p, v, f, mi, dt));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(policy: ExecutionPolicy) -> (Vec<f64>, Vec<f64>) {
        let mut p = vec![0.0, 1.0, -2.0];
        let mut v = vec![0.0, 0.5, 1.0];
        let f = vec![2.0, 0.0, -4.0];
        let (mut py, mut vy, fy) = (vec![0.0; 3], vec![0.0; 3], vec![0.0; 3]);
        let (mut pz, mut vz, fz) = (vec![0.0; 3], vec![0.0; 3], vec![0.0; 3]);
        let m = [1.0, 2.0, 4.0];
        semi_implicit_euler(
            [
                Axis { p: &mut p, v: &mut v, f: &f },
                Axis { p: &mut py, v: &mut vy, f: &fy },
                Axis { p: &mut pz, v: &mut vz, f: &fz },
            ],
            &m,
            0.5,
            policy,
        );
        (p, v)
    }

    #[test]
    fn velocity_first_then_position() {
        let (p, v) = run(ExecutionPolicy::Sequential);
        // v0 = 0 + 2/1*0.5 = 1, p0 = 0 + 1*0.5
        assert_eq!(v[0], 1.0);
        assert_eq!(p[0], 0.5);
        // no force: straight drift
        assert_eq!(v[1], 0.5);
        assert_eq!(p[1], 1.25);
        // v2 = 1 - 4/4*0.5 = 0.5, p2 = -2 + 0.25
        assert_eq!(v[2], 0.5);
        assert_eq!(p[2], -1.75);
    }

    #[test]
    fn parallel_is_bit_identical() {
        assert_eq!(run(ExecutionPolicy::Sequential), run(ExecutionPolicy::Parallel));
    }
}
