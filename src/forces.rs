//! Net force evaluation over structure-of-arrays particle data.
//!
//! F[i] = Σ_{j≠i} G·m_i·m_j·(p_j − p_i)/(|p_j − p_i|² + ε²)^{3/2}
//!        + F_ext[i] + F_global
//!
//! The pairwise phase is O(n²). Under [`ExecutionPolicy::Sequential`] each
//! unordered pair is visited once and its force is added to i and subtracted
//! from j. Under [`ExecutionPolicy::Parallel`] every index scans all others
//! and writes only its own slot, so workers never share an accumulator.

use rayon::prelude::*;

use crate::config::ExecutionPolicy;
use crate::error::SimError;
use crate::vector::Vec3;

/// Below this many particles the parallel pairwise pass falls back to the
/// symmetric loop; thread dispatch costs more than it saves.
const PAR_PAIRWISE_MIN: usize = 64;

/// Per-particle external forces, one slice per axis.
///
/// An empty slice means "no external force on this axis". A non-empty slice
/// must hold exactly one entry per particle; anything else is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalForces<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub z: &'a [f64],
}

impl<'a> ExternalForces<'a> {
    pub const fn new(x: &'a [f64], y: &'a [f64], z: &'a [f64]) -> Self {
        ExternalForces { x, y, z }
    }

    pub const fn none() -> Self {
        ExternalForces { x: &[], y: &[], z: &[] }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty() && self.z.is_empty()
    }

    /// Check every non-empty axis against the particle count.
    pub fn validate(&self, n: usize) -> Result<(), SimError> {
        for (axis, values) in [('x', self.x), ('y', self.y), ('z', self.z)] {
            if !values.is_empty() && values.len() != n {
                return Err(SimError::ExternalForceLength {
                    axis,
                    expected: n,
                    actual: values.len(),
                });
            }
            if let Some(index) = values.iter().position(|f| !f.is_finite()) {
                return Err(SimError::NonFinite { field: "external force", index });
            }
        }
        Ok(())
    }

    /// Force on particle `i`; absent axes contribute zero.
    pub fn at(&self, i: usize) -> Vec3 {
        Vec3::new(
            self.x.get(i).copied().unwrap_or(0.0),
            self.y.get(i).copied().unwrap_or(0.0),
            self.z.get(i).copied().unwrap_or(0.0),
        )
    }
}

/// Read-only view of the position arrays.
#[derive(Debug, Clone, Copy)]
pub struct Positions<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub z: &'a [f64],
}

/// Mutable view of the force accumulators.
#[derive(Debug)]
pub struct ForceAccumulators<'a> {
    pub x: &'a mut [f64],
    pub y: &'a mut [f64],
    pub z: &'a mut [f64],
}

/// 1/(r² + ε²)^{3/2}, computed as the cube of the inverse root.
///
/// This is the only softened kernel in the crate; the reference oracle calls
/// it too so both engines round identically.
#[inline]
pub fn softened_inv_r3(r2: f64, eps2: f64) -> f64 {
    let inv_r = 1.0 / (r2 + eps2).sqrt();
    inv_r * inv_r * inv_r
}

/// Overwrite `out` with the net force on every particle.
///
/// Inputs are validated before `out` is touched; on error the accumulators
/// keep whatever they held.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_forces(
    pos: Positions<'_>,
    m: &[f64],
    gm: &[f64],
    eps2: f64,
    external: ExternalForces<'_>,
    global: Vec3,
    mut out: ForceAccumulators<'_>,
    policy: ExecutionPolicy,
) -> Result<(), SimError> {
    let n = m.len();
    external.validate(n)?;
    if !global.is_finite() {
        return Err(SimError::NonFinite { field: "global force", index: 0 });
    }

    zero_forces(&mut out, policy);
    accumulate_pairwise(pos, m, gm, eps2, &mut out, policy);
    add_external(&mut out, external, policy);
    add_global(&mut out, global, policy);
    Ok(())
}

pub fn zero_forces(out: &mut ForceAccumulators<'_>, policy: ExecutionPolicy) {
    match policy {
        ExecutionPolicy::Sequential => {
            out.x.fill(0.0);
            out.y.fill(0.0);
            out.z.fill(0.0);
        }
        ExecutionPolicy::Parallel => {
            out.x.par_iter_mut().for_each(|f| *f = 0.0);
            out.y.par_iter_mut().for_each(|f| *f = 0.0);
            out.z.par_iter_mut().for_each(|f| *f = 0.0);
        }
    }
}

/// Add the gravitational pull of every other particle into `out`.
pub fn accumulate_pairwise(
    pos: Positions<'_>,
    m: &[f64],
    gm: &[f64],
    eps2: f64,
    out: &mut ForceAccumulators<'_>,
    policy: ExecutionPolicy,
) {
    let n = m.len();
    if n < 2 {
        return;
    }
    if policy == ExecutionPolicy::Parallel && n >= PAR_PAIRWISE_MIN {
        pairwise_owned(pos, m, gm, eps2, out);
    } else {
        pairwise_symmetric(pos, m, gm, eps2, out);
    }
}

// Each unordered pair once: +f on i, -f on j.
fn pairwise_symmetric(
    pos: Positions<'_>,
    m: &[f64],
    gm: &[f64],
    eps2: f64,
    out: &mut ForceAccumulators<'_>,
) {
    let n = m.len();
    for i in 0..n {
        let (xi, yi, zi) = (pos.x[i], pos.y[i], pos.z[i]);
        let gmi = gm[i];
        for j in (i + 1)..n {
            let rx = pos.x[j] - xi;
            let ry = pos.y[j] - yi;
            let rz = pos.z[j] - zi;
            let r2 = rx * rx + ry * ry + rz * rz;

            let f = gmi * m[j] * softened_inv_r3(r2, eps2);
            let (fx, fy, fz) = (f * rx, f * ry, f * rz);

            out.x[i] += fx;
            out.x[j] -= fx;
            out.y[i] += fy;
            out.y[j] -= fy;
            out.z[i] += fz;
            out.z[j] -= fz;
        }
    }
}

// Each index sums the force on itself only; no slot is written by two workers.
fn pairwise_owned(
    pos: Positions<'_>,
    m: &[f64],
    gm: &[f64],
    eps2: f64,
    out: &mut ForceAccumulators<'_>,
) {
    let n = m.len();
    out.x
        .par_iter_mut()
        .zip(out.y.par_iter_mut())
        .zip(out.z.par_iter_mut())
        .enumerate()
        .for_each(|(i, ((fxi, fyi), fzi))| {
            let (xi, yi, zi) = (pos.x[i], pos.y[i], pos.z[i]);
            let gmi = gm[i];
            let (mut ax, mut ay, mut az) = (0.0, 0.0, 0.0);
            for j in 0..n {
                if j == i {
                    continue;
                }
                let rx = pos.x[j] - xi;
                let ry = pos.y[j] - yi;
                let rz = pos.z[j] - zi;
                let r2 = rx * rx + ry * ry + rz * rz;

                let f = gmi * m[j] * softened_inv_r3(r2, eps2);
                ax += f * rx;
                ay += f * ry;
                az += f * rz;
            }
            *fxi += ax;
            *fyi += ay;
            *fzi += az;
        });
}

pub fn add_external(
    out: &mut ForceAccumulators<'_>,
    external: ExternalForces<'_>,
    policy: ExecutionPolicy,
) {
    for (acc, ext) in [
        (&mut *out.x, external.x),
        (&mut *out.y, external.y),
        (&mut *out.z, external.z),
    ] {
        if ext.is_empty() {
            continue;
        }
        match policy {
            ExecutionPolicy::Sequential => acc.iter_mut().zip(ext).for_each(|(f, e)| *f += e),
            ExecutionPolicy::Parallel => {
                acc.par_iter_mut().zip(ext.par_iter()).for_each(|(f, e)| *f += e)
            }
        }
    }
}

pub fn add_global(out: &mut ForceAccumulators<'_>, global: Vec3, policy: ExecutionPolicy) {
    for (acc, g) in [(&mut *out.x, global.x), (&mut *out.y, global.y), (&mut *out.z, global.z)] {
        match policy {
            ExecutionPolicy::Sequential => acc.iter_mut().for_each(|f| *f += g),
            ExecutionPolicy::Parallel => acc.par_iter_mut().for_each(|f| *f += g),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Arrays {
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        m: Vec<f64>,
        gm: Vec<f64>,
        fx: Vec<f64>,
        fy: Vec<f64>,
        fz: Vec<f64>,
    }

    impl Arrays {
        fn new(points: &[[f64; 3]], masses: &[f64], g: f64) -> Self {
            let n = points.len();
            Arrays {
                x: points.iter().map(|p| p[0]).collect(),
                y: points.iter().map(|p| p[1]).collect(),
                z: points.iter().map(|p| p[2]).collect(),
                m: masses.to_vec(),
                gm: masses.iter().map(|m| g * m).collect(),
                fx: vec![f64::NAN; n],
                fy: vec![f64::NAN; n],
                fz: vec![f64::NAN; n],
            }
        }

        fn eval(
            &mut self,
            eps2: f64,
            ext: ExternalForces<'_>,
            global: Vec3,
            policy: ExecutionPolicy,
        ) -> Result<(), SimError> {
            evaluate_forces(
                Positions { x: &self.x, y: &self.y, z: &self.z },
                &self.m,
                &self.gm,
                eps2,
                ext,
                global,
                ForceAccumulators { x: &mut self.fx, y: &mut self.fy, z: &mut self.fz },
                policy,
            )
        }
    }

    #[test]
    fn empty_system_is_a_no_op() {
        let mut a = Arrays::new(&[], &[], 1.0);
        a.eval(1e-8, ExternalForces::none(), Vec3::new(1.0, 2.0, 3.0), ExecutionPolicy::Sequential)
            .unwrap();
        assert!(a.fx.is_empty());
    }

    #[test]
    fn single_particle_feels_only_external_and_global() {
        let mut a = Arrays::new(&[[3.0, -1.0, 8.0]], &[5.0], 1.0);
        let ext = [0.5];
        let global = Vec3::new(1.0, 2.0, 3.0);
        a.eval(1e-8, ExternalForces::new(&ext, &[], &[]), global, ExecutionPolicy::Sequential)
            .unwrap();
        assert_eq!((a.fx[0], a.fy[0], a.fz[0]), (1.5, 2.0, 3.0));
    }

    #[test]
    fn two_bodies_attract_with_inverse_square() {
        let g = 2.0;
        let mut a = Arrays::new(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]], &[3.0, 5.0], g);
        a.eval(0.0, ExternalForces::none(), Vec3::zero(), ExecutionPolicy::Sequential).unwrap();

        let expected = g * 3.0 * 5.0 / 4.0;
        assert_relative_eq!(a.fx[0], expected, max_relative = 1e-14);
        assert_relative_eq!(a.fx[1], -expected, max_relative = 1e-14);
        assert_eq!(a.fy[0], 0.0);
        assert_eq!(a.fz[1], 0.0);
    }

    #[test]
    fn mismatched_external_length_is_rejected_untouched() {
        let mut a = Arrays::new(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &[1.0, 1.0], 1.0);
        let short = [1.0];
        let err = a
            .eval(
                1e-8,
                ExternalForces::new(&[], &short, &[]),
                Vec3::zero(),
                ExecutionPolicy::Sequential,
            )
            .unwrap_err();
        assert_eq!(err, SimError::ExternalForceLength { axis: 'y', expected: 2, actual: 1 });
        assert!(a.fx.iter().all(|f| f.is_nan()));
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rng = fastrand::Rng::with_seed(99);
        let n = 200;
        let mut coord = || rng.f64() * 4.0 - 2.0;
        let points: Vec<[f64; 3]> = (0..n).map(|_| [coord(), coord(), coord()]).collect();
        let masses: Vec<f64> = (0..n).map(|_| 1.0 + rng.f64() * 199.0).collect();
        let ext: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();

        let mut seq = Arrays::new(&points, &masses, 1.0);
        let mut par = Arrays::new(&points, &masses, 1.0);
        let global = Vec3::new(0.0, -2.0, 0.0);
        let external = ExternalForces::new(&ext, &ext, &[]);
        seq.eval(1e-8, external, global, ExecutionPolicy::Sequential).unwrap();
        par.eval(1e-8, external, global, ExecutionPolicy::Parallel).unwrap();

        for i in 0..n {
            assert_relative_eq!(seq.fx[i], par.fx[i], epsilon = 1e-9, max_relative = 1e-9);
            assert_relative_eq!(seq.fy[i], par.fy[i], epsilon = 1e-9, max_relative = 1e-9);
            assert_relative_eq!(seq.fz[i], par.fz[i], epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn kernel_is_finite_at_zero_separation() {
        let k = softened_inv_r3(0.0, 1e-8);
        assert!(k.is_finite());
        assert_relative_eq!(k, 1e12, max_relative = 1e-12);
    }
}
