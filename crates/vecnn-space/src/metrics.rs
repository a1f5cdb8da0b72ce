//! Distance families.
//!
//! Pure Rust implementations over `f32` slices. Callers guarantee both slices
//! have the same length; the store rejects mismatched vectors before they get
//! here.

use std::sync::Arc;

use vecnn_types::{Params, Result, VecnnError};

use crate::space::Space;

/// Euclidean distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Space;

impl Space for L2Space {
    fn name(&self) -> &'static str {
        "l2"
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }

    fn is_metric(&self) -> bool {
        true
    }
}

/// Manhattan distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Space;

impl Space for L1Space {
    fn name(&self) -> &'static str {
        "l1"
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }

    fn is_metric(&self) -> bool {
        true
    }
}

/// Chebyshev (maximum) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct LInfSpace;

impl Space for LInfSpace {
    fn name(&self) -> &'static str {
        "linf"
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    fn is_metric(&self) -> bool {
        true
    }
}

/// Minkowski distance with exponent `p >= 1`.
#[derive(Debug, Clone, Copy)]
pub struct LpSpace {
    p: f32,
}

impl LpSpace {
    pub fn new(p: f32) -> Result<Self> {
        if !p.is_finite() || p < 1.0 {
            return Err(VecnnError::Parameter(format!(
                "lp space requires a finite p >= 1, got {}",
                p
            )));
        }
        Ok(Self { p })
    }

    pub fn p(&self) -> f32 {
        self.p
    }
}

impl Space for LpSpace {
    fn name(&self) -> &'static str {
        "lp"
    }

    fn descriptor(&self) -> String {
        format!("lp:p={}", self.p)
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs().powf(self.p))
            .sum::<f32>()
            .powf(1.0 / self.p)
    }

    fn is_metric(&self) -> bool {
        true
    }
}

fn cosine(a: &[f32], b: &[f32]) -> Option<f32> {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    match (norm_a == 0.0, norm_b == 0.0) {
        (true, true) => Some(1.0),
        (true, false) | (false, true) => None,
        (false, false) => Some((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)),
    }
}

/// Cosine distance: `1 - cos(a, b)`.
///
/// Not a metric. A zero vector is at distance 1 from every non-zero vector
/// and at distance 0 from another zero vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSpace;

impl Space for CosineSpace {
    fn name(&self) -> &'static str {
        "cosinesimil"
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        1.0 - cosine(a, b).unwrap_or(0.0)
    }

    fn is_metric(&self) -> bool {
        false
    }
}

/// Angle between two vectors, in radians.
#[derive(Debug, Clone, Copy, Default)]
pub struct AngularSpace;

impl Space for AngularSpace {
    fn name(&self) -> &'static str {
        "angulardist"
    }

    /// Identical inputs, or a cosine within a few ulps of 1, give exactly 0.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        if a == b {
            return 0.0;
        }
        let cos = cosine(a, b).unwrap_or(0.0);
        if cos >= 1.0 - 4.0 * f32::EPSILON {
            0.0
        } else {
            cos.acos()
        }
    }

    fn is_metric(&self) -> bool {
        true
    }
}

/// Negated inner product. Smaller means a larger dot product; values may be negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegDotProductSpace;

impl Space for NegDotProductSpace {
    fn name(&self) -> &'static str {
        "negdotprod"
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>()
    }

    fn is_metric(&self) -> bool {
        false
    }
}

/// Generalized Kullback-Leibler divergence `sum(x * ln(x / y) - x + y)`.
///
/// Asymmetric: `a` is the data point and `b` the query. All components must be
/// strictly positive, otherwise the result is not finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct KlDivGenSpace;

impl Space for KlDivGenSpace {
    fn name(&self) -> &'static str {
        "kldivgenfast"
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b)
            .map(|(x, y)| x * (x / y).ln() - x + y)
            .sum()
    }

    fn is_metric(&self) -> bool {
        false
    }
}

pub(crate) fn no_params<S: Space + Default + 'static>(params: &Params) -> Result<Arc<dyn Space>> {
    params.reader().finish()?;
    Ok(Arc::new(S::default()))
}

pub(crate) fn lp_space(params: &Params) -> Result<Arc<dyn Space>> {
    let mut reader = params.reader();
    let p: f32 = reader.get_required("p")?;
    reader.finish()?;
    Ok(Arc::new(LpSpace::new(p)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_l2() {
        assert!(approx(L2Space.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0));
        assert_eq!(L2Space.distance(&[1.5, -2.0], &[1.5, -2.0]), 0.0);
    }

    #[test]
    fn test_l1_and_linf() {
        assert!(approx(L1Space.distance(&[0.0, 0.0], &[3.0, -4.0]), 7.0));
        assert!(approx(LInfSpace.distance(&[0.0, 0.0], &[3.0, -4.0]), 4.0));
    }

    #[test]
    fn test_lp_matches_l2_for_p2() {
        let lp = LpSpace::new(2.0).unwrap();
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 0.0, -1.0];
        assert!(approx(lp.distance(&a, &b), L2Space.distance(&a, &b)));
        assert_eq!(lp.descriptor(), "lp:p=2");
    }

    #[test]
    fn test_lp_rejects_small_p() {
        assert!(LpSpace::new(0.5).is_err());
        assert!(LpSpace::new(f32::NAN).is_err());
    }

    #[test]
    fn test_cosine() {
        assert!(approx(CosineSpace.distance(&[1.0, 0.0], &[2.0, 0.0]), 0.0));
        assert!(approx(CosineSpace.distance(&[1.0, 0.0], &[0.0, 1.0]), 1.0));
        assert!(approx(CosineSpace.distance(&[1.0, 0.0], &[-1.0, 0.0]), 2.0));
    }

    #[test]
    fn test_cosine_zero_vectors() {
        assert!(approx(CosineSpace.distance(&[0.0, 0.0], &[0.0, 0.0]), 0.0));
        assert!(approx(CosineSpace.distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0));
    }

    #[test]
    fn test_angular() {
        let d = AngularSpace.distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(approx(d, std::f32::consts::FRAC_PI_2));
        assert!(approx(AngularSpace.distance(&[1.0, 0.0], &[2.0, 0.0]), 0.0));
    }

    #[test]
    fn test_negdotprod() {
        assert!(approx(
            NegDotProductSpace.distance(&[1.0, 2.0], &[3.0, 4.0]),
            -11.0
        ));
    }

    #[test]
    fn test_kldiv_is_asymmetric() {
        let a = [0.2, 0.8];
        let b = [0.5, 0.5];
        let ab = KlDivGenSpace.distance(&a, &b);
        let ba = KlDivGenSpace.distance(&b, &a);
        assert!(ab > 0.0 && ba > 0.0);
        assert!(!approx(ab, ba));
        assert!(approx(KlDivGenSpace.distance(&a, &a), 0.0));
    }

    #[test]
    fn test_metric_symmetry_random() {
        use rand::Rng;
        let mut rng = rand::rng();
        let spaces: Vec<Box<dyn Space>> = vec![
            Box::new(L2Space),
            Box::new(L1Space),
            Box::new(LInfSpace),
            Box::new(LpSpace::new(3.0).unwrap()),
            Box::new(AngularSpace),
        ];
        for _ in 0..50 {
            let a: Vec<f32> = (0..8).map(|_| rng.random_range(-1.0..1.0)).collect();
            let b: Vec<f32> = (0..8).map(|_| rng.random_range(-1.0..1.0)).collect();
            for space in &spaces {
                let ab = space.distance(&a, &b);
                assert!(ab >= 0.0);
                assert!(approx(ab, space.distance(&b, &a)));
                assert_eq!(space.distance(&a, &a), 0.0, "{}", space.name());
                assert_eq!(space.distance(&a, &a.clone()), 0.0, "{}", space.name());
            }
        }
    }

    #[test]
    fn test_angular_self_distance_is_zero() {
        let v = [0.1, 0.2, 0.3];
        assert_eq!(AngularSpace.distance(&v, &[0.1, 0.2, 0.3]), 0.0);
        let scaled: Vec<f32> = v.iter().map(|x| x * 2.0).collect();
        assert_eq!(AngularSpace.distance(&v, &scaled), 0.0);
    }
}
