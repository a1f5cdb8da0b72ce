//! # vecnn-space
//!
//! Distance families ("spaces") for the vecnn index.
//!
//! A space is a pure function object over two vectors. Metric and non-metric
//! families are both supported, so index methods must not rely on the triangle
//! inequality.
//!
//! | Name | Distance |
//! |---|---|
//! | `l2` | Euclidean |
//! | `l1` | Manhattan |
//! | `linf` | Chebyshev |
//! | `lp` | Minkowski, parameter `p` |
//! | `cosinesimil` | `1 - cos` |
//! | `angulardist` | angle in radians |
//! | `negdotprod` | negated inner product |
//! | `kldivgenfast` | generalized KL divergence |

pub mod metrics;
pub mod space;

pub use metrics::{
    AngularSpace, CosineSpace, KlDivGenSpace, L1Space, L2Space, LInfSpace, LpSpace,
    NegDotProductSpace,
};
pub use space::{create_space, Space, SpaceCtor, SpaceRegistry};
