//! Vertical stretching curves for synthetic sigma terms.
//!
//! Ocean model output ships its own `Cs_w`/`Cs_r` curves. For synthetic
//! grids (tests, idealised runs) these functions generate them: a
//! [`Stretching`] maps `n_levels` to the stretched curves `(C_rho, C_w)` on
//! [-1, 0], which [`SigmaTerms::from_stretching`](super::SigmaTerms::from_stretching)
//! pairs with uniform `s` levels.
//!
//! ```
//! use envfield::vertical::{SongHaidvogelStretching, Stretching, UniformStretching};
//!
//! let (c_rho, c_w) = UniformStretching.compute_sigma(4);
//! assert_eq!(c_rho.len(), 4);
//! assert_eq!(c_w, vec![-1.0, -0.75, -0.5, -0.25, 0.0]);
//!
//! let (_, stretched) = SongHaidvogelStretching::new(5.0, 0.4, 10.0).compute_sigma(4);
//! assert!(stretched[3] > -0.25); // finer near the surface
//! ```

/// Trait for vertical stretching functions.
///
/// Returns `(rho, w)` curves, bottom first:
/// - `w[0] = -1` (bottom), `w[n_levels] = 0` (surface), length `n_levels + 1`
/// - `rho` holds the layer midpoints, length `n_levels`
pub trait Stretching: Send + Sync {
    /// Compute stretched level curves.
    fn compute_sigma(&self, n_levels: usize) -> (Vec<f64>, Vec<f64>);

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

fn midpoints(w: &[f64]) -> Vec<f64> {
    w.windows(2).map(|p| 0.5 * (p[0] + p[1])).collect()
}

/// Equal spacing between -1 and 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformStretching;

impl Stretching for UniformStretching {
    fn compute_sigma(&self, n_levels: usize) -> (Vec<f64>, Vec<f64>) {
        let n = n_levels.max(1) as f64;
        let w: Vec<f64> = (0..=n_levels).map(|k| -1.0 + k as f64 / n).collect();
        (midpoints(&w), w)
    }

    fn name(&self) -> &'static str {
        "uniform"
    }
}

/// Song-Haidvogel (1994) stretching, the classic ROMS `Vstretching = 1`.
///
/// - `theta_s`: surface refinement (0..10)
/// - `theta_b`: bottom refinement (0..4)
/// - `hc`: critical depth (m)
#[derive(Clone, Copy, Debug)]
pub struct SongHaidvogelStretching {
    pub theta_s: f64,
    pub theta_b: f64,
    pub hc: f64,
}

impl Default for SongHaidvogelStretching {
    fn default() -> Self {
        Self {
            theta_s: 5.0,
            theta_b: 0.4,
            hc: 20.0,
        }
    }
}

impl SongHaidvogelStretching {
    /// Create stretching with custom parameters.
    pub fn new(theta_s: f64, theta_b: f64, hc: f64) -> Self {
        Self {
            theta_s,
            theta_b,
            hc,
        }
    }

    /// C(s) with C(-1) = -1 and C(0) = 0.
    fn cs(&self, s: f64) -> f64 {
        let surface = if self.theta_s > 0.0 {
            (1.0 - (self.theta_s * s).cosh()) / (self.theta_s.cosh() - 1.0)
        } else {
            s
        };
        let bottom = if self.theta_b > 0.0 {
            (self.theta_b * (s + 1.0)).tanh() / self.theta_b.tanh() - 1.0
        } else {
            s
        };
        match (self.theta_s > 0.0, self.theta_b > 0.0) {
            (true, true) => {
                let total = self.theta_s + self.theta_b;
                (self.theta_s * surface + self.theta_b * bottom) / total
            }
            (true, false) => surface,
            (false, true) => bottom,
            (false, false) => s,
        }
    }
}

impl Stretching for SongHaidvogelStretching {
    fn compute_sigma(&self, n_levels: usize) -> (Vec<f64>, Vec<f64>) {
        let (_, uniform_w) = UniformStretching.compute_sigma(n_levels);
        let w: Vec<f64> = uniform_w.iter().map(|&s| self.cs(s)).collect();
        (midpoints(&w), w)
    }

    fn name(&self) -> &'static str {
        "song_haidvogel"
    }
}
