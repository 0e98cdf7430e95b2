use rigidmin::engine::config::CurvaturePolicy;

pub struct DefaultsConfig {
    pub nrigid: usize,
    pub use_accelerated_path: bool,
    pub epsilon: f64,
    pub sigma: f64,
    pub history_size: usize,
    pub max_step: f64,
    pub initial_inverse_hessian: f64,
    pub scale_inverse_hessian: bool,
    pub curvature_policy: CurvaturePolicy,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub max_energy_rise: f64,
    pub max_backtracks: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            nrigid: 5,
            use_accelerated_path: true,
            epsilon: 1.0,
            sigma: 1.0,
            history_size: 10,
            max_step: 0.2,
            initial_inverse_hessian: 0.1,
            scale_inverse_hessian: true,
            curvature_policy: CurvaturePolicy::SkipUpdate,
            max_iterations: 1000,
            tolerance: 1e-4,
            max_energy_rise: 1e-4,
            max_backtracks: 10,
        }
    }
}
