#[derive(Debug, Clone, Copy)]
pub struct CrossingSearchConfig {
    pub max_months: u32,
    pub tolerance_years: f64,
    pub max_iterations: u32,
}

impl Default for CrossingSearchConfig {
    fn default() -> Self {
        Self {
            max_months: 1_200,
            tolerance_years: 1e-6,
            max_iterations: 64,
        }
    }
}

impl CrossingSearchConfig {
    pub fn horizon_years(&self) -> f64 {
        self.max_months as f64 / 12.0
    }
}

/// Earliest time, in years, at which `value_at(t) >= target`, or `None` past
/// `config.max_months`. The curve need not be monotone: a monthly walk
/// brackets the first crossing and bisection refines it.
pub fn first_crossing(
    value_at: impl Fn(f64) -> f64,
    target: f64,
    config: CrossingSearchConfig,
) -> Option<f64> {
    if !target.is_finite() {
        return None;
    }
    if value_at(0.0) >= target {
        return Some(0.0);
    }

    let mut previous = 0.0;
    for month in 1..=config.max_months {
        let t = month as f64 / 12.0;
        if value_at(t) >= target {
            return Some(bisect(&value_at, target, previous, t, config));
        }
        previous = t;
    }
    None
}

fn bisect(
    value_at: &impl Fn(f64) -> f64,
    target: f64,
    mut lo: f64,
    mut hi: f64,
    config: CrossingSearchConfig,
) -> f64 {
    let mut it = 0;
    while it < config.max_iterations {
        it += 1;
        let mid = (lo + hi) * 0.5;
        if value_at(mid) >= target {
            hi = mid;
        } else {
            lo = mid;
        }
        if (hi - lo).abs() <= config.tolerance_years {
            break;
        }
    }
    hi
}
