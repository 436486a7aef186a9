//! Configuration of the fitting procedure run by the engine.
//!
//! [`Controls`] selects a procedure and holds the tuning options of every
//! procedure; only the group matching `procedure` is used by the engine, but
//! all of them are handed over so a project can switch procedures freely.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by [`Controls::validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlsError {
    #[error("{field} = {value} is out of range: expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

macro_rules! engine_names {
    ($kind:ident { $($variant:ident => $name:literal),* $(,)? }) => {
        impl $kind {
            /// The name the engine uses for this option.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($kind::$variant => $name,)*
                }
            }
        }

        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// The procedure the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Procedure {
    /// Simulate once with the current values
    #[default]
    Calculate,
    Simplex,
    /// Differential evolution
    #[serde(rename = "de")]
    DE,
    /// Nested sampling
    #[serde(rename = "ns")]
    NS,
    #[serde(rename = "dream")]
    Dream,
}

engine_names!(Procedure {
    Calculate => "calculate",
    Simplex => "simplex",
    DE => "de",
    NS => "ns",
    Dream => "dream",
});

impl Procedure {
    /// Whether the procedure samples a posterior.
    pub fn is_bayesian(&self) -> bool {
        matches!(self, Procedure::NS | Procedure::Dream)
    }
}

/// How the engine parallelises a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parallel {
    #[default]
    Single,
    Points,
    Contrasts,
}

engine_names!(Parallel {
    Single => "single",
    Points => "points",
    Contrasts => "contrasts",
});

/// How much the engine reports while running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Off,
    #[default]
    Iter,
    Notify,
    Final,
}

engine_names!(DisplayMode {
    Off => "off",
    Iter => "iter",
    Notify => "notify",
    Final => "final",
});

/// Differential evolution strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Random,
    LocalToBest,
    BestWithJitter,
    RandomWithPerVectorDither,
    RandomWithPerGenerationDither,
    RandomEitherOrAlgorithm,
}

impl Strategy {
    /// Engine code, 1 to 6.
    pub fn code(&self) -> u8 {
        match self {
            Strategy::Random => 1,
            Strategy::LocalToBest => 2,
            Strategy::BestWithJitter => 3,
            Strategy::RandomWithPerVectorDither => 4,
            Strategy::RandomWithPerGenerationDither => 5,
            Strategy::RandomEitherOrAlgorithm => 6,
        }
    }
}

/// How DREAM treats proposals outside the parameter bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundHandling {
    Off,
    #[default]
    Reflect,
    Bound,
    Fold,
}

engine_names!(BoundHandling {
    Off => "off",
    Reflect => "reflect",
    Bound => "bound",
    Fold => "fold",
});

/// Options of the Nelder-Mead simplex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimplexOptions {
    /// Termination tolerance on parameter changes. Default: 1e-6
    pub x_tolerance: f64,

    /// Termination tolerance on the cost. Default: 1e-6
    pub fun_tolerance: f64,

    /// Default: 10000
    pub max_fun_evals: usize,

    /// Default: 1000
    pub max_iterations: usize,

    /// Iterations between progress reports. Default: 1
    pub update_freq: usize,

    /// Iterations between plot updates. Default: 20
    pub update_plot_freq: usize,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            x_tolerance: 1e-6,
            fun_tolerance: 1e-6,
            max_fun_evals: 10000,
            max_iterations: 1000,
            update_freq: 1,
            update_plot_freq: 20,
        }
    }
}

/// Options of differential evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeOptions {
    /// Default: 20
    pub population_size: usize,

    /// Differential weight F. Default: 0.5
    pub f_weight: f64,

    /// Default: 0.8
    pub crossover_probability: f64,

    pub strategy: Strategy,

    /// Cost at which the search stops. Default: 1.0
    pub target_value: f64,

    /// Default: 500
    pub num_generations: usize,
}

impl Default for DeOptions {
    fn default() -> Self {
        Self {
            population_size: 20,
            f_weight: 0.5,
            crossover_probability: 0.8,
            strategy: Strategy::default(),
            target_value: 1.0,
            num_generations: 500,
        }
    }
}

/// Options of nested sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NsOptions {
    /// Live points. Default: 150
    pub n_live: usize,

    /// MCMC steps per replacement; 0 uses ellipsoid sampling. Default: 0
    pub n_mcmc: usize,

    /// Default: 0.1
    pub prop_scale: f64,

    /// Stopping tolerance on the log evidence. Default: 0.1
    pub ns_tolerance: f64,
}

impl Default for NsOptions {
    fn default() -> Self {
        Self {
            n_live: 150,
            n_mcmc: 0,
            prop_scale: 0.1,
            ns_tolerance: 0.1,
        }
    }
}

/// Options of the DREAM sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DreamOptions {
    /// Default: 20000
    pub n_samples: usize,

    /// Default: 10
    pub n_chains: usize,

    /// Default: 0.5
    pub jump_probability: f64,

    /// Probability of a unit jump rate. Default: 0.2
    pub p_unit_gamma: f64,

    pub bound_handling: BoundHandling,

    /// Adapt the crossover probabilities. Default: true
    pub adapt_pcr: bool,
}

impl Default for DreamOptions {
    fn default() -> Self {
        Self {
            n_samples: 20000,
            n_chains: 10,
            jump_probability: 0.5,
            p_unit_gamma: 0.2,
            bound_handling: BoundHandling::default(),
            adapt_pcr: true,
        }
    }
}

/// Algorithm configuration handed to the engine with a project.
///
/// # Examples
///
/// ```
/// use ratapi_rs::controls::{Controls, Procedure};
///
/// let controls = Controls::new()
///     .with_procedure(Procedure::Dream)
///     .with_resample_n_points(100);
/// assert!(controls.validate().is_ok());
/// assert_eq!(controls.dream.n_chains, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Controls {
    pub procedure: Procedure,
    pub parallel: Parallel,

    /// Compute SLD profiles during a fit, not only at the end. Default: false
    pub calc_sld_during_fit: bool,

    /// Angle (as a fraction of pi) below which a profile segment is
    /// refined. Default: 0.9
    pub resample_min_angle: f64,

    /// Initial number of points of a resampled profile. Default: 50
    pub resample_n_points: usize,

    pub display: DisplayMode,

    pub simplex: SimplexOptions,
    pub de: DeOptions,
    pub ns: NsOptions,
    pub dream: DreamOptions,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            procedure: Procedure::default(),
            parallel: Parallel::default(),
            calc_sld_during_fit: false,
            resample_min_angle: 0.9,
            resample_n_points: 50,
            display: DisplayMode::default(),
            simplex: SimplexOptions::default(),
            de: DeOptions::default(),
            ns: NsOptions::default(),
            dream: DreamOptions::default(),
        }
    }
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_procedure(mut self, procedure: Procedure) -> Self {
        self.procedure = procedure;
        self
    }

    pub fn with_parallel(mut self, parallel: Parallel) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    pub fn with_calc_sld_during_fit(mut self, enable: bool) -> Self {
        self.calc_sld_during_fit = enable;
        self
    }

    pub fn with_resample_min_angle(mut self, angle: f64) -> Self {
        self.resample_min_angle = angle;
        self
    }

    pub fn with_resample_n_points(mut self, n_points: usize) -> Self {
        self.resample_n_points = n_points;
        self
    }

    pub fn with_simplex(mut self, options: SimplexOptions) -> Self {
        self.simplex = options;
        self
    }

    pub fn with_de(mut self, options: DeOptions) -> Self {
        self.de = options;
        self
    }

    pub fn with_ns(mut self, options: NsOptions) -> Self {
        self.ns = options;
        self
    }

    pub fn with_dream(mut self, options: DreamOptions) -> Self {
        self.dream = options;
        self
    }

    /// Check every option against its allowed range.
    pub fn validate(&self) -> Result<(), ControlsError> {
        check(
            "resample_min_angle",
            self.resample_min_angle,
            self.resample_min_angle > 0.0 && self.resample_min_angle <= 1.0,
            "0 < x <= 1",
        )?;
        at_least_one("resample_n_points", self.resample_n_points)?;

        check(
            "x_tolerance",
            self.simplex.x_tolerance,
            self.simplex.x_tolerance > 0.0,
            "x > 0",
        )?;
        check(
            "fun_tolerance",
            self.simplex.fun_tolerance,
            self.simplex.fun_tolerance > 0.0,
            "x > 0",
        )?;
        at_least_one("max_fun_evals", self.simplex.max_fun_evals)?;
        at_least_one("max_iterations", self.simplex.max_iterations)?;

        at_least_one("population_size", self.de.population_size)?;
        check("f_weight", self.de.f_weight, self.de.f_weight > 0.0, "x > 0")?;
        probability("crossover_probability", self.de.crossover_probability)?;
        at_least_one("num_generations", self.de.num_generations)?;

        at_least_one("n_live", self.ns.n_live)?;
        check(
            "prop_scale",
            self.ns.prop_scale,
            self.ns.prop_scale > 0.0 && self.ns.prop_scale <= 1.0,
            "0 < x <= 1",
        )?;
        check(
            "ns_tolerance",
            self.ns.ns_tolerance,
            self.ns.ns_tolerance >= 0.0,
            "x >= 0",
        )?;

        at_least_one("n_samples", self.dream.n_samples)?;
        at_least_one("n_chains", self.dream.n_chains)?;
        probability("jump_probability", self.dream.jump_probability)?;
        probability("p_unit_gamma", self.dream.p_unit_gamma)?;
        Ok(())
    }
}

fn check(field: &'static str, value: f64, ok: bool, expected: &'static str) -> Result<(), ControlsError> {
    if ok {
        Ok(())
    } else {
        Err(ControlsError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<(), ControlsError> {
    check(field, value as f64, value >= 1, "x >= 1")
}

fn probability(field: &'static str, value: f64) -> Result<(), ControlsError> {
    check(field, value, (0.0..=1.0).contains(&value), "0 <= x <= 1")
}
