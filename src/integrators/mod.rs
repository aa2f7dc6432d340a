// Copyright @yucwang 2026

pub mod single_scatter;
pub mod transmittance;

use crate::core::integrator::Integrator;
use crate::core::sampler::SampleGenerator;
use crate::core::volume::Volume;
use crate::tracking::TransmittanceEstimator;
use std::fmt;
use std::str::FromStr;

use self::single_scatter::SingleScatterIntegrator;
use self::transmittance::TransmittanceIntegrator;

/// Integrators a scene file or the command line can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegratorKind {
    Transmittance,
    SingleScatter,
}

impl IntegratorKind {
    pub fn build<V: Volume, S: SampleGenerator>(
        self,
        samples_per_pixel: u32,
        estimator: TransmittanceEstimator,
    ) -> Box<dyn Integrator<V, S>> {
        match self {
            IntegratorKind::Transmittance => Box::new(TransmittanceIntegrator::new(samples_per_pixel, estimator)),
            IntegratorKind::SingleScatter => Box::new(SingleScatterIntegrator::new(samples_per_pixel, estimator)),
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegratorKind::Transmittance => write!(f, "transmittance"),
            IntegratorKind::SingleScatter => write!(f, "single_scatter"),
        }
    }
}

impl FromStr for IntegratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transmittance" => Ok(IntegratorKind::Transmittance),
            "single_scatter" | "singlescatter" => Ok(IntegratorKind::SingleScatter),
            _ => Err(format!("unsupported integrator: {}", s)),
        }
    }
}
