use crate::error::{SimResult, SimulationError};
use crate::generator::SEED_CLIQUE;
use serde::{Deserialize, Serialize};

/// Inputs for one generated network and the simulation run on top of it.
///
/// A params value is immutable for the lifetime of the network it produced;
/// changing anything means generating a new network from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub population_size: usize,
    pub initial_infected: usize,
    /// Basic reproduction number.
    pub r0: f64,
    /// Mean days between exposure and becoming infectious.
    pub incubation_period: u32,
    /// Days an individual stays able to transmit.
    pub infectious_period: u32,
    /// Daily recovery probability for an infectious individual.
    pub recovery_rate: f64,
    /// Fraction of the population distancing on any given day.
    pub social_distancing: f64,
    /// Fraction of the population vaccinated.
    pub vaccination_rate: f64,
    /// Fraction of the population wearing masks. Carried through configuration
    /// and reports; does not enter any transition probability.
    pub mask_usage: f64,
    /// Base probability that an infectious individual dies of the disease.
    pub infectious_mortality_rate: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            population_size: 200,
            initial_infected: 10,
            r0: 2.5,
            incubation_period: 5,
            infectious_period: 10,
            recovery_rate: 0.05,
            social_distancing: 0.0,
            vaccination_rate: 0.0,
            mask_usage: 0.0,
            infectious_mortality_rate: 0.005,
        }
    }
}

impl SimulationParams {
    /// Checks every field against its documented range.
    ///
    /// Must pass before any network is generated; violations are fatal to the
    /// generation attempt, not to the process.
    pub fn validate(&self) -> SimResult<()> {
        in_range("population_size", self.population_size as f64, 100.0, 2500.0)?;
        if self.population_size < SEED_CLIQUE {
            return Err(SimulationError::PopulationBelowSeedClique {
                population: self.population_size,
                clique: SEED_CLIQUE,
            });
        }

        let max_infected = self.population_size / 2;
        if self.initial_infected < 1 {
            return Err(SimulationError::InvalidParameter {
                name: "initial_infected",
                value: self.initial_infected as f64,
                min: 1.0,
                max: max_infected as f64,
            });
        }
        if self.initial_infected > max_infected {
            return Err(SimulationError::InitialInfectedExceedsPopulation {
                requested: self.initial_infected,
                maximum: max_infected,
            });
        }

        in_range("r0", self.r0, 0.1, 10.0)?;
        in_range("incubation_period", self.incubation_period as f64, 1.0, 30.0)?;
        in_range("infectious_period", self.infectious_period as f64, 1.0, 30.0)?;
        in_range("recovery_rate", self.recovery_rate, 0.01, 0.5)?;
        in_range("social_distancing", self.social_distancing, 0.0, 1.0)?;
        in_range("vaccination_rate", self.vaccination_rate, 0.0, 1.0)?;
        in_range("mask_usage", self.mask_usage, 0.0, 1.0)?;
        in_range(
            "infectious_mortality_rate",
            self.infectious_mortality_rate,
            0.001,
            0.1,
        )?;

        Ok(())
    }
}

fn in_range(name: &'static str, value: f64, min: f64, max: f64) -> SimResult<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter {
            name,
            value,
            min,
            max,
        })
    }
}
