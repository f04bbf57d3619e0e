use crate::data::ExogenousSnapshot;

/// Number of entries in an observation vector.
pub const OBSERVATION_DIM: usize = 7;

/// `[soc, lmp, load, load_forecast, moer, solar_forecast, wind_forecast]`
pub type ObservationVector = [f64; OBSERVATION_DIM];

/// Names of the observation vector entries, in order.
pub const OBSERVATION_LABELS: [&str; OBSERVATION_DIM] = [
    "state_of_charge",
    "locational_marginal_price",
    "load",
    "load_forecast",
    "marginal_operating_emissions_rate",
    "solar_forecast",
    "wind_forecast",
];

/// Named view of an observation. `state_of_charge` is always the raw stored
/// energy, even when the vector carries the normalized value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObservationInfo {
    pub state_of_charge: f64,
    pub locational_marginal_price: f64,
    pub load: f64,
    pub load_forecast: f64,
    pub marginal_operating_emissions_rate: f64,
    pub solar_forecast: f64,
    pub wind_forecast: f64,
}

impl ObservationInfo {
    pub fn new(raw_storage: f64, exogenous: &ExogenousSnapshot) -> Self {
        Self {
            state_of_charge: raw_storage,
            locational_marginal_price: exogenous.lmp,
            load: exogenous.load,
            load_forecast: exogenous.load_forecast,
            marginal_operating_emissions_rate: exogenous.moer,
            solar_forecast: exogenous.solar_forecast,
            wind_forecast: exogenous.wind_forecast,
        }
    }

    /// Builds the observation vector with `soc` in the first slot.
    pub fn to_vector(&self, soc: f64) -> ObservationVector {
        [
            soc,
            self.locational_marginal_price,
            self.load,
            self.load_forecast,
            self.marginal_operating_emissions_rate,
            self.solar_forecast,
            self.wind_forecast,
        ]
    }
}
