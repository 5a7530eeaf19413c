//! Numeric WMO code to [`WeatherCondition`] lookup.

use std::collections::HashMap;
use tracing::info;

use crate::config::WeatherCodeMappings;
use crate::models::WeatherCondition;

#[derive(Debug, Clone)]
pub struct WeatherCodeTranslator {
    conditions: HashMap<i32, WeatherCondition>,
}

impl WeatherCodeTranslator {
    pub fn new(mappings: &WeatherCodeMappings) -> Self {
        let mut conditions = HashMap::new();
        for (condition, codes) in mappings.entries() {
            for code in codes {
                conditions.insert(*code, *condition);
            }
        }

        info!(count = conditions.len(), "Loaded WMO weather codes into translator");
        Self { conditions }
    }

    /// Unmapped or absent codes translate to `Unknown`
    pub fn translate(&self, code: Option<i32>) -> WeatherCondition {
        code.and_then(|c| self.conditions.get(&c).copied())
            .unwrap_or(WeatherCondition::Unknown)
    }
}

impl Default for WeatherCodeTranslator {
    fn default() -> Self {
        Self::new(&WeatherCodeMappings::default())
    }
}
