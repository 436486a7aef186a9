//! Reflectivity data records
//!
//! A [`Data`] record holds an `n x m` array whose columns are q, R, dR and
//! optionally dQ (`m >= 3`), plus the q range to fit (`data_range`) and the q
//! range to simulate (`simulation_range`). A record with no rows stands for a
//! pure simulation.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::classlist::{names_match, Record};
use crate::models::RecordError;

/// Minimum number of columns of a data array: q, R, dR
pub const MIN_DATA_COLUMNS: usize = 3;

/// Simulation range given to a record without data
pub const DEFAULT_SIMULATION_RANGE: [f64; 2] = [0.005, 0.7];

/// A measured (or simulated) reflectivity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Data {
    pub name: String,

    /// Columns: q, R, dR and optionally dQ
    #[serde(with = "rows")]
    pub data: Array2<f64>,

    /// q range used when fitting
    pub data_range: Option<[f64; 2]>,

    /// q range over which the model is simulated
    pub simulation_range: Option<[f64; 2]>,
}

impl Default for Data {
    fn default() -> Self {
        Self {
            name: String::new(),
            data: Array2::zeros((0, MIN_DATA_COLUMNS)),
            data_range: None,
            simulation_range: None,
        }
    }
}

impl Data {
    /// Create a data record from an array; both ranges default to the q range
    /// of the data.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use ratapi_rs::models::Data;
    ///
    /// let data = Data::new("D2O", array![[0.01, 1.0, 0.1], [0.2, 1e-5, 1e-6]]).unwrap();
    /// assert_eq!(data.data_range, Some([0.01, 0.2]));
    /// assert_eq!(data.simulation_range, Some([0.01, 0.2]));
    /// ```
    pub fn new(name: &str, data: Array2<f64>) -> Result<Self, RecordError> {
        Self {
            name: name.to_string(),
            data,
            ..Self::default()
        }
        .validated()
    }

    /// A record with no data, simulated over the default range.
    pub fn simulation(name: &str) -> Self {
        Self {
            name: name.to_string(),
            simulation_range: Some(DEFAULT_SIMULATION_RANGE),
            ..Self::default()
        }
    }

    pub fn with_data_range(mut self, range: [f64; 2]) -> Result<Self, RecordError> {
        self.data_range = Some(range);
        self.validated()
    }

    pub fn with_simulation_range(mut self, range: [f64; 2]) -> Result<Self, RecordError> {
        self.simulation_range = Some(range);
        self.validated()
    }

    /// Whether the record carries measured points.
    pub fn has_data(&self) -> bool {
        self.data.nrows() > 0
    }

    /// Smallest and largest q, or `None` without data.
    pub fn q_limits(&self) -> Option<[f64; 2]> {
        if !self.has_data() {
            return None;
        }
        let q = self.data.index_axis(Axis(1), 0);
        let min = q.iter().copied().fold(f64::INFINITY, f64::min);
        let max = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some([min, max])
    }
}

impl Record for Data {
    const KINDS: &'static [&'static str] = &["Data"];
    const DEFAULT_NAME: &'static str = "New Data";

    fn kind(&self) -> &'static str {
        "Data"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool {
        if field == "name" && names_match(&self.name, old) {
            self.name = new.to_string();
            return true;
        }
        false
    }

    fn validated(mut self) -> Result<Self, RecordError> {
        let columns = self.data.ncols();
        if columns < MIN_DATA_COLUMNS {
            return Err(RecordError::DataColumns {
                name: self.name,
                columns,
            });
        }

        for (field, range) in [
            ("data_range", self.data_range),
            ("simulation_range", self.simulation_range),
        ] {
            if let Some([min, max]) = range {
                if min > max {
                    return Err(RecordError::RangeOrder {
                        name: self.name,
                        field: field.to_string(),
                        min,
                        max,
                    });
                }
            }
        }

        let Some([q_min, q_max]) = self.q_limits() else {
            if self.simulation_range.is_none() {
                self.simulation_range = Some(DEFAULT_SIMULATION_RANGE);
            }
            return Ok(self);
        };

        let [min, max] = *self.data_range.get_or_insert([q_min, q_max]);
        if min < q_min || max > q_max {
            return Err(RecordError::DataRangeOutside {
                name: self.name,
                min,
                max,
                q_min,
                q_max,
            });
        }

        let [min, max] = *self.simulation_range.get_or_insert([q_min, q_max]);
        if min > q_min || max < q_max {
            return Err(RecordError::SimulationRangeTooNarrow {
                name: self.name,
                min,
                max,
                q_min,
                q_max,
            });
        }

        Ok(self)
    }
}

/// Serialise an array as a list of rows.
pub(crate) mod rows {
    use ndarray::Array2;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::MIN_DATA_COLUMNS;

    pub fn serialize<S>(data: &Array2<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rows: Vec<Vec<f64>> = data.outer_iter().map(|row| row.to_vec()).collect();
        rows.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Array2<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        let Some(first) = rows.first() else {
            return Ok(Array2::zeros((0, MIN_DATA_COLUMNS)));
        };
        let columns = first.len();
        if rows.iter().any(|row| row.len() != columns) {
            return Err(D::Error::custom("every data row must have the same number of columns"));
        }
        let n_rows = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((n_rows, columns), flat).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn curve() -> Array2<f64> {
        array![[0.02, 1.0, 0.1], [0.1, 1e-3, 1e-4], [0.25, 1e-6, 1e-7]]
    }

    #[test]
    fn test_default_ranges() {
        let data = Data::new("D2O", curve()).unwrap();
        assert_eq!(data.q_limits(), Some([0.02, 0.25]));
        assert_eq!(data.data_range, Some([0.02, 0.25]));
        assert_eq!(data.simulation_range, Some([0.02, 0.25]));

        let simulation = Data::simulation("Simulation");
        assert!(!simulation.has_data());
        assert_eq!(simulation.data_range, None);
        assert_eq!(simulation.simulation_range, Some(DEFAULT_SIMULATION_RANGE));
    }

    #[test]
    fn test_range_containment() {
        let data = Data::new("D2O", curve()).unwrap();
        assert!(data.clone().with_data_range([0.05, 0.2]).is_ok());
        assert!(matches!(
            data.clone().with_data_range([0.01, 0.2]),
            Err(RecordError::DataRangeOutside { .. })
        ));
        assert!(data.clone().with_simulation_range([0.005, 0.7]).is_ok());
        assert!(matches!(
            data.clone().with_simulation_range([0.05, 0.7]),
            Err(RecordError::SimulationRangeTooNarrow { .. })
        ));
        assert!(matches!(
            data.with_simulation_range([0.7, 0.005]),
            Err(RecordError::RangeOrder { .. })
        ));
    }

    #[test]
    fn test_too_few_columns() {
        let err = Data::new("Bad", array![[0.1, 1.0], [0.2, 0.5]]).unwrap_err();
        assert_eq!(
            err,
            RecordError::DataColumns {
                name: "Bad".to_string(),
                columns: 2
            }
        );
    }

    #[test]
    fn test_rows_serialisation() {
        let data = Data::new("D2O", curve()).unwrap();
        let fields = data.to_fields().unwrap();
        assert_eq!(fields["data"][1], json!([0.1, 1e-3, 1e-4]));

        let rebuilt = Data::from_fields("Data", fields).unwrap();
        assert_eq!(rebuilt, data);

        let ragged = json!({"name": "Ragged", "data": [[0.1, 1.0, 0.1], [0.2, 1.0]]})
            .as_object()
            .unwrap()
            .clone();
        assert!(Data::from_fields("Data", ragged).is_err());
    }

    #[test]
    fn test_single_point_revalidates() {
        let point = Data::new("Point", array![[0.1, 1.0, 0.1]]).unwrap();
        assert_eq!(point.data_range, Some([0.1, 0.1]));
        assert_eq!(point.simulation_range, Some([0.1, 0.1]));
        assert_eq!(point.clone().validated().unwrap(), point);

        let mut list = crate::classlist::ClassList::from_records(vec![point]).unwrap();
        list.set_fields(0, json!({"name": "Single Point"}).as_object().unwrap().clone())
            .unwrap();
        assert_eq!(list[0].name, "Single Point");
    }

    #[test]
    fn test_dq_column_is_allowed() {
        let data = Data::new("With dQ", array![[0.1, 1.0, 0.1, 0.01]]);
        assert!(data.is_ok());
    }
}
