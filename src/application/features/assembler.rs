use crate::domain::errors::PredictionError;
use crate::domain::ml::feature_registry::FeatureSchema;
use crate::domain::ml::feature_table::FeatureTable;
use ndarray::Array2;
use tracing::debug;

/// Turns a feature table into the fixed `(W, F)` window the models consume.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    schema: FeatureSchema,
    window_size: usize,
}

impl FeatureAssembler {
    pub fn new(schema: FeatureSchema, window_size: usize) -> Self {
        Self {
            schema,
            window_size,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Purges incomplete rows, keeps the newest `W` and lays them out in
    /// schema order. Slots without a computed column are all zeros.
    pub fn assemble(&self, table: FeatureTable) -> Result<Array2<f64>, PredictionError> {
        let raw_rows = table.len();
        let table = table.purge_incomplete();
        debug!(
            "Feature table: {} rows, {} complete",
            raw_rows,
            table.len()
        );

        if table.len() < self.window_size {
            return Err(PredictionError::InsufficientData {
                required: self.window_size,
                available: table.len(),
            });
        }

        let start = table.len() - self.window_size;
        let mut window = Array2::<f64>::zeros((self.window_size, self.schema.len()));

        for (col, slot) in self.schema.slots().iter().enumerate() {
            let Some(source) = slot.column else {
                continue;
            };
            for (row, value) in table.column(source)[start..].iter().enumerate() {
                window[[row, col]] = value.unwrap_or_default();
            }
        }

        Ok(window)
    }
}
