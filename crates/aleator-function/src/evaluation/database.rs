//! Reference-sample lookup evaluation.

use std::collections::HashMap;
use std::fmt;

use aleator_types::{Point, Sample};
use tracing::debug;

use crate::error::{FunctionError, Result};
use crate::nearest::{BruteForceNearestNeighbour, NearestNeighbour};

/// Evaluation backed by paired input/output reference samples.
///
/// A query returns the output row paired with the nearest input row
/// under the configured spatial index. An optional exact-match cache,
/// keyed on the bit patterns of the query components, answers repeats
/// of known inputs without touching the index.
pub struct DatabaseEvaluation {
    input_sample: Sample,
    output_sample: Sample,
    nearest: Box<dyn NearestNeighbour>,
    // exact input key, as component bit patterns, to reference row
    cache: Option<HashMap<Vec<u64>, usize>>,
}

impl DatabaseEvaluation {
    /// Builds the evaluation over non-empty samples of equal size.
    pub fn new(input: Sample, output: Sample, activate_cache: bool) -> Result<Self> {
        check_reference_pair(&input, &output)?;
        let mut eval = DatabaseEvaluation {
            input_sample: Sample::new(input.dimension()),
            output_sample: Sample::new(output.dimension()),
            nearest: Box::new(BruteForceNearestNeighbour::new()),
            cache: None,
        };
        eval.arm(input, output, activate_cache)?;
        Ok(eval)
    }

    /// Replaces the reference samples and rebuilds the index and,
    /// when requested, the cache.
    ///
    /// The new samples must keep the input and output dimensions the
    /// evaluation was built with.
    pub fn set_sample(
        &mut self,
        input: Sample,
        output: Sample,
        activate_cache: bool,
    ) -> Result<()> {
        check_reference_pair(&input, &output)?;
        if input.dimension() != self.input_sample.dimension() {
            return Err(FunctionError::dimension(
                "database input sample",
                self.input_sample.dimension(),
                input.dimension(),
            ));
        }
        if output.dimension() != self.output_sample.dimension() {
            return Err(FunctionError::dimension(
                "database output sample",
                self.output_sample.dimension(),
                output.dimension(),
            ));
        }
        self.arm(input, output, activate_cache)
    }

    /// Swaps the spatial index implementation, re-indexing the current
    /// input sample through a fresh instance of the replacement.
    pub fn set_nearest_neighbour(&mut self, nearest: &dyn NearestNeighbour) -> Result<()> {
        let mut fresh = nearest.empty_clone();
        fresh.set_sample(&self.input_sample)?;
        self.nearest = fresh;
        Ok(())
    }

    fn arm(&mut self, input: Sample, output: Sample, activate_cache: bool) -> Result<()> {
        self.nearest.set_sample(&input)?;
        self.cache = if activate_cache {
            let mut cache = HashMap::with_capacity(input.size());
            for (row, key) in input.rows().map(key_bits).enumerate() {
                // first occurrence wins for duplicated inputs
                cache.entry(key).or_insert(row);
            }
            Some(cache)
        } else {
            None
        };
        debug!(
            size = input.size(),
            cached = self.cache.is_some(),
            "rebuilt database evaluation index"
        );
        self.input_sample = input;
        self.output_sample = output;
        Ok(())
    }

    pub fn input_dimension(&self) -> usize {
        self.input_sample.dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.output_sample.dimension()
    }

    pub fn input_sample(&self) -> &Sample {
        &self.input_sample
    }

    pub fn output_sample(&self) -> &Sample {
        &self.output_sample
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Result<Point> {
        if let Some(cache) = &self.cache {
            if let Some(&row) = cache.get(&key_bits(x.as_slice())) {
                return Ok(self.output_sample.point(row));
            }
        }
        let row = self.nearest.query(x)?;
        Ok(self.output_sample.point(row))
    }

    pub(crate) fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        // A batch equal to the reference input is answered verbatim.
        if *sample == self.input_sample {
            return Ok(self.output_sample.clone());
        }
        let mut out = Sample::new(self.output_dimension());
        for i in 0..sample.size() {
            out.push_point(&self.evaluate(&sample.point(i))?)?;
        }
        Ok(out)
    }
}

impl Clone for DatabaseEvaluation {
    fn clone(&self) -> Self {
        DatabaseEvaluation {
            input_sample: self.input_sample.clone(),
            output_sample: self.output_sample.clone(),
            nearest: self.nearest.clone_box(),
            cache: self.cache.clone(),
        }
    }
}

impl fmt::Debug for DatabaseEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseEvaluation")
            .field("size", &self.input_sample.size())
            .field("input_dimension", &self.input_dimension())
            .field("output_dimension", &self.output_dimension())
            .field("cache", &self.is_cache_enabled())
            .finish_non_exhaustive()
    }
}

/// Exact-match cache key: the component bit patterns, so `-0.0` and
/// `0.0` are distinct keys and NaN payloads compare by identity.
fn key_bits(row: &[f64]) -> Vec<u64> {
    row.iter().map(|v| v.to_bits()).collect()
}

fn check_reference_pair(input: &Sample, output: &Sample) -> Result<()> {
    if input.is_empty() {
        return Err(FunctionError::EmptyInput(
            "database input sample has size 0".to_string(),
        ));
    }
    if output.is_empty() {
        return Err(FunctionError::EmptyInput(
            "database output sample has size 0".to_string(),
        ));
    }
    if input.size() != output.size() {
        return Err(FunctionError::dimension(
            "database sample sizes",
            input.size(),
            output.size(),
        ));
    }
    Ok(())
}
