//! Opt-in input/output recording for evaluations.

use aleator_types::{Point, Sample};

/// Append-only record of the points and values that passed through an
/// evaluation while recording was enabled.
///
/// Recording is best-effort bookkeeping: it never fails an evaluation
/// and it never deduplicates.
#[derive(Debug, Clone)]
pub(crate) struct History {
    enabled: bool,
    inputs: Sample,
    outputs: Sample,
}

impl History {
    pub(crate) fn new(input_dimension: usize, output_dimension: usize) -> Self {
        History {
            enabled: false,
            inputs: Sample::new(input_dimension),
            outputs: Sample::new(output_dimension),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn enable(&mut self) {
        self.enabled = true;
    }

    pub(crate) fn disable(&mut self) {
        self.enabled = false;
    }

    /// Drops the recorded samples, keeping the enabled flag as is.
    pub(crate) fn clear(&mut self) {
        self.inputs = Sample::new(self.inputs.dimension());
        self.outputs = Sample::new(self.outputs.dimension());
    }

    pub(crate) fn record(&mut self, input: &Point, output: &Point) {
        if self.enabled {
            // Dimensions were validated by the evaluation wrapper.
            let _ = self.inputs.push_point(input);
            let _ = self.outputs.push_point(output);
        }
    }

    pub(crate) fn record_sample(&mut self, inputs: &Sample, outputs: &Sample) {
        if self.enabled {
            let _ = self.inputs.append(inputs);
            let _ = self.outputs.append(outputs);
        }
    }

    pub(crate) fn inputs(&self) -> &Sample {
        &self.inputs
    }

    pub(crate) fn outputs(&self) -> &Sample {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_history_records_nothing() {
        let mut history = History::new(2, 1);
        history.record(&Point::from(vec![1.0, 2.0]), &Point::from(vec![3.0]));
        assert!(history.inputs().is_empty());
    }

    #[test]
    fn enabled_history_appends_in_order() {
        let mut history = History::new(1, 1);
        history.enable();
        history.record(&Point::from(vec![1.0]), &Point::from(vec![10.0]));
        history.record(&Point::from(vec![2.0]), &Point::from(vec![20.0]));
        assert_eq!(history.inputs().size(), 2);
        assert_eq!(history.inputs().row(1), &[2.0]);
        assert_eq!(history.outputs().row(1), &[20.0]);
    }

    #[test]
    fn clear_keeps_the_flag() {
        let mut history = History::new(1, 1);
        history.enable();
        history.record(&Point::from(vec![1.0]), &Point::from(vec![2.0]));
        history.clear();
        assert!(history.is_enabled());
        assert!(history.inputs().is_empty());
        assert_eq!(history.inputs().dimension(), 1);
    }
}
