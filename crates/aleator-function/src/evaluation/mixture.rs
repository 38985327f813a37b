//! Mixture-of-experts evaluation kind.

use aleator_types::{Indices, Point, Sample};

use crate::error::{FunctionError, Result};
use crate::function::Function;

/// Evaluation routing each input to one of several expert functions.
///
/// A classifier grades every input with one score per expert. The
/// expert with the largest grade wins; scanning is in index order with
/// a strict comparison, so the lowest index wins ties.
#[derive(Debug, Clone)]
pub struct MixtureOfExpertsEvaluation {
    experts: Vec<Function>,
    classifier: Box<Function>,
}

impl MixtureOfExpertsEvaluation {
    pub fn new(experts: Vec<Function>, classifier: Function) -> Result<Self> {
        let first = experts.first().ok_or_else(|| {
            FunctionError::InvalidArgument("a mixture needs at least one expert".to_string())
        })?;
        let input_dimension = first.input_dimension();
        let output_dimension = first.output_dimension();
        for (i, expert) in experts.iter().enumerate() {
            if expert.input_dimension() != input_dimension
                || expert.output_dimension() != output_dimension
            {
                return Err(FunctionError::InvalidArgument(format!(
                    "expert {} has dimensions {}->{} but expert 0 has {}->{}",
                    i,
                    expert.input_dimension(),
                    expert.output_dimension(),
                    input_dimension,
                    output_dimension
                )));
            }
        }
        if classifier.input_dimension() != input_dimension {
            return Err(FunctionError::InvalidArgument(format!(
                "classifier input dimension {} does not match the experts' {}",
                classifier.input_dimension(),
                input_dimension
            )));
        }
        if classifier.output_dimension() != experts.len() {
            return Err(FunctionError::InvalidArgument(format!(
                "classifier produces {} grades for {} experts",
                classifier.output_dimension(),
                experts.len()
            )));
        }
        Ok(MixtureOfExpertsEvaluation {
            experts,
            classifier: Box::new(classifier),
        })
    }

    pub fn expert_count(&self) -> usize {
        self.experts.len()
    }

    pub fn input_dimension(&self) -> usize {
        self.experts[0].input_dimension()
    }

    pub fn output_dimension(&self) -> usize {
        self.experts[0].output_dimension()
    }

    pub fn experts(&self) -> &[Function] {
        &self.experts
    }

    pub fn classifier(&self) -> &Function {
        &self.classifier
    }

    fn select(grades: &Point) -> usize {
        let mut best = 0;
        for i in 1..grades.dimension() {
            if grades[i] > grades[best] {
                best = i;
            }
        }
        best
    }

    pub(crate) fn evaluate(&self, x: &Point) -> Result<Point> {
        let grades = self.classifier.evaluate(x)?;
        self.experts[Self::select(&grades)].evaluate(x)
    }

    /// Groups the rows assigned to each expert into one batch per
    /// expert, then scatters the results back to their original rows.
    pub(crate) fn evaluate_sample(&self, sample: &Sample) -> Result<Sample> {
        let grades = self.classifier.evaluate_sample(sample)?;
        let assignment: Vec<usize> = (0..sample.size())
            .map(|i| Self::select(&grades.point(i)))
            .collect();
        let mut out = Sample::zeros(sample.size(), self.output_dimension());
        for (expert_index, expert) in self.experts.iter().enumerate() {
            let rows: Vec<usize> = assignment
                .iter()
                .enumerate()
                .filter(|&(_, &winner)| winner == expert_index)
                .map(|(row, _)| row)
                .collect();
            if rows.is_empty() {
                continue;
            }
            let mut block = Sample::new(sample.dimension());
            for &row in &rows {
                block.push_row(sample.row(row))?;
            }
            let values = expert.evaluate_sample(&block)?;
            for (position, &row) in rows.iter().enumerate() {
                out.set_row(row, values.row(position))?;
            }
        }
        Ok(out)
    }

    pub(crate) fn marginal(&self, indices: &Indices) -> Result<MixtureOfExpertsEvaluation> {
        let mut experts = Vec::with_capacity(self.experts.len());
        for expert in &self.experts {
            experts.push(expert.marginal(indices.clone())?);
        }
        MixtureOfExpertsEvaluation::new(experts, (*self.classifier).clone())
    }

    pub(crate) fn is_parallel(&self) -> bool {
        self.classifier.is_parallel() && self.experts.iter().all(Function::is_parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aleator_types::Matrix;

    /// Two constant experts on the real line, picked by the sign of
    /// the input: grades are `[-x, x]`.
    fn sign_mixture() -> MixtureOfExpertsEvaluation {
        let experts = vec![
            Function::constant(Point::from(vec![-1.0]), 1),
            Function::constant(Point::from(vec![1.0]), 1),
        ];
        let classifier = Function::linear(
            Point::zeros(1),
            Point::zeros(2),
            Matrix::from_vec(1, 2, vec![-1.0, 1.0]).unwrap(),
        )
        .unwrap();
        MixtureOfExpertsEvaluation::new(experts, classifier).unwrap()
    }

    #[test]
    fn routes_by_largest_grade() {
        let mixture = sign_mixture();
        assert_eq!(
            mixture.evaluate(&Point::from(vec![-2.0])).unwrap().as_slice(),
            &[-1.0]
        );
        assert_eq!(
            mixture.evaluate(&Point::from(vec![3.0])).unwrap().as_slice(),
            &[1.0]
        );
    }

    #[test]
    fn equal_grades_pick_the_lowest_index() {
        let mixture = sign_mixture();
        assert_eq!(
            mixture.evaluate(&Point::zeros(1)).unwrap().as_slice(),
            &[-1.0]
        );
    }

    #[test]
    fn batch_matches_the_rowwise_map() {
        let mixture = sign_mixture();
        let mut sample = Sample::new(1);
        for value in [-2.0, 3.0, 0.0, 7.0, -0.5] {
            sample.push_row(&[value]).unwrap();
        }
        let batch = mixture.evaluate_sample(&sample).unwrap();
        for i in 0..sample.size() {
            assert_eq!(batch.point(i), mixture.evaluate(&sample.point(i)).unwrap());
        }
    }

    #[test]
    fn expert_shape_disagreement_is_rejected() {
        let experts = vec![
            Function::constant(Point::from(vec![1.0]), 1),
            Function::constant(Point::from(vec![1.0, 2.0]), 1),
        ];
        let classifier = Function::linear(
            Point::zeros(1),
            Point::zeros(2),
            Matrix::from_vec(1, 2, vec![-1.0, 1.0]).unwrap(),
        )
        .unwrap();
        let err = MixtureOfExpertsEvaluation::new(experts, classifier)
            .err()
            .unwrap();
        assert!(matches!(err, FunctionError::InvalidArgument(_)));
    }

    #[test]
    fn classifier_grade_count_is_checked() {
        let experts = vec![Function::constant(Point::from(vec![1.0]), 1)];
        let classifier = Function::linear(
            Point::zeros(1),
            Point::zeros(2),
            Matrix::from_vec(1, 2, vec![-1.0, 1.0]).unwrap(),
        )
        .unwrap();
        let err = MixtureOfExpertsEvaluation::new(experts, classifier)
            .err()
            .unwrap();
        assert!(matches!(err, FunctionError::InvalidArgument(_)));
    }
}
