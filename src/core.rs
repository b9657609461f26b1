//! Core estimation traits and the RANSAC pipeline.
//!
//! The pipeline is generic over five pluggable pieces:
//! - an [`Estimator`] turning samples into model hypotheses,
//! - a [`Sampler`] drawing minimal samples,
//! - a [`Scoring`] strategy ranking hypotheses and selecting inliers,
//! - a [`LocalOptimizer`] refining promising hypotheses,
//! - a [`TerminationCriterion`] adapting the iteration budget.

use log::debug;

use crate::{settings::RansacSettings, types::DataMatrix};

/// Attempts at drawing a valid sample and model within one iteration.
const MAX_SAMPLE_ATTEMPTS: usize = 100;

/// Estimator responsible for generating model hypotheses from samples.
pub trait Estimator {
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Size of a minimal sample for this estimator.
    fn sample_size(&self) -> usize;

    /// Check whether a given sample is geometrically valid.
    fn is_valid_sample(&self, data: &DataMatrix, sample: &[usize]) -> bool;

    /// Estimate candidate models from a sample of any size ≥ `sample_size`.
    fn estimate_model(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model>;

    /// Least-squares fit over a larger-than-minimal point set.
    fn estimate_model_nonminimal(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model> {
        self.estimate_model(data, sample)
    }

    /// Validate a candidate model before scoring.
    fn is_valid_model(
        &self,
        model: &Self::Model,
        data: &DataMatrix,
        sample: &[usize],
        threshold: f64,
    ) -> bool;
}

/// Sampler responsible for drawing minimal samples from the data.
pub trait Sampler {
    /// Draw a sample of `sample_size` elements into `out_indices`.
    ///
    /// Returns `false` if a valid sample could not be drawn (caller may retry).
    fn sample(&mut self, data: &DataMatrix, sample_size: usize, out_indices: &mut [usize]) -> bool;
}

/// Scoring strategy used to evaluate model quality and determine inliers.
pub trait Scoring<M> {
    /// Score type – must support ordering for "better than" comparisons.
    type Score: Clone + PartialOrd;

    /// Inlier/outlier threshold for residuals in the chosen domain.
    fn threshold(&self) -> f64;

    /// Score a model and return its inlier set through `inliers_out`.
    fn score(&self, data: &DataMatrix, model: &M, inliers_out: &mut Vec<usize>) -> Self::Score;
}

/// Local optimization strategy refining a model using its inliers.
pub trait LocalOptimizer<M, Sc: Scoring<M>> {
    /// Returns `(refined_model, refined_score, refined_inliers)`; implementors
    /// return the input unchanged when no refinement beats it.
    fn run(
        &mut self,
        data: &DataMatrix,
        inliers: &[usize],
        model: &M,
        score: &Sc::Score,
        scoring: &Sc,
    ) -> (M, Sc::Score, Vec<usize>);
}

/// Local optimizer that returns its input unchanged.
pub struct NoopLocalOptimizer;

impl<M: Clone, Sc: Scoring<M>> LocalOptimizer<M, Sc> for NoopLocalOptimizer {
    fn run(
        &mut self,
        _data: &DataMatrix,
        inliers: &[usize],
        model: &M,
        score: &Sc::Score,
        _scoring: &Sc,
    ) -> (M, Sc::Score, Vec<usize>) {
        (model.clone(), score.clone(), inliers.to_vec())
    }
}

/// Least-squares local optimizer.
///
/// Refits the model on all current inliers, rescores it, and repeats while the
/// score keeps improving, up to `max_iterations` refits.
pub struct LeastSquaresOptimizer<E>
where
    E: Estimator,
{
    estimator: E,
    max_iterations: usize,
}

impl<E> LeastSquaresOptimizer<E>
where
    E: Estimator,
{
    pub fn new(estimator: E) -> Self {
        Self {
            estimator,
            max_iterations: 10,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl<E, Sc> LocalOptimizer<E::Model, Sc> for LeastSquaresOptimizer<E>
where
    E: Estimator,
    Sc: Scoring<E::Model>,
{
    fn run(
        &mut self,
        data: &DataMatrix,
        inliers: &[usize],
        model: &E::Model,
        score: &Sc::Score,
        scoring: &Sc,
    ) -> (E::Model, Sc::Score, Vec<usize>) {
        let mut best_model = model.clone();
        let mut best_score = score.clone();
        let mut best_inliers = inliers.to_vec();
        let mut candidate_inliers = Vec::new();

        for _ in 0..self.max_iterations {
            if best_inliers.len() < self.estimator.sample_size() {
                break;
            }

            let refit = self
                .estimator
                .estimate_model_nonminimal(data, &best_inliers)
                .into_iter()
                .find(|m| {
                    let threshold = scoring.threshold();
                    self.estimator.is_valid_model(m, data, &best_inliers, threshold)
                });
            let Some(refit) = refit else {
                break;
            };

            let refit_score = scoring.score(data, &refit, &mut candidate_inliers);
            if refit_score > best_score {
                best_model = refit;
                best_score = refit_score;
                std::mem::swap(&mut best_inliers, &mut candidate_inliers);
            } else {
                break;
            }
        }

        (best_model, best_score, best_inliers)
    }
}

/// Termination criterion deciding when the RANSAC loop can stop.
pub trait TerminationCriterion<S> {
    /// Update the termination state, possibly lowering `max_iterations`.
    ///
    /// Returns `true` if the algorithm should terminate immediately.
    fn check(
        &mut self,
        data: &DataMatrix,
        best_score: &S,
        sample_size: usize,
        max_iterations: &mut usize,
    ) -> bool;
}

/// RANSAC termination criterion that shrinks the iteration budget from the
/// current inlier ratio and desired confidence:
/// `N = log(1 - confidence) / log(1 - inlier_ratio^sample_size)`.
pub struct RansacTerminationCriterion {
    /// Desired confidence in \[0, 1).
    pub confidence: f64,
}

impl TerminationCriterion<crate::scoring::Score> for RansacTerminationCriterion {
    fn check(
        &mut self,
        data: &DataMatrix,
        best_score: &crate::scoring::Score,
        sample_size: usize,
        max_iterations: &mut usize,
    ) -> bool {
        let n = data.nrows();
        if n == 0 {
            return false;
        }

        let inlier_ratio = (best_score.inlier_count as f64 / n as f64).clamp(0.0, 1.0);
        if inlier_ratio <= 0.0 {
            return false;
        }
        if inlier_ratio >= 1.0 {
            *max_iterations = (*max_iterations).min(1);
            return false;
        }

        let p_good_sample = inlier_ratio.powi(sample_size as i32);
        if p_good_sample <= 0.0 || p_good_sample >= 1.0 {
            return false;
        }

        let log_one_minus_conf = (1.0 - self.confidence).ln();
        let log_one_minus_p = (1.0 - p_good_sample).ln();
        if !log_one_minus_conf.is_finite() || !log_one_minus_p.is_finite() {
            return false;
        }

        let required = (log_one_minus_conf / log_one_minus_p).ceil().max(1.0) as usize;
        if required < *max_iterations {
            *max_iterations = required;
        }

        // The loop stops on its own once the (possibly lowered) budget runs out.
        false
    }
}

/// Generic RANSAC pipeline orchestrating the components above.
pub struct RansacPipeline<E, Sa, Sc, LO, T>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring<E::Model>,
    LO: LocalOptimizer<E::Model, Sc>,
    T: TerminationCriterion<Sc::Score>,
{
    pub settings: RansacSettings,
    pub estimator: E,
    pub sampler: Sa,
    pub scoring: Sc,
    pub local_optimizer: Option<LO>,
    pub final_optimizer: Option<LO>,
    pub termination: T,

    // Outputs / diagnostics
    pub best_model: Option<E::Model>,
    pub best_inliers: Vec<usize>,
    pub best_score: Option<Sc::Score>,
    pub iteration: usize,
    /// Iterations that produced at least one model hypothesis.
    pub hypothesis_iterations: usize,
}

impl<E, Sa, Sc, LO, T> RansacPipeline<E, Sa, Sc, LO, T>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring<E::Model>,
    LO: LocalOptimizer<E::Model, Sc>,
    T: TerminationCriterion<Sc::Score>,
{
    /// Create a new pipeline from its components.
    pub fn new(
        settings: RansacSettings,
        estimator: E,
        sampler: Sa,
        scoring: Sc,
        local_optimizer: Option<LO>,
        final_optimizer: Option<LO>,
        termination: T,
    ) -> Self {
        Self {
            settings,
            estimator,
            sampler,
            scoring,
            local_optimizer,
            final_optimizer,
            termination,
            best_model: None,
            best_inliers: Vec::new(),
            best_score: None,
            iteration: 0,
            hypothesis_iterations: 0,
        }
    }

    /// Run the RANSAC loop on the given data matrix.
    ///
    /// Manages sampling, model generation, scoring, optional local
    /// optimization and the adaptive iteration budget, then applies the final
    /// optimizer to the best model found.
    pub fn run(&mut self, data: &DataMatrix) {
        let sample_size = self.estimator.sample_size();
        let mut sample = vec![0usize; sample_size];
        let mut tmp_inliers = Vec::new();

        let mut max_iterations = self.settings.max_iterations;
        let min_iterations = self.settings.min_iterations;

        self.best_inliers.clear();
        self.best_model = None;
        self.best_score = None;
        self.iteration = 0;
        self.hypothesis_iterations = 0;

        if data.nrows() < sample_size {
            debug!("ransac: {} rows, need at least {sample_size}", data.nrows());
            return;
        }

        let threshold = self.scoring.threshold();

        while self.iteration < max_iterations.max(min_iterations) {
            let mut models: Vec<E::Model> = Vec::new();

            for _ in 0..MAX_SAMPLE_ATTEMPTS {
                if !self.sampler.sample(data, sample_size, &mut sample[..])
                    || !self.estimator.is_valid_sample(data, &sample)
                {
                    continue;
                }

                models = self.estimator.estimate_model(data, &sample);
                if !models.is_empty() {
                    break;
                }
            }

            if models.is_empty() {
                self.iteration += 1;
                continue;
            }
            self.hypothesis_iterations += 1;

            let mut iteration_improved_best = false;

            for model in models.iter() {
                if !self.estimator.is_valid_model(model, data, &sample, threshold) {
                    continue;
                }

                let score = self.scoring.score(data, model, &mut tmp_inliers);

                let better = match &self.best_score {
                    None => true,
                    Some(best) => score > *best,
                };

                if better {
                    self.best_score = Some(score);
                    self.best_model = Some(model.clone());
                    self.best_inliers.clear();
                    self.best_inliers.extend_from_slice(&tmp_inliers);
                    iteration_improved_best = true;
                }
            }

            if iteration_improved_best {
                if let (Some(lo), Some(best_model), Some(best_score)) = (
                    &mut self.local_optimizer,
                    &self.best_model,
                    &self.best_score,
                ) {
                    let (refined_model, refined_score, refined_inliers) = lo.run(
                        data,
                        &self.best_inliers,
                        best_model,
                        best_score,
                        &self.scoring,
                    );

                    if refined_score > *best_score {
                        self.best_model = Some(refined_model);
                        self.best_score = Some(refined_score);
                        self.best_inliers = refined_inliers;
                    }
                }

                if let Some(best_score) = &self.best_score {
                    let done = self.termination.check(
                        data,
                        best_score,
                        sample_size,
                        &mut max_iterations,
                    );
                    if done {
                        self.iteration += 1;
                        break;
                    }
                }
            }

            self.iteration += 1;
        }

        if let (Some(final_opt), Some(best_model), Some(best_score)) = (
            &mut self.final_optimizer,
            &self.best_model,
            &self.best_score,
        ) {
            if self.best_inliers.len() >= sample_size {
                let (refined_model, refined_score, refined_inliers) = final_opt.run(
                    data,
                    &self.best_inliers,
                    best_model,
                    best_score,
                    &self.scoring,
                );

                if refined_score >= *best_score {
                    self.best_model = Some(refined_model);
                    self.best_score = Some(refined_score);
                    self.best_inliers = refined_inliers;
                }
            }
        }

        debug!(
            "ransac: {} iterations ({} with hypotheses), {} inliers of {}",
            self.iteration,
            self.hypothesis_iterations,
            self.best_inliers.len(),
            data.nrows()
        );
    }
}
