//! End-to-end training: windowing, split, scaling, search and validation.

use std::collections::BTreeMap;

use cadence_window::{DatasetBuilder, LabeledTable, SampleStream, Window, WindowSampler};
use tracing::{debug, info, instrument};

use crate::capability::{
    Classifier, HyperparameterSearch, Scaler, SearchProgress, TracingProgress,
};
use crate::config::PipelineConfig;
use crate::error::{ModelError, SearchError};
use crate::grid::ParamGrid;
use crate::inference::InferenceEngine;
use crate::metrics::ValidationReport;
use crate::split::train_validation_split;
use crate::state::TrainedState;

/// Summary of one [`TrainingPipeline::fit`] run.
#[derive(Debug, Clone)]
pub struct FitReport<P> {
    /// Rows in the input table.
    pub n_rows: usize,
    /// Windows the table was partitioned into, in order.
    pub windows: Vec<Window>,
    /// Rows covered by `windows`; the rest were dropped.
    pub rows_consumed: usize,
    /// Window count per aggregated label.
    pub label_counts: BTreeMap<usize, usize>,
    /// Windows used for fitting.
    pub n_train: usize,
    /// Windows held out for validation.
    pub n_validation: usize,
    /// Grid position of the winning candidate.
    pub best_candidate: usize,
    /// Winning mean cross-validated score.
    pub best_score: f64,
    /// Winning parameters.
    pub best_params: P,
    /// Scores on the held-out windows.
    pub validation: ValidationReport,
}

/// Trains a classifier over randomized windows of a labeled table.
///
/// Owns the window stream, the parameter grid, the search capability and,
/// after a successful [`TrainingPipeline::fit`] or
/// [`TrainingPipeline::install_state`], the inference engine.
pub struct TrainingPipeline<C, S, H>
where
    C: Classifier,
{
    config: PipelineConfig,
    grid: ParamGrid<C::Params>,
    search: H,
    progress: Box<dyn SearchProgress + Send>,
    stream: SampleStream,
    engine: Option<InferenceEngine<C, S>>,
}

impl<C, S, H> TrainingPipeline<C, S, H>
where
    C: Classifier,
    S: Scaler,
    H: HyperparameterSearch<C>,
{
    /// Create an untrained pipeline.
    ///
    /// Search progress goes to [`TracingProgress`] until
    /// [`TrainingPipeline::with_progress`] replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] if `config` fails
    /// [`PipelineConfig::validate`].
    pub fn new(
        config: PipelineConfig,
        grid: ParamGrid<C::Params>,
        search: H,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        let stream = SampleStream::new(config.seed);
        Ok(Self {
            config,
            grid,
            search,
            progress: Box::new(TracingProgress),
            stream,
            engine: None,
        })
    }

    /// Report per-candidate search progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: impl SearchProgress + Send + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// The pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The candidate grid handed to the search.
    #[must_use]
    pub fn grid(&self) -> &ParamGrid<C::Params> {
        &self.grid
    }

    /// The inference engine of the current trained state.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotTrained`] before the first fit or install.
    pub fn engine(&self) -> Result<&InferenceEngine<C, S>, ModelError> {
        self.engine.as_ref().ok_or(ModelError::NotTrained)
    }

    /// The current trained state.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotTrained`] before the first fit or install.
    pub fn state(&self) -> Result<&TrainedState<C, S>, ModelError> {
        self.engine().map(InferenceEngine::state)
    }

    /// Replace the trained state, e.g. with one from [`TrainedState::load`].
    pub fn install_state(&mut self, state: TrainedState<C, S>) {
        match &mut self.engine {
            Some(engine) => {
                engine.replace_state(state);
            }
            None => self.engine = Some(InferenceEngine::new(state)),
        }
    }

    /// Consume the pipeline, returning its engine if trained.
    #[must_use]
    pub fn into_engine(self) -> Option<InferenceEngine<C, S>> {
        self.engine
    }

    /// Train on `table` and replace the trained state.
    ///
    /// The stream is re-seeded with the configured seed, so identical input
    /// gives identical windows, split and scaler. On error the previous state
    /// is kept.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NoWindows`] | the table is shorter than the narrowest width |
    /// | [`ModelError::TooFewWindows`] | train or validation side would be empty |
    /// | [`ModelError::SearchExhausted`] | every candidate failed; carries each reason |
    /// | [`ModelError::Search`] | any other search failure |
    /// | [`ModelError::Capability`] | scaler fitting or validation scoring failed |
    #[instrument(skip_all, fields(n_rows = table.n_rows(), widths = %self.config.widths))]
    pub fn fit(&mut self, table: &LabeledTable) -> Result<FitReport<C::Params>, ModelError> {
        let widths = self.config.widths.clone();
        let builder = DatasetBuilder::new(WindowSampler::new(widths.clone()));
        let dataset = builder.build(table, &mut self.stream, Some(self.config.seed))?;
        if dataset.is_empty() {
            return Err(ModelError::NoWindows {
                n_rows: table.n_rows(),
                widths: widths.to_string(),
                min_width: widths.min(),
            });
        }

        let split = train_validation_split(
            dataset.len(),
            self.config.validation_fraction,
            self.config.split_seed,
        )?;
        let pick = |indices: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
            indices
                .iter()
                .map(|&i| (dataset.features()[i].clone(), dataset.labels()[i]))
                .unzip()
        };
        let (train_x, train_y) = pick(&split.train);
        let (val_x, val_y) = pick(&split.validation);

        let scaler = S::fit(&train_x).map_err(ModelError::capability("scaler fit"))?;
        let train_scaled = scaler
            .transform_batch(&train_x)
            .map_err(ModelError::capability("scaler transform"))?;
        debug!(n_train = train_x.len(), n_validation = val_x.len(), "scaler fitted");

        let outcome = self
            .search
            .evaluate_all_candidates(
                &train_scaled,
                &train_y,
                &self.grid,
                self.config.n_folds,
                &*self.progress,
            )
            .map_err(|e| match e {
                SearchError::AllCandidatesFailed { failures } => {
                    ModelError::SearchExhausted { failures }
                }
                other => ModelError::Search(other),
            })?;
        info!(
            candidate = outcome.candidate,
            score = outcome.score,
            params = ?outcome.params,
            "search done"
        );

        let engine = InferenceEngine::new(TrainedState::new(outcome.classifier, scaler, widths));
        let validation = engine.evaluate(&val_x, &val_y, self.config.positive_class)?;
        info!(
            accuracy = validation.accuracy,
            roc_auc = ?validation.roc_auc,
            "validation scored"
        );
        self.engine = Some(engine);

        Ok(FitReport {
            n_rows: table.n_rows(),
            rows_consumed: dataset.rows_consumed(),
            label_counts: dataset.label_counts(),
            windows: dataset.windows().to_vec(),
            n_train: split.train.len(),
            n_validation: split.validation.len(),
            best_candidate: outcome.candidate,
            best_score: outcome.score,
            best_params: outcome.params,
            validation,
        })
    }
}
