//! The stage executor: drives the state machine over a driver.
//!
//! `run` never returns an error. Every failure is recorded in the run's
//! error list and metrics, the retry counter advances, and the state
//! machine decides whether to re-enter the stage or stop. Callers
//! inspect the returned [`AnalysisRun`] to see how far the pipeline
//! got.

use crate::{
    AUDITOR_PROMPT, DISCOVERER_PROMPT, MODIFIER_PROMPT, PipelineConfig, RunMetrics, Stage,
    StageOutcome, advance, audit_script, parse_auditor, parse_discoverer, parse_modifier,
    reconcile, sanitize_response,
};
use dramaturge_core::{
    AuditorOutput, DiscovererOutput, GenerateRequest, Message, ModifierOutput, Script,
};
use dramaturge_error::{DramaturgeResult, PipelineError, PipelineErrorKind};
use dramaturge_interface::AnalysisDriver;
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

/// The complete record of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisRun {
    /// Stage 1 output, present once Discover succeeds
    pub discoverer_output: Option<DiscovererOutput>,
    /// Stage 2 output, present once Audit succeeds
    pub auditor_output: Option<AuditorOutput>,
    /// Stage 3 output, present once Modify succeeds
    pub modifier_output: Option<ModifierOutput>,
    /// Accumulated failure messages and reconciler warnings
    pub errors: Vec<String>,
    /// Reconciler merge/penalty log from Stage 1
    pub reconcile_log: Vec<String>,
    /// Retries consumed, shared across stages
    pub retry_count: u32,
    /// Where the state machine stopped
    pub final_stage: Option<Stage>,
    /// Run-scoped metrics
    pub metrics: RunMetrics,
}

impl AnalysisRun {
    /// Whether all three stages produced output.
    pub fn is_complete(&self) -> bool {
        self.discoverer_output.is_some()
            && self.auditor_output.is_some()
            && self.modifier_output.is_some()
    }
}

/// Drives the three stages against a model driver.
pub struct StageExecutor<D: AnalysisDriver> {
    driver: D,
    config: PipelineConfig,
}

impl<D: AnalysisDriver> StageExecutor<D> {
    /// Create an executor over a driver with the given configuration.
    pub fn new(driver: D, config: PipelineConfig) -> Self {
        Self { driver, config }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The run configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the full pipeline over a script.
    #[tracing::instrument(skip(self, script), fields(scene_count = script.scene_count()))]
    pub async fn run(&self, script: &Script) -> AnalysisRun {
        let mut run = AnalysisRun::default();
        let run_start = Instant::now();

        // Init does no work; enter Discover through the transition fn.
        let mut stage = advance(Stage::Init, StageOutcome::Success, 0);

        while !stage.is_terminal() {
            let attempt_start = Instant::now();
            let result = match stage {
                Stage::Discover => self.run_discover(script, &mut run).await,
                Stage::Audit => self.run_audit(script, &mut run).await,
                Stage::Modify => self.run_modify(script, &mut run).await,
                Stage::Init | Stage::Done | Stage::Failed => break,
            };
            run.metrics
                .record_stage_duration(stage, attempt_start.elapsed().as_secs_f64());

            let outcome = match result {
                Ok(()) => {
                    tracing::info!(stage = %stage, "Stage completed");
                    StageOutcome::Success
                }
                Err(e) => {
                    tracing::error!(stage = %stage, error = %e, "Stage failed");
                    let message = format!("{stage} error: {e}");
                    run.errors.push(message.clone());
                    run.metrics.record_failure(stage, message);
                    run.retry_count += 1;
                    run.metrics.record_retry(stage);
                    StageOutcome::RecoverableFailure
                }
            };
            stage = advance(stage, outcome, run.retry_count);
        }

        run.final_stage = Some(stage);
        run.metrics
            .set_total_duration(run_start.elapsed().as_secs_f64());
        tracing::info!(
            final_stage = %stage,
            model_calls = run.metrics.total_model_calls(),
            retries = run.retry_count,
            "Pipeline run finished"
        );
        run
    }

    async fn run_discover(&self, script: &Script, run: &mut AnalysisRun) -> DramaturgeResult<()> {
        let script_json = to_pretty_json(script)?;
        let messages = vec![
            Message::system(DISCOVERER_PROMPT),
            Message::user(format!("Analyze this script:\n\n{script_json}")),
        ];
        let text = self.complete(Stage::Discover, messages, run).await?;
        let output = parse_discoverer(&sanitize_response(&text))?;

        let DiscovererOutput { tccs, metadata } = output;
        let outcome = reconcile(tccs, script, self.config.reconciler());
        for log in &outcome.logs {
            tracing::info!(%log, "Reconciler");
        }
        run.reconcile_log.extend(outcome.logs);
        // Residual warnings could not be auto-resolved; surface them.
        run.errors.extend(outcome.warnings);

        tracing::info!(tcc_count = outcome.tccs.len(), "Identified threads after reconcile");
        run.discoverer_output = Some(DiscovererOutput {
            tccs: outcome.tccs,
            metadata,
        });
        Ok(())
    }

    async fn run_audit(&self, script: &Script, run: &mut AnalysisRun) -> DramaturgeResult<()> {
        let discoverer = run.discoverer_output.as_ref().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::MissingStageOutput("discover".to_string()))
        })?;
        let input = json!({
            "script": script,
            "tccs": discoverer.tccs,
        });
        let messages = vec![
            Message::system(AUDITOR_PROMPT),
            Message::user(format!("Rank these TCCs:\n\n{}", to_pretty_json(&input)?)),
        ];
        let text = self.complete(Stage::Audit, messages, run).await?;
        let output = parse_auditor(&sanitize_response(&text))?;

        tracing::info!(
            a_line = %output.rankings.a_line.tcc_id,
            spine_score = output.rankings.a_line.spine_score,
            b_lines = output.rankings.b_lines.len(),
            c_lines = output.rankings.c_lines.len(),
            "Ranking complete"
        );
        run.auditor_output = Some(output);
        Ok(())
    }

    async fn run_modify(&self, script: &Script, run: &mut AnalysisRun) -> DramaturgeResult<()> {
        let report = audit_script(script);
        if report.issues.is_empty() {
            tracing::info!("No structural issues found, skipping Modifier");
            run.modifier_output = Some(ModifierOutput::empty(script.clone()));
            return Ok(());
        }

        let input = json!({
            "script": script,
            "audit_report": report,
        });
        let messages = vec![
            Message::system(MODIFIER_PROMPT),
            Message::user(format!("Fix these issues:\n\n{}", to_pretty_json(&input)?)),
        ];
        tracing::info!(issues = report.issues.len(), "Calling model to fix issues");
        let text = self.complete(Stage::Modify, messages, run).await?;
        let output = parse_modifier(&sanitize_response(&text))?;

        tracing::info!(
            total_issues = output.validation.total_issues,
            fixed = output.validation.fixed,
            skipped = output.validation.skipped,
            "Modifications complete"
        );
        run.modifier_output = Some(output);
        Ok(())
    }

    async fn complete(
        &self,
        stage: Stage,
        messages: Vec<Message>,
        run: &mut AnalysisRun,
    ) -> DramaturgeResult<String> {
        let request = GenerateRequest {
            messages,
            max_tokens: *self.config.max_tokens(),
            temperature: *self.config.temperature(),
            model: self.config.model().clone(),
        };
        run.metrics.record_model_call(stage);
        let response = self.driver.generate(&request).await?;
        Ok(response.text)
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> DramaturgeResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::new(PipelineErrorKind::Serialization(e.to_string())).into())
}
