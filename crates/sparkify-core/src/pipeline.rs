//! Sequential runner for the drop → create → copy → transform pipeline.
//!
//! Statements run one at a time on a single session. The run state advances
//! only when every statement of a stage has succeeded, so a failure reports
//! the last state the warehouse fully reached. There is no rollback and no
//! retry: recovery is a fresh run from `INIT`.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::db::StatementExecutor;
use crate::error::{EtlError, Result};
use crate::schema::{create_table_queries, drop_table_queries};
use crate::staging::{copy_table_queries, CopyConfig};
use crate::statements::{PipelineState, Stage, Statement};
use crate::transforms::{insert_table_queries, TransformOptions};

#[derive(Debug, Clone, Serialize)]
pub struct StatementOutcome {
    pub name: &'static str,
    pub stage: Stage,
    pub target: &'static str,
    pub rows_affected: u64,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: PipelineState,
    pub final_state: PipelineState,
    /// Every state reached after `started_at`, in order.
    pub transitions: Vec<PipelineState>,
    pub statements: Vec<StatementOutcome>,
}

#[derive(Debug, Error)]
#[error("{stage} statement '{statement}' failed; pipeline halted at {halted_at}: {source}")]
pub struct PipelineFailure {
    pub halted_at: PipelineState,
    pub stage: Stage,
    pub statement: &'static str,
    pub completed: Vec<StatementOutcome>,
    #[source]
    pub source: sqlx::Error,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    statements: Vec<Statement>,
}

impl Pipeline {
    /// Validates stage order and in-stage dependencies before anything runs.
    pub fn new(statements: Vec<Statement>) -> Result<Self> {
        check_stage_order(&statements)?;
        check_dependencies(&statements)?;
        Ok(Self { statements })
    }

    /// Drop and recreate every table.
    pub fn create_tables() -> Result<Self> {
        let mut statements = drop_table_queries();
        statements.extend(create_table_queries());
        Self::new(statements)
    }

    /// Load staging and build the star schema on an existing schema.
    pub fn etl(copy: &CopyConfig, options: &TransformOptions) -> Result<Self> {
        let mut statements = copy_table_queries(copy);
        statements.extend(insert_table_queries(options));
        Self::new(statements)
    }

    /// The whole run, from `INIT` to `DONE`.
    pub fn full(copy: &CopyConfig, options: &TransformOptions) -> Result<Self> {
        let mut statements = drop_table_queries();
        statements.extend(create_table_queries());
        statements.extend(copy_table_queries(copy));
        statements.extend(insert_table_queries(options));
        Self::new(statements)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = Vec::new();
        for statement in &self.statements {
            if stages.last() != Some(&statement.stage) {
                stages.push(statement.stage);
            }
        }
        stages
    }

    /// State the warehouse must be in for this pipeline to start.
    pub fn starting_state(&self) -> PipelineState {
        self.statements
            .first()
            .map(|statement| statement.stage.requires())
            .unwrap_or(PipelineState::Init)
    }

    pub async fn run<E>(
        &self,
        executor: &mut E,
    ) -> std::result::Result<PipelineReport, PipelineFailure>
    where
        E: StatementExecutor + ?Sized,
    {
        let started_at = self.starting_state();
        let mut state = started_at;
        let mut completed: Vec<StatementOutcome> = Vec::with_capacity(self.statements.len());
        let mut transitions = Vec::new();

        info!(state = %state, statements = self.statements.len(), "Starting pipeline");

        for (idx, statement) in self.statements.iter().enumerate() {
            let started = Instant::now();
            info!(
                stage = %statement.stage,
                statement = statement.name,
                target = statement.target,
                "Executing statement"
            );

            match executor.execute(&statement.sql).await {
                Ok(rows_affected) => {
                    let elapsed = started.elapsed();
                    info!(
                        stage = %statement.stage,
                        statement = statement.name,
                        rows = rows_affected,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Statement finished"
                    );
                    completed.push(StatementOutcome {
                        name: statement.name,
                        stage: statement.stage,
                        target: statement.target,
                        rows_affected,
                        elapsed,
                    });
                }
                Err(source) => {
                    error!(
                        stage = %statement.stage,
                        statement = statement.name,
                        state = %state,
                        error = %source,
                        "Statement failed; halting pipeline"
                    );
                    return Err(PipelineFailure {
                        halted_at: state,
                        stage: statement.stage,
                        statement: statement.name,
                        completed,
                        source,
                    });
                }
            }

            let stage_done = self
                .statements
                .get(idx + 1)
                .map_or(true, |next| next.stage != statement.stage);
            if stage_done {
                state = statement.stage.completes();
                info!(state = %state, "Pipeline state advanced");
                transitions.push(state);
                if state == PipelineState::FactLoaded {
                    state = PipelineState::Done;
                    info!(state = %state, "Pipeline state advanced");
                    transitions.push(state);
                }
            }
        }

        Ok(PipelineReport {
            started_at,
            final_state: state,
            transitions,
            statements: completed,
        })
    }
}

fn check_stage_order(statements: &[Statement]) -> Result<()> {
    for pair in statements.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.stage == next.stage {
            continue;
        }
        if next.stage.requires() != prev.stage.completes() {
            return Err(EtlError::Ordering(format!(
                "stage {} ('{}') cannot follow stage {} ('{}')",
                next.stage, next.name, prev.stage, prev.name
            )));
        }
    }
    Ok(())
}

fn check_dependencies(statements: &[Statement]) -> Result<()> {
    let mut handled: HashSet<(Stage, &str)> = HashSet::new();
    for statement in statements {
        for dependency in statement.depends_on {
            if !handled.contains(&(statement.stage, *dependency)) {
                return Err(EtlError::Ordering(format!(
                    "'{}' requires '{}' to be handled earlier in {}",
                    statement.name, dependency, statement.stage
                )));
            }
        }
        handled.insert((statement.stage, statement.target));
    }
    Ok(())
}

fn serialize_millis<S>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(value.as_millis() as u64)
}
