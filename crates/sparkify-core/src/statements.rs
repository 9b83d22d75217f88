use std::fmt;

use serde::Serialize;

/// Progress of a full pipeline run. A run only moves forward; a failing
/// statement leaves the run at the last state it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Init,
    SchemaDropped,
    SchemaCreated,
    StagingLoaded,
    DimensionsLoaded,
    FactLoaded,
    Done,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Init => "INIT",
            PipelineState::SchemaDropped => "SCHEMA_DROPPED",
            PipelineState::SchemaCreated => "SCHEMA_CREATED",
            PipelineState::StagingLoaded => "STAGING_LOADED",
            PipelineState::DimensionsLoaded => "DIMENSIONS_LOADED",
            PipelineState::FactLoaded => "FACT_LOADED",
            PipelineState::Done => "DONE",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DropTables,
    CreateTables,
    CopyStaging,
    LoadDimensions,
    LoadFact,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::DropTables,
        Stage::CreateTables,
        Stage::CopyStaging,
        Stage::LoadDimensions,
        Stage::LoadFact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DropTables => "drop_tables",
            Stage::CreateTables => "create_tables",
            Stage::CopyStaging => "copy_staging",
            Stage::LoadDimensions => "load_dimensions",
            Stage::LoadFact => "load_fact",
        }
    }

    /// State the warehouse must be in before this stage may run.
    pub fn requires(&self) -> PipelineState {
        match self {
            Stage::DropTables => PipelineState::Init,
            Stage::CreateTables => PipelineState::SchemaDropped,
            Stage::CopyStaging => PipelineState::SchemaCreated,
            Stage::LoadDimensions => PipelineState::StagingLoaded,
            Stage::LoadFact => PipelineState::DimensionsLoaded,
        }
    }

    /// State reached once every statement of this stage succeeded.
    pub fn completes(&self) -> PipelineState {
        match self {
            Stage::DropTables => PipelineState::SchemaDropped,
            Stage::CreateTables => PipelineState::SchemaCreated,
            Stage::CopyStaging => PipelineState::StagingLoaded,
            Stage::LoadDimensions => PipelineState::DimensionsLoaded,
            Stage::LoadFact => PipelineState::FactLoaded,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == value.replace('-', "_"))
            .ok_or_else(|| format!("unknown stage '{value}'"))
    }
}

/// One SQL statement of the pipeline together with what it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub name: &'static str,
    pub stage: Stage,
    /// Table the statement drops, creates or writes.
    pub target: &'static str,
    /// Tables that an earlier statement of the same stage must have handled
    /// first (foreign-key targets on create, referencing tables on drop).
    pub depends_on: &'static [&'static str],
    pub sql: String,
}

impl Statement {
    pub fn new(
        name: &'static str,
        stage: Stage,
        target: &'static str,
        sql: impl Into<String>,
    ) -> Self {
        Self {
            name,
            stage,
            target,
            depends_on: &[],
            sql: sql.into(),
        }
    }

    pub fn depends_on(mut self, tables: &'static [&'static str]) -> Self {
        self.depends_on = tables;
        self
    }
}

/// Renders a statement list the way the warehouse console expects it.
pub fn render_script(statements: &[Statement]) -> String {
    let mut script = String::new();
    for statement in statements {
        script.push_str(&format!("-- {} / {}\n", statement.stage, statement.name));
        script.push_str(statement.sql.trim());
        script.push_str(";\n\n");
    }
    script
}
