use std::fmt;

use serde::Serialize;
use shardplan_common::{Error, Result};

use crate::Operator;

/// Serializable view of an operator tree, built only from each node's
/// description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDescription {
    pub operator_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PlanDescription>,
}

impl PlanDescription {
    pub fn from_operator(op: &Operator) -> Self {
        let description = op.description();
        Self {
            operator_type: description.operator_type,
            variant: description.variant,
            label: op.short_description(),
            inputs: op.inputs().into_iter().map(Self::from_operator).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("failed to serialize plan: {}", e)))
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.operator_type, indent = depth * 2)?;
        if let Some(variant) = &self.variant {
            write!(f, "[{}]", variant)?;
        }
        if !self.label.is_empty() {
            write!(f, " {}", self.label)?;
        }
        writeln!(f)?;
        for input in &self.inputs {
            input.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
