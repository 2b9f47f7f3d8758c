//! Routing of expression-interpreter calls to host handlers.
//!
//! The engine only knows function names. [`FunctionRegistry::install`]
//! declares the fixed set of names in the engine's expression table once per
//! process; at call time the engine posts an [`EngineCall`](crate::EngineCall)
//! and the controller turns it into a typed [`HandlerCall`] here.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use vegaview_types::Error as SpecError;

use crate::{Error, Result};

/// Host functions callable from spec expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionFunction {
    AddFilter,
    RemoveFilter,
    RemoveAllFilters,
    SetTimeFilter,
}

impl ExpressionFunction {
    pub const ALL: [ExpressionFunction; 4] = [
        ExpressionFunction::AddFilter,
        ExpressionFunction::RemoveFilter,
        ExpressionFunction::RemoveAllFilters,
        ExpressionFunction::SetTimeFilter,
    ];

    /// Name the engine invokes (case-sensitive)
    pub fn name(&self) -> &'static str {
        match self {
            ExpressionFunction::AddFilter => "addFilter",
            ExpressionFunction::RemoveFilter => "removeFilter",
            ExpressionFunction::RemoveAllFilters => "removeAllFilters",
            ExpressionFunction::SetTimeFilter => "setTimeFilter",
        }
    }

    pub fn handler_name(&self) -> &'static str {
        match self {
            ExpressionFunction::AddFilter => "addFilterHandler",
            ExpressionFunction::RemoveFilter => "removeFilterHandler",
            ExpressionFunction::RemoveAllFilters => "removeAllFiltersHandler",
            ExpressionFunction::SetTimeFilter => "setTimeFilterHandler",
        }
    }
}

impl fmt::Display for ExpressionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExpressionFunction {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        ExpressionFunction::ALL
            .into_iter()
            .find(|function| function.name() == name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))
    }
}

/// A decoded call with typed arguments
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerCall {
    AddFilter {
        query: Value,
        index: Option<String>,
        alias: Option<String>,
    },
    RemoveFilter {
        query: Value,
        index: Option<String>,
    },
    RemoveAllFilters,
    SetTimeFilter {
        start: Value,
        end: Value,
    },
}

impl HandlerCall {
    pub fn parse(function: ExpressionFunction, args: Vec<Value>) -> Result<Self> {
        let mut args = args.into_iter();
        let call = match function {
            ExpressionFunction::AddFilter => HandlerCall::AddFilter {
                query: required(function, "query", args.next())?,
                index: optional_string(function, "index", args.next())?,
                alias: optional_string(function, "alias", args.next())?,
            },
            ExpressionFunction::RemoveFilter => HandlerCall::RemoveFilter {
                query: required(function, "query", args.next())?,
                index: optional_string(function, "index", args.next())?,
            },
            ExpressionFunction::RemoveAllFilters => HandlerCall::RemoveAllFilters,
            ExpressionFunction::SetTimeFilter => HandlerCall::SetTimeFilter {
                start: required(function, "start", args.next())?,
                end: required(function, "end", args.next())?,
            },
        };
        Ok(call)
    }

    pub fn function(&self) -> ExpressionFunction {
        match self {
            HandlerCall::AddFilter { .. } => ExpressionFunction::AddFilter,
            HandlerCall::RemoveFilter { .. } => ExpressionFunction::RemoveFilter,
            HandlerCall::RemoveAllFilters => ExpressionFunction::RemoveAllFilters,
            HandlerCall::SetTimeFilter { .. } => ExpressionFunction::SetTimeFilter,
        }
    }
}

fn required(function: ExpressionFunction, arg: &str, value: Option<Value>) -> Result<Value> {
    match value {
        Some(Value::Null) | None => Err(SpecError::InvalidArgument(format!(
            "{}() requires a {} argument",
            function, arg
        ))
        .into()),
        Some(value) => Ok(value),
    }
}

fn optional_string(
    function: ExpressionFunction,
    arg: &str,
    value: Option<Value>,
) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(SpecError::InvalidArgument(format!(
            "{}() expects {} to be a string, got {}",
            function, arg, other
        ))
        .into()),
    }
}

/// The engine-side table of functions the expression interpreter accepts
pub trait ExpressionTable {
    fn is_defined(&self, name: &str) -> bool;

    fn define(&mut self, name: &'static str);
}

static GLOBAL: Lazy<Arc<FunctionRegistry>> = Lazy::new(|| Arc::new(FunctionRegistry::new()));

/// Routing table shared by every controller in the process
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    installed: AtomicBool,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<FunctionRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Declare the host functions in the engine's table.
    ///
    /// Runs once per registry; names the engine already defines are left
    /// alone. Returns how many names were defined.
    pub fn install(&self, table: &mut dyn ExpressionTable) -> usize {
        if self.installed.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let mut defined = 0;
        for function in ExpressionFunction::ALL {
            if table.is_defined(function.name()) {
                tracing::debug!(name = function.name(), "expression function already defined");
                continue;
            }
            table.define(function.name());
            defined += 1;
        }
        defined
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Decode an engine call by name
    pub fn resolve(&self, name: &str, args: Vec<Value>) -> Result<HandlerCall> {
        let function: ExpressionFunction = name.parse()?;
        HandlerCall::parse(function, args)
    }
}
