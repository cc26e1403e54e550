use crate::core::error::{GenerateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A declared template parameter: its wire name and the value used when a
/// request leaves it out.
#[derive(Clone, Copy, Debug)]
pub struct Param<T: 'static> {
    pub name: &'static str,
    pub default: T,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParamInfo {
    pub name: &'static str,
    pub kind: &'static str,
    pub default: String,
}

impl Param<f64> {
    pub fn info(&self) -> ParamInfo {
        ParamInfo {
            name: self.name,
            kind: "float",
            default: format!("{:?}", self.default),
        }
    }
}

impl Param<i64> {
    pub fn info(&self) -> ParamInfo {
        ParamInfo {
            name: self.name,
            kind: "integer",
            default: self.default.to_string(),
        }
    }
}

impl Param<bool> {
    pub fn info(&self) -> ParamInfo {
        ParamInfo {
            name: self.name,
            kind: "flag",
            default: self.default.to_string(),
        }
    }
}

impl Param<&'static str> {
    pub fn info(&self) -> ParamInfo {
        ParamInfo {
            name: self.name,
            kind: "text",
            default: self.default.to_string(),
        }
    }
}

pub const PC1_MIN: Param<f64> = Param { name: "pc1_min", default: 0.0 };
pub const PC1_MAX: Param<f64> = Param { name: "pc1_max", default: 8.0 };
pub const PC1_STEP: Param<f64> = Param { name: "pc1_step", default: 0.2 };
pub const PC2_MIN: Param<f64> = Param { name: "pc2_min", default: 0.0 };
pub const PC2_MAX: Param<f64> = Param { name: "pc2_max", default: 8.0 };
pub const PC2_STEP: Param<f64> = Param { name: "pc2_step", default: 0.2 };
pub const NSTLIM: Param<i64> = Param { name: "nstlim", default: 50_000 };
pub const NTPR: Param<i64> = Param { name: "ntpr", default: 500 };
pub const BIN_TARGET_COUNTS: Param<i64> = Param {
    name: "bin_target_counts",
    default: 4,
};
pub const MAX_TOTAL_ITERATIONS: Param<i64> = Param {
    name: "max_total_iterations",
    default: 1000,
};
pub const PROTEIN_NAME: Param<&str> = Param {
    name: "protein_name",
    default: "protein",
};
pub const ACCOUNT: Param<&str> = Param {
    name: "account",
    default: "account",
};
pub const EMAIL: Param<&str> = Param {
    name: "email",
    default: "user@example.com",
};
pub const ENABLE_GPU_PARALLELIZATION: Param<bool> = Param {
    name: "enable_gpu_parallelization",
    default: true,
};
pub const INCLUDE_INFINITE_BOUNDS: Param<bool> = Param {
    name: "include_infinite_bounds",
    default: true,
};

/// Caller-supplied simulation parameters, keyed by name.
///
/// Values arrive either as native JSON scalars or as strings (HTML form
/// fields); the typed accessors accept both. `null` counts as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(Map<String, Value>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(GenerateError::InvalidParameters(json_kind(&other).to_string())),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Later values win.
    pub fn merge(&mut self, other: ParameterSet) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn float(&self, param: &Param<f64>) -> Result<f64> {
        match self.lookup(param.name) {
            Some(v) => coerce_float(param.name, v),
            None => Ok(param.default),
        }
    }

    pub fn integer(&self, param: &Param<i64>) -> Result<i64> {
        match self.lookup(param.name) {
            Some(v) => coerce_integer(param.name, v),
            None => Ok(param.default),
        }
    }

    pub fn flag(&self, param: &Param<bool>) -> Result<bool> {
        match self.lookup(param.name) {
            Some(v) => coerce_flag(param.name, v),
            None => Ok(param.default),
        }
    }

    pub fn text(&self, param: &Param<&'static str>) -> Result<String> {
        match self.lookup(param.name) {
            Some(v) => coerce_text(param.name, v),
            None => Ok(param.default.to_string()),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }
}

fn coerce_float(name: &'static str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(coercion_error(name, "a finite number", value)),
    }
}

fn coerce_integer(name: &'static str, value: &Value) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| coercion_error(name, "an integer", value))
}

fn coerce_flag(name: &'static str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            _ => Err(coercion_error(name, "a boolean", value)),
        },
        _ => Err(coercion_error(name, "a boolean", value)),
    }
}

fn coerce_text(name: &'static str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(coercion_error(name, "text", value)),
    }
}

fn coercion_error(name: &'static str, expected: &'static str, value: &Value) -> GenerateError {
    GenerateError::Coercion {
        name,
        expected,
        value: value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
