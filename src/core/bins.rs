use crate::core::error::{GenerateError, Result};
use crate::core::model::Boundary;

/// Substituted for non-positive (or NaN) step sizes.
pub const FALLBACK_STEP: f64 = 0.1;

pub fn effective_step(step: f64) -> f64 {
    if step > 0.0 { step } else { FALLBACK_STEP }
}

/// `round((max - min) / step)`, ties to even. Negative when `min > max`.
pub fn num_steps(min: f64, max: f64, step: f64) -> i64 {
    ((max - min) / effective_step(step)).round_ties_even() as i64
}

/// Number of finite edges `generate_boundaries` will emit for this axis.
pub fn interior_count(min: f64, max: f64, step: f64) -> u64 {
    num_steps(min, max, step).saturating_add(1).max(0) as u64
}

/// Upper bound on finite edges per axis accepted from a request.
pub const MAX_INTERIOR_EDGES: u64 = 1_000_000;

/// Bin edges for one named axis, refusing ranges that would allocate more
/// than `MAX_INTERIOR_EDGES` values.
pub fn axis_boundaries(
    axis: &'static str,
    min: f64,
    max: f64,
    step: f64,
    include_infinite_bounds: bool,
) -> Result<Vec<Boundary>> {
    let count = interior_count(min, max, step);
    if count > MAX_INTERIOR_EDGES {
        return Err(GenerateError::TooManyBins {
            axis,
            count,
            limit: MAX_INTERIOR_EDGES,
        });
    }
    Ok(generate_boundaries(min, max, step, include_infinite_bounds))
}

pub fn generate_boundaries(
    min: f64,
    max: f64,
    step: f64,
    include_infinite_bounds: bool,
) -> Vec<Boundary> {
    let step = effective_step(step);
    let count = interior_count(min, max, step) as usize;
    let mut out = Vec::with_capacity(count + 2);
    if include_infinite_bounds {
        out.push(Boundary::NegInf);
    }
    // Each edge is min + i * step, never a running sum.
    for i in 0..count {
        out.push(Boundary::Edge(round_sig6(min + i as f64 * step)));
    }
    if include_infinite_bounds {
        out.push(Boundary::PosInf);
    }
    out
}

pub fn round_sig6(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.5e}", value).parse().unwrap_or(value)
}

/// Inline list literal as it appears under `bins.boundaries` in west.cfg:
/// sentinels are quoted strings, edges are bare floats.
pub fn format_boundaries(bounds: &[Boundary]) -> String {
    let mut s = String::with_capacity(bounds.len() * 6 + 2);
    s.push('[');
    for (i, b) in bounds.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        match b {
            Boundary::NegInf => s.push_str("'-inf'"),
            Boundary::PosInf => s.push_str("'inf'"),
            Boundary::Edge(v) => s.push_str(&format_float(*v)),
        }
    }
    s.push(']');
    s
}

/// Shortest round-trip float text that always reads back as a float:
/// integral values keep a trailing `.0`, very small or very large
/// magnitudes switch to `1e-05` / `1e+16` exponent form.
pub fn format_float(v: f64) -> String {
    if v == 0.0 {
        let zero = if v.is_sign_negative() { "-0.0" } else { "0.0" };
        return zero.to_string();
    }
    if !v.is_finite() {
        return format!("{}", v);
    }
    let sci = format!("{:e}", v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.abs());
    }
    let fixed = format!("{}", v);
    if fixed.contains('.') {
        fixed
    } else {
        format!("{}.0", fixed)
    }
}
