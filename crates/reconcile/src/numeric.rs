//! Tolerant comparison and parsing of raw numeric input.

/// Comparison tolerance for reconciled figures.
///
/// [`Tolerance::eq`] is absolute and decides whether a figure moved.
/// [`Tolerance::eq_scaled`] grows with magnitude above 1 and is only used to
/// check the line-item invariants, where representation error on large totals
/// must not count as an inconsistency.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tolerance {
    epsilon: f64,
}

impl Tolerance {
    pub const DEFAULT_EPSILON: f64 = 1e-5;

    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.abs(),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }

    pub fn eq_scaled(&self, a: f64, b: f64) -> bool {
        let scale = a.abs().max(b.abs()).max(1.0);
        (a - b).abs() <= self.epsilon * scale
    }

    pub fn is_zero(&self, value: f64) -> bool {
        value.abs() <= self.epsilon
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPSILON)
    }
}

/// Parse a price or total the user typed.
///
/// Blank, unparsable and zero inputs (`""`, `"."`, `"0"`, `"0.00"`) mean the
/// user has not entered a figure yet and yield `None`.
pub fn parse_entered(raw: &str) -> Option<f64> {
    parse_finite(raw).filter(|v| *v != 0.0)
}

/// Parse a quantity, falling back to `default` when nothing usable was typed.
pub fn parse_quantity(raw: &str, default: f64) -> f64 {
    parse_entered(raw).unwrap_or(default)
}

/// Parse a tax percent. Unlike prices, `"0"` is a real 0 % rate.
pub fn parse_tax_percent(raw: &str) -> Option<f64> {
    parse_finite(raw)
}

fn parse_finite(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
