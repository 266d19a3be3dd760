//! Rendering totals as a natural-language answer

use super::plan::Total;
use super::quantity::pluralize;

/// Format a number the way a person would write it: integral values without a fraction
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "not a number".to_string()
    } else if value.is_infinite() {
        let label = if value > 0.0 { "infinity" } else { "negative infinity" };
        label.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        // `as i64` also folds -0.0 into 0
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// A number with its label, pluralised unless the count is exactly one
pub fn format_quantity(value: f64, unit: Option<&str>) -> String {
    let number = format_number(value);
    match unit {
        Some(unit) if value.abs() == 1.0 => format!("{} {}", number, unit),
        Some(unit) => format!("{} {}", number, pluralize(unit)),
        None => number,
    }
}

/// "a", "a and b", "a, b and c"
fn join_list(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// The final answer of a calculation, one total per group
pub fn compose_answer(totals: &[Total]) -> String {
    let parts: Vec<String> = totals
        .iter()
        .map(|total| format_quantity(total.value, total.unit.as_deref()))
        .collect();

    format!("The result is {}.", join_list(&parts))
}
