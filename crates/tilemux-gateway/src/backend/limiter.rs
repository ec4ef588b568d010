//! Schema-driven [`OptionLimiter`].
//!
//! Caller limits carry an `options` section keyed by option name:
//!
//! ```json
//! { "maxImages": 500,
//!   "options": {
//!     "min-num-features": { "min": 1000, "max": 8000 },
//!     "feature-quality":  { "choices": ["low", "medium"] },
//!     "dsm":              { "value": false } } }
//! ```
//!
//! `min`/`max` narrow a numeric range, `choices` narrows an enumeration,
//! and `value` pins the option to a single value.

use serde_json::{Value, json};
use tilemux_kernel::{Limits, NodeOption, OptionError, OptionLimiter, SubmittedOption};

/// [`OptionLimiter`] for limits in the shape shown in the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaOptionLimiter;

impl SchemaOptionLimiter {
    pub fn new() -> Self {
        Self
    }
}

impl OptionLimiter for SchemaOptionLimiter {
    fn options_with_limits(
        &self,
        options: &[NodeOption],
        limits: Option<&Limits>,
    ) -> Vec<NodeOption> {
        let Some(limits) = limits else {
            return options.to_vec();
        };
        options
            .iter()
            .map(|option| match limits.option_limit(&option.name) {
                Some(limit) => narrow(option.clone(), limit),
                None => option.clone(),
            })
            .collect()
    }

    fn filter_options(
        &self,
        submitted: &str,
        allowed: &[NodeOption],
    ) -> Result<Vec<SubmittedOption>, OptionError> {
        if submitted.trim().is_empty() {
            return Ok(Vec::new());
        }
        let submitted: Vec<SubmittedOption> = serde_json::from_str(submitted)
            .map_err(|e| OptionError::new(format!("Invalid options: {e}")))?;

        submitted
            .into_iter()
            .map(|option| {
                let declared = allowed
                    .iter()
                    .find(|a| a.name == option.name)
                    .ok_or_else(|| OptionError::new(format!("Option {} is not allowed", option.name)))?;
                check_value(declared, &option.value)?;
                Ok(option)
            })
            .collect()
    }
}

fn narrow(mut option: NodeOption, limit: &Value) -> NodeOption {
    if let Some(pinned) = limit.get("value") {
        option.value = pinned.clone();
        option.domain = json!([pinned]);
        if option.is_numeric() {
            option.min = pinned.as_f64();
            option.max = pinned.as_f64();
        }
        return option;
    }

    if option.is_numeric() {
        if let Some(min) = limit.get("min").and_then(Value::as_f64) {
            option.min = Some(option.min.map_or(min, |m| m.max(min)));
        }
        if let Some(max) = limit.get("max").and_then(Value::as_f64) {
            option.max = Some(option.max.map_or(max, |m| m.min(max)));
        }
        if let Some(current) = as_number(&option.value) {
            let clamped = clamp(current, option.min, option.max);
            if clamped != current {
                option.value = number_value(clamped, option.is_integer());
            }
        }
    }

    if let Some(choices) = limit.get("choices").and_then(Value::as_array) {
        let wanted: Vec<String> = choices.iter().map(display).collect();
        let narrowed: Vec<String> = match option.choices() {
            Some(existing) => existing.into_iter().filter(|c| wanted.contains(c)).collect(),
            None => wanted,
        };
        if !narrowed.contains(&display(&option.value)) {
            if let Some(first) = narrowed.first() {
                option.value = Value::String(first.clone());
            }
        }
        option.domain = json!(narrowed);
    }
    option
}

fn check_value(declared: &NodeOption, value: &Value) -> Result<(), OptionError> {
    let name = &declared.name;

    if let Some(choices) = declared.choices() {
        let given = display(value);
        if !choices.contains(&given) {
            return Err(OptionError::new(format!(
                "Invalid value for option {name}: {given} (allowed: {})",
                choices.join(", ")
            )));
        }
        return Ok(());
    }

    if declared.is_numeric() {
        let number = as_number(value)
            .ok_or_else(|| OptionError::new(format!("Option {name} must be a number")))?;
        if declared.is_integer() && number.fract() != 0.0 {
            return Err(OptionError::new(format!("Option {name} must be an integer")));
        }
        if declared.min.is_some_and(|min| number < min) || declared.max.is_some_and(|max| number > max) {
            return Err(OptionError::new(out_of_range(name, declared.min, declared.max)));
        }
        return Ok(());
    }

    if matches!(declared.kind.as_str(), "bool" | "boolean") && as_bool(value).is_none() {
        return Err(OptionError::new(format!("Option {name} must be true or false")));
    }
    Ok(())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn clamp(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let value = min.map_or(value, |m| value.max(m));
    max.map_or(value, |m| value.min(m))
}

fn number_value(value: f64, integer: bool) -> Value {
    if integer {
        json!(value.round() as i64)
    } else {
        json!(value)
    }
}

fn out_of_range(name: &str, min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("Option {name} must be between {min} and {max}"),
        (Some(min), None) => format!("Option {name} must be at least {min}"),
        (None, Some(max)) => format!("Option {name} must be at most {max}"),
        (None, None) => format!("Option {name} is out of range"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_options() -> Vec<NodeOption> {
        vec![
            NodeOption::new("min-num-features", "int", json!(10000)),
            NodeOption::new("feature-quality", "string", json!("high"))
                .with_domain(json!(["ultra", "high", "medium", "low"])),
            NodeOption::new("dsm", "bool", json!(false)),
            NodeOption::new("name", "string", json!("")),
        ]
    }

    fn limits() -> Limits {
        Limits::new(json!({
            "maxImages": 100,
            "options": {
                "min-num-features": { "min": 1000, "max": 8000 },
                "feature-quality": { "choices": ["medium", "low"] },
                "dsm": { "value": false }
            }
        }))
    }

    fn limited() -> Vec<NodeOption> {
        SchemaOptionLimiter.options_with_limits(&node_options(), Some(&limits()))
    }

    #[test]
    fn no_limits_returns_options_unchanged() {
        assert_eq!(SchemaOptionLimiter.options_with_limits(&node_options(), None), node_options());
    }

    #[test]
    fn numeric_range_is_narrowed_and_default_clamped() {
        let features = &limited()[0];
        assert_eq!(features.min, Some(1000.0));
        assert_eq!(features.max, Some(8000.0));
        assert_eq!(features.value, json!(8000));
    }

    #[test]
    fn enumeration_is_intersected() {
        let quality = &limited()[1];
        assert_eq!(quality.domain, json!(["medium", "low"]));
        assert_eq!(quality.value, json!("medium"));
    }

    #[test]
    fn pinned_value_fixes_domain() {
        let dsm = &limited()[2];
        assert_eq!(dsm.value, json!(false));
        assert_eq!(dsm.domain, json!([false]));
    }

    #[test]
    fn limiting_is_deterministic() {
        assert_eq!(limited(), limited());
    }

    #[test]
    fn empty_submission_is_accepted() {
        assert!(SchemaOptionLimiter.filter_options("", &limited()).unwrap().is_empty());
        assert!(SchemaOptionLimiter.filter_options("  ", &limited()).unwrap().is_empty());
    }

    #[test]
    fn permitted_options_pass() {
        let submitted = r#"[{"name":"min-num-features","value":"4000"},
                            {"name":"feature-quality","value":"low"},
                            {"name":"dsm","value":false},
                            {"name":"name","value":"survey"}]"#;
        let accepted = SchemaOptionLimiter.filter_options(submitted, &limited()).unwrap();
        assert_eq!(accepted.len(), 4);
        assert_eq!(accepted[0].value, json!("4000"));
    }

    #[test]
    fn out_of_range_number_fails_with_option_name() {
        let err = SchemaOptionLimiter
            .filter_options(r#"[{"name":"min-num-features","value":9000}]"#, &limited())
            .unwrap_err();
        assert_eq!(err.to_string(), "Option min-num-features must be between 1000 and 8000");
    }

    #[test]
    fn disallowed_choice_and_pinned_value_fail() {
        let err = SchemaOptionLimiter
            .filter_options(r#"[{"name":"feature-quality","value":"ultra"}]"#, &limited())
            .unwrap_err();
        assert!(err.to_string().contains("feature-quality"));

        assert!(SchemaOptionLimiter
            .filter_options(r#"[{"name":"dsm","value":true}]"#, &limited())
            .is_err());
    }

    #[test]
    fn unknown_option_and_bad_json_fail() {
        let err = SchemaOptionLimiter
            .filter_options(r#"[{"name":"rm-rf","value":1}]"#, &limited())
            .unwrap_err();
        assert_eq!(err.to_string(), "Option rm-rf is not allowed");

        let err = SchemaOptionLimiter.filter_options("{not json", &limited()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid options:"));
    }

    #[test]
    fn type_mismatches_fail() {
        assert!(SchemaOptionLimiter
            .filter_options(r#"[{"name":"min-num-features","value":"many"}]"#, &limited())
            .is_err());
        assert!(SchemaOptionLimiter
            .filter_options(r#"[{"name":"min-num-features","value":2000.5}]"#, &limited())
            .is_err());
    }
}
