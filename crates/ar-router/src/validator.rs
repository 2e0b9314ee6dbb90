//! Schema validation of candidate calls.
//!
//! Checks run in a fixed order: presence, then type, then constraints.
//! The first failing stage is reported with exactly the offending names.

use ar_protocol::{ArgMap, ToolSpec};

use crate::cascade::CandidateCall;
use crate::coerce::{coerce, is_missing};
use crate::error::{RouteError, RouteResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct Validator;

impl Validator {
    pub fn validate(&self, candidate: &CandidateCall) -> RouteResult<()> {
        self.check(&candidate.tool, &candidate.args)
    }

    pub fn check(&self, spec: &ToolSpec, args: &ArgMap) -> RouteResult<()> {
        let mut missing: Vec<String> = spec
            .required_args()
            .filter(|a| is_missing(args.get(&a.name)))
            .map(|a| a.name.clone())
            .collect();
        if !spec.require_any.is_empty() && spec.require_any.iter().all(|n| is_missing(args.get(n))) {
            missing.extend(spec.require_any.iter().cloned());
        }
        if !missing.is_empty() {
            return Err(RouteError::ExtractionMissingArg {
                tool: spec.name.clone(),
                args: missing,
            });
        }

        let mut invalid = Vec::new();
        let mut violating = Vec::new();
        for arg in &spec.args {
            let Some(raw) = args.get(&arg.name) else {
                continue;
            };
            if is_missing(Some(raw)) {
                continue;
            }
            match coerce(arg, raw) {
                None => invalid.push(arg.name.clone()),
                Some(value) => {
                    if arg.constraint.as_ref().is_some_and(|c| !c.allows(&value)) {
                        violating.push(arg.name.clone());
                    }
                }
            }
        }

        if !invalid.is_empty() {
            return Err(RouteError::ExtractionInvalidType {
                tool: spec.name.clone(),
                args: invalid,
            });
        }
        if !violating.is_empty() {
            return Err(RouteError::ExtractionConstraintViolation {
                tool: spec.name.clone(),
                args: violating,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;
    use serde_json::json;

    fn check(tool: &str, args: serde_json::Value) -> RouteResult<()> {
        let registry = ToolRegistry::with_defaults();
        let spec = registry.spec(registry.lookup(tool).unwrap()).clone();
        Validator.check(&spec, args.as_object().unwrap())
    }

    #[test]
    fn accepts_complete_call() {
        assert!(check("set_alarm", json!({"hour": 7, "minute": 30})).is_ok());
        assert!(check("set_alarm", json!({"hour": "7"})).is_ok());
    }

    #[test]
    fn reports_all_missing_required() {
        let err = check("send_message", json!({})).unwrap_err();
        assert_eq!(
            err.failing_args().unwrap(),
            &["recipient".to_string(), "message".to_string()]
        );
        assert!(matches!(err, RouteError::ExtractionMissingArg { .. }));
    }

    #[test]
    fn blank_string_is_missing() {
        let err = check("get_weather", json!({"location": "  "})).unwrap_err();
        assert!(matches!(err, RouteError::ExtractionMissingArg { .. }));
    }

    #[test]
    fn one_of_group_missing() {
        let err = check("play_music", json!({})).unwrap_err();
        assert_eq!(err.failing_args().unwrap(), &["song".to_string(), "genre".to_string()]);
        assert!(check("play_music", json!({"genre": "jazz"})).is_ok());
    }

    #[test]
    fn invalid_type_names_the_arg() {
        let err = check("set_alarm", json!({"hour": "soonish"})).unwrap_err();
        assert!(matches!(err, RouteError::ExtractionInvalidType { .. }));
        assert_eq!(err.failing_args().unwrap(), &["hour".to_string()]);
    }

    #[test]
    fn range_violation() {
        let err = check("set_alarm", json!({"hour": 25, "minute": 0})).unwrap_err();
        assert!(matches!(err, RouteError::ExtractionConstraintViolation { .. }));
        assert_eq!(err.failing_args().unwrap(), &["hour".to_string()]);
    }

    #[test]
    fn enum_violation() {
        let err = check("get_weather", json!({"location": "Oslo", "units": "kelvin"})).unwrap_err();
        assert_eq!(err.failing_args().unwrap(), &["units".to_string()]);
        assert!(check("get_weather", json!({"location": "Oslo", "units": "Celsius"})).is_ok());
    }

    #[test]
    fn presence_reported_before_type() {
        let err = check("create_reminder", json!({"hour": "later"})).unwrap_err();
        assert!(matches!(err, RouteError::ExtractionMissingArg { .. }));
        assert_eq!(err.failing_args().unwrap(), &["text".to_string()]);
    }

    #[test]
    fn undeclared_args_are_ignored() {
        assert!(check("set_timer", json!({"minutes": 5, "label": "tea"})).is_ok());
    }
}
