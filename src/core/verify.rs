//! Purpose: Schema-driven parameter validation run before any transport call.
//! Exports: `Schema`, `Rule`, `VerifyOptions`, `verify`.
//! Role: Keeps malformed calls local; a failed check never costs a round trip.
//! Invariants: Fields are checked in declaration order; the first violation
//! Invariants: aborts with exactly one coded, dotted-path error.
use crate::core::error::{Error, ErrorKind};
use regex::Regex;
use serde_json::Value;

/// Side-assertion hook for business rules the structural checks cannot
/// express. Receives the (already structurally valid) value and its dotted
/// path; runs after the built-in checks for its rule node.
pub type Assert = fn(&mut Value, &str) -> Result<(), Error>;

/// One declarative rule for a single field or array item.
pub struct Rule {
    required: bool,
    kind: RuleKind,
    assert: Option<Assert>,
}

enum RuleKind {
    Str {
        non_empty: bool,
        // Compiled when the rule is built; a bad pattern is kept as the
        // compile error and reported on first use.
        pattern: Option<Result<Regex, regex::Error>>,
        allowed: Option<Vec<String>>,
    },
    Num {
        integer: bool,
        min: Option<f64>,
        max: Option<f64>,
        allowed: Option<Vec<f64>>,
    },
    Bool,
    Obj {
        fields: Option<Schema>,
    },
    Arr {
        items: Option<Box<Rule>>,
    },
}

impl Rule {
    pub fn string() -> Self {
        Self::with_kind(RuleKind::Str {
            non_empty: false,
            pattern: None,
            allowed: None,
        })
    }

    pub fn number() -> Self {
        Self::with_kind(RuleKind::Num {
            integer: false,
            min: None,
            max: None,
            allowed: None,
        })
    }

    pub fn boolean() -> Self {
        Self::with_kind(RuleKind::Bool)
    }

    /// Object validated against a nested schema.
    pub fn object(fields: Schema) -> Self {
        Self::with_kind(RuleKind::Obj {
            fields: Some(fields),
        })
    }

    /// Object with no declared shape; only the type is checked.
    pub fn any_object() -> Self {
        Self::with_kind(RuleKind::Obj { fields: None })
    }

    /// Array whose every item must satisfy `items`.
    pub fn array(items: Rule) -> Self {
        Self::with_kind(RuleKind::Arr {
            items: Some(Box::new(items)),
        })
    }

    /// Array with no item rule; only the type is checked.
    pub fn any_array() -> Self {
        Self::with_kind(RuleKind::Arr { items: None })
    }

    fn with_kind(kind: RuleKind) -> Self {
        Self {
            required: false,
            kind,
            assert: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn assert(mut self, assert: Assert) -> Self {
        self.assert = Some(assert);
        self
    }

    /// String rule: reject empty or whitespace-only values.
    pub fn non_empty(mut self) -> Self {
        if let RuleKind::Str { non_empty, .. } = &mut self.kind {
            *non_empty = true;
        }
        self
    }

    /// String rule: value must match `pattern`. The regex is compiled once,
    /// here; verification only runs the match.
    pub fn pattern(mut self, value: &str) -> Self {
        if let RuleKind::Str { pattern, .. } = &mut self.kind {
            *pattern = Some(Regex::new(value));
        }
        self
    }

    pub fn one_of_strings<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let RuleKind::Str { allowed, .. } = &mut self.kind {
            *allowed = Some(values.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Number rule: reject fractional values.
    pub fn integer(mut self) -> Self {
        if let RuleKind::Num { integer, .. } = &mut self.kind {
            *integer = true;
        }
        self
    }

    pub fn min(mut self, value: f64) -> Self {
        if let RuleKind::Num { min, .. } = &mut self.kind {
            *min = Some(value);
        }
        self
    }

    pub fn max(mut self, value: f64) -> Self {
        if let RuleKind::Num { max, .. } = &mut self.kind {
            *max = Some(value);
        }
        self
    }

    pub fn one_of_numbers<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        if let RuleKind::Num { allowed, .. } = &mut self.kind {
            *allowed = Some(values.into_iter().collect());
        }
        self
    }
}

/// Ordered field-name-to-rule mapping. Declaration order is validation
/// order, which in turn fixes which violation a caller hears about first.
#[derive(Default)]
pub struct Schema {
    fields: Vec<(&'static str, Rule)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rule: Rule) -> Self {
        self.fields.push((name, rule));
        self
    }

    fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| *field == name)
    }
}

pub struct VerifyOptions<'a> {
    pub allow_unknown: bool,
    pub root_name: &'a str,
}

impl<'a> VerifyOptions<'a> {
    pub fn strict(root_name: &'a str) -> Self {
        Self {
            allow_unknown: false,
            root_name,
        }
    }

    pub fn lenient(root_name: &'a str) -> Self {
        Self {
            allow_unknown: true,
            root_name,
        }
    }
}

/// Walk `candidate` against `schema`.
///
/// Fields explicitly present as `null` and not required are removed from the
/// candidate so nulls never travel downstream. With `allow_unknown` false,
/// keys the schema does not declare produce one aggregate error naming all
/// of them.
pub fn verify(schema: &Schema, candidate: &mut Value, opts: &VerifyOptions) -> Result<(), Error> {
    let root = opts.root_name;
    let Some(map) = candidate.as_object_mut() else {
        return Err(invalid(root, format!("{root} must be an object")));
    };

    for (name, rule) in &schema.fields {
        let path = format!("{root}.{name}");
        let is_null = matches!(map.get(*name), Some(Value::Null));
        let present = map.contains_key(*name) && !is_null;

        if !present {
            if rule.required {
                return Err(invalid(&path, format!("{path} is required")));
            }
            if is_null {
                map.remove(*name);
            }
            continue;
        }

        let Some(value) = map.get_mut(*name) else {
            continue;
        };
        check_rule(rule, value, &path, opts.allow_unknown)?;
    }

    if !opts.allow_unknown {
        let unknown: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|key| !schema.declares(key))
            .collect();
        if !unknown.is_empty() {
            return Err(invalid(
                root,
                format!("{root} contains undeclared fields: {}", unknown.join(",")),
            ));
        }
    }

    Ok(())
}

fn check_rule(rule: &Rule, value: &mut Value, path: &str, allow_unknown: bool) -> Result<(), Error> {
    match &rule.kind {
        RuleKind::Str {
            non_empty,
            pattern,
            allowed,
        } => {
            let Some(text) = value.as_str() else {
                return Err(invalid(path, format!("{path} must be a string")));
            };
            if *non_empty && text.trim().is_empty() {
                return Err(invalid(path, format!("{path} cannot be an empty string")));
            }
            if let Some(pattern) = pattern {
                let re = match pattern {
                    Ok(re) => re,
                    Err(err) => {
                        return Err(Error::new(ErrorKind::Unclassified)
                            .with_message(format!("{path} has an invalid pattern rule"))
                            .with_path(path)
                            .with_source(err.clone()));
                    }
                };
                if !re.is_match(text) {
                    return Err(invalid(
                        path,
                        format!("{path} does not match the required format"),
                    ));
                }
            }
            if let Some(allowed) = allowed {
                if !allowed.iter().any(|candidate| candidate == text) {
                    return Err(invalid(
                        path,
                        format!("{path} must be one of: {}", allowed.join(",")),
                    ));
                }
            }
        }
        RuleKind::Num {
            integer,
            min,
            max,
            allowed,
        } => {
            let number = value.as_f64().filter(|n| n.is_finite());
            let Some(number) = number else {
                return Err(invalid(path, format!("{path} must be a valid number")));
            };
            if *integer && number.fract() != 0.0 {
                return Err(invalid(path, format!("{path} must be an integer")));
            }
            if let Some(min) = min {
                if number < *min {
                    return Err(invalid(path, format!("{path} must be >= {min}")));
                }
            }
            if let Some(max) = max {
                if number > *max {
                    return Err(invalid(path, format!("{path} must be <= {max}")));
                }
            }
            if let Some(allowed) = allowed {
                if !allowed.contains(&number) {
                    let listed: Vec<String> = allowed.iter().map(f64::to_string).collect();
                    return Err(invalid(
                        path,
                        format!("{path} must be one of: {}", listed.join(",")),
                    ));
                }
            }
        }
        RuleKind::Bool => {
            if !value.is_boolean() {
                return Err(invalid(path, format!("{path} must be a boolean")));
            }
        }
        RuleKind::Obj { fields } => {
            if !value.is_object() {
                return Err(invalid(path, format!("{path} must be an object")));
            }
            if let Some(fields) = fields {
                verify(
                    fields,
                    value,
                    &VerifyOptions {
                        allow_unknown,
                        root_name: path,
                    },
                )?;
            }
        }
        RuleKind::Arr { items } => {
            let Some(entries) = value.as_array_mut() else {
                return Err(invalid(path, format!("{path} must be an array")));
            };
            if let Some(item_rule) = items {
                for (idx, item) in entries.iter_mut().enumerate() {
                    let item_path = format!("{path}[{idx}]");
                    check_rule(item_rule, item, &item_path, allow_unknown)?;
                }
            }
        }
    }

    if let Some(assert) = rule.assert {
        assert(value, path)?;
    }
    Ok(())
}

fn invalid(path: &str, message: String) -> Error {
    Error::new(ErrorKind::InvalidParam)
        .with_message(message)
        .with_path(path)
}

#[cfg(test)]
mod tests {
    use super::{verify, Rule, Schema, VerifyOptions};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    fn two_required() -> Schema {
        Schema::new()
            .field("a", Rule::number().required())
            .field("b", Rule::number().required())
    }

    #[test]
    fn first_violation_wins_in_declaration_order() {
        let mut candidate = json!({});
        let err = verify(
            &two_required(),
            &mut candidate,
            &VerifyOptions::strict("op"),
        )
        .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidParam);
        assert_eq!(err.message(), Some("op.a is required"));
    }

    #[test]
    fn undeclared_fields_are_aggregated() {
        let schema = Schema::new().field("known", Rule::number().required());
        let mut candidate = json!({"known": 1, "extra": 2});
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert!(err.message().expect("msg").contains("undeclared fields"));
        assert!(err.message().expect("msg").contains("extra"));
    }

    #[test]
    fn unknown_fields_pass_when_lenient() {
        let schema = Schema::new().field("known", Rule::number().required());
        let mut candidate = json!({"known": 1, "extra": 2});
        verify(&schema, &mut candidate, &VerifyOptions::lenient("op")).expect("ok");
    }

    #[test]
    fn null_optional_field_is_removed() {
        let schema = Schema::new().field("maybe", Rule::string());
        let mut candidate = json!({"maybe": null});
        verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect("ok");
        assert!(candidate.as_object().expect("obj").get("maybe").is_none());
    }

    #[test]
    fn null_required_field_is_reported_missing() {
        let schema = Schema::new().field("must", Rule::string().required());
        let mut candidate = json!({"must": null});
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(err.message(), Some("op.must is required"));
    }

    #[test]
    fn nested_failure_carries_dotted_path() {
        let schema = Schema::new().field(
            "outer",
            Rule::object(Schema::new().field("inner", Rule::number().required())).required(),
        );
        let mut candidate = json!({"outer": {"inner": "nope"}});
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(err.message(), Some("op.outer.inner must be a valid number"));
    }

    #[test]
    fn array_items_are_checked_with_indexed_paths() {
        let schema = Schema::new().field(
            "nums",
            Rule::array(Rule::number().integer().min(0.0)).required(),
        );
        let mut candidate = json!({"nums": [1, 2, -3]});
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(err.message(), Some("op.nums[2] must be >= 0"));
    }

    #[test]
    fn integer_flag_rejects_fractions() {
        let schema = Schema::new().field("page", Rule::number().required().integer());
        let mut candidate = json!({"page": 1.5});
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(err.message(), Some("op.page must be an integer"));
    }

    #[test]
    fn string_constraints_apply_in_order() {
        let schema = Schema::new().field(
            "path",
            Rule::string().required().non_empty().pattern(r"\.png$"),
        );

        let mut empty = json!({"path": "   "});
        let err = verify(&schema, &mut empty, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(err.message(), Some("op.path cannot be an empty string"));

        let mut wrong = json!({"path": "thumb.jpg"});
        let err = verify(&schema, &mut wrong, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(
            err.message(),
            Some("op.path does not match the required format")
        );

        let mut ok = json!({"path": "thumb.png"});
        verify(&schema, &mut ok, &VerifyOptions::strict("op")).expect("ok");
    }

    #[test]
    fn broken_pattern_rule_is_unclassified_not_a_param_error() {
        let schema = Schema::new().field("path", Rule::string().required().pattern("[unclosed"));
        let mut candidate = json!({"path": "thumb.png"});
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Unclassified);
        assert!(err.message().expect("msg").contains("invalid pattern rule"));
    }

    #[test]
    fn enumerated_numbers_are_enforced() {
        let schema = Schema::new().field("italic", Rule::number().integer().one_of_numbers([0.0, 1.0]));
        let mut candidate = json!({"italic": 2});
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert!(err.message().expect("msg").contains("must be one of"));
    }

    #[test]
    fn non_object_candidate_is_rejected() {
        let schema = Schema::new();
        let mut candidate = json!(42);
        let err = verify(&schema, &mut candidate, &VerifyOptions::strict("op")).expect_err("err");
        assert_eq!(err.message(), Some("op must be an object"));
    }
}
