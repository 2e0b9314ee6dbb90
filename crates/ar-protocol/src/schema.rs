use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Argument mapping of a tool call: argument name → JSON value.
///
/// Equality is key-for-key and ignores insertion order.
pub type ArgMap = serde_json::Map<String, Value>;

/// Declared type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    String,
    Integer,
    Enum,
}

impl ArgKind {
    /// JSON-schema type name used in model prompts.
    pub fn json_type(self) -> &'static str {
        match self {
            Self::String | Self::Enum => "string",
            Self::Integer => "integer",
        }
    }
}

/// Value constraint checked after type coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric range.
    Range { min: i64, max: i64 },
    /// Allowed enum values (compared case-insensitively).
    OneOf { values: Vec<String> },
}

impl Constraint {
    /// Whether an already-coerced value satisfies the constraint.
    pub fn allows(&self, value: &Value) -> bool {
        match self {
            Self::Range { min, max } => value.as_i64().is_some_and(|n| n >= *min && n <= *max),
            Self::OneOf { values } => value
                .as_str()
                .is_some_and(|s| values.iter().any(|v| v.eq_ignore_ascii_case(s))),
        }
    }
}

/// How the normalizer should canonicalize an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueHint {
    #[default]
    Plain,
    /// Hour of day in 24h form, read from clock expressions ("3pm", "noon").
    ClockHour,
    /// Minute of the hour; defaults to 0 when the text names no minute.
    ClockMinute,
    /// Length of time in whole minutes ("half an hour", "1 hour 30 minutes").
    DurationMinutes,
    /// A person's name; pronouns are resolved against the request.
    Contact,
    /// Song or artist title.
    MediaTitle,
}

impl ValueHint {
    pub fn is_clock(self) -> bool {
        matches!(self, Self::ClockHour | Self::ClockMinute)
    }
}

/// One argument of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub description: String,
    pub kind: ArgKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default)]
    pub hint: ValueHint,
}

impl ArgSpec {
    fn new(name: &str, description: &str, kind: ArgKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required: false,
            constraint: None,
            hint: ValueHint::Plain,
        }
    }

    pub fn string(name: &str, description: &str) -> Self {
        Self::new(name, description, ArgKind::String)
    }

    pub fn integer(name: &str, description: &str) -> Self {
        Self::new(name, description, ArgKind::Integer)
    }

    pub fn enumeration(name: &str, description: &str, values: &[&str]) -> Self {
        let mut spec = Self::new(name, description, ArgKind::Enum);
        spec.constraint = Some(Constraint::OneOf {
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.constraint = Some(Constraint::Range { min, max });
        self
    }

    pub fn hint(mut self, hint: ValueHint) -> Self {
        self.hint = hint;
        self
    }

    fn json_schema(&self) -> Value {
        let mut prop = json!({
            "type": self.kind.json_type(),
            "description": self.description,
        });
        match &self.constraint {
            Some(Constraint::Range { min, max }) => {
                prop["minimum"] = json!(min);
                prop["maximum"] = json!(max);
            }
            Some(Constraint::OneOf { values }) => {
                prop["enum"] = json!(values);
            }
            None => {}
        }
        prop
    }
}

/// Static description of a tool: its name and ordered argument contract.
///
/// Loaded once at startup and shared read-only by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub args: Vec<ArgSpec>,
    /// At least one of these (otherwise optional) arguments must be present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require_any: Vec<String>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            args: Vec::new(),
            require_any: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn require_one_of(mut self, names: &[&str]) -> Self {
        self.require_any = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Look up an argument by name.
    pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn required_args(&self) -> impl Iterator<Item = &ArgSpec> {
        self.args.iter().filter(|a| a.required)
    }

    /// JSON-schema object describing the arguments, as shown to models.
    pub fn to_json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .args
            .iter()
            .map(|a| (a.name.clone(), a.json_schema()))
            .collect();
        let required: Vec<&str> = self.required_args().map(|a| a.name.as_str()).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
