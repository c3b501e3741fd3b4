use crate::error::CompileError;
use indexmap::IndexMap;
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A Scratch value: every variable, list item and literal input is one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Scalar::from_json(&value).ok_or_else(|| {
            D::Error::custom(format!(
                "expected a number or a string, found {}",
                json_kind(&value)
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Scalar,
    pub is_cloud: bool,
}

// ["name", value] or ["name", value, true] for cloud variables.
impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let arr = Vec::<Value>::deserialize(deserializer)?;
        if !(2..=3).contains(&arr.len()) {
            return Err(D::Error::custom(
                "Invalid variable: variables must have 2 or 3 elements.",
            ));
        }
        let name = arr[0]
            .as_str()
            .ok_or_else(|| {
                D::Error::custom("Invalid variable: the first element must be a string.")
            })?
            .to_string();
        let value = Scalar::from_json(&arr[1]).ok_or_else(|| {
            D::Error::custom("Invalid variable: the second element must be a number or a string.")
        })?;
        let is_cloud = match arr.get(2) {
            None => false,
            Some(Value::Bool(true)) => true,
            Some(_) => {
                return Err(D::Error::custom(
                    "Invalid variable: a third element, if present, must be true.",
                ))
            }
        };
        Ok(Variable {
            name,
            value,
            is_cloud,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl<'de> Deserialize<'de> for List {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let arr = Vec::<Value>::deserialize(deserializer)?;
        if arr.len() != 2 {
            return Err(D::Error::custom("Invalid list: lists must have 2 elements."));
        }
        let name = arr[0]
            .as_str()
            .ok_or_else(|| D::Error::custom("Invalid list: the first element must be a string."))?
            .to_string();
        let items = arr[1]
            .as_array()
            .ok_or_else(|| D::Error::custom("Invalid list: the second element must be an array."))?;
        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let value = Scalar::from_json(item).ok_or_else(|| {
                D::Error::custom(format!(
                    "Invalid list '{}': item {} is a {}, expected a number or a string.",
                    name,
                    index + 1,
                    json_kind(item)
                ))
            })?;
            values.push(value);
        }
        Ok(List { name, values })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowStatus {
    Shadow,
    NoShadow,
    ObscuredShadow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Primitive types 4 through 10: numbers, angles, colors and text.
    Literal { kind: u8, value: Scalar },
    Broadcast { name: String, id: String },
    Variable { name: String, id: String },
    List { name: String, id: String },
    /// A nested reporter, referenced by block id.
    Block(String),
    Empty,
}

impl InputValue {
    fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(InputValue::Empty),
            Value::String(id) => Ok(InputValue::Block(id.clone())),
            Value::Array(arr) => {
                let kind = arr
                    .first()
                    .and_then(Value::as_u64)
                    .ok_or_else(|| "primitive is missing its type code".to_string())?;
                match kind {
                    4..=10 => {
                        let value = arr
                            .get(1)
                            .and_then(Scalar::from_json)
                            .ok_or_else(|| format!("primitive type {} has no value", kind))?;
                        Ok(InputValue::Literal {
                            kind: kind as u8,
                            value,
                        })
                    }
                    11..=13 => {
                        let name = primitive_str(arr, 1, kind)?;
                        let id = primitive_str(arr, 2, kind)?;
                        Ok(match kind {
                            11 => InputValue::Broadcast { name, id },
                            12 => InputValue::Variable { name, id },
                            _ => InputValue::List { name, id },
                        })
                    }
                    other => Err(format!("unknown primitive type {}", other)),
                }
            }
            other => Err(format!("unexpected {} in input", json_kind(other))),
        }
    }
}

fn primitive_str(arr: &[Value], index: usize, kind: u64) -> Result<String, String> {
    arr.get(index)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| format!("primitive type {} needs a string at position {}", kind, index))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub shadow: ShadowStatus,
    pub value: InputValue,
    pub obscured: Option<InputValue>,
}

impl Input {
    /// The block id of a nested reporter. Reporter compilation hooks in here.
    pub fn reporter_id(&self) -> Option<&str> {
        match &self.value {
            InputValue::Block(id) => Some(id),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Input {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let arr = Vec::<Value>::deserialize(deserializer)?;
        if !(2..=3).contains(&arr.len()) {
            return Err(D::Error::custom("Invalid input: inputs must have 2 or 3 elements."));
        }
        let shadow = match arr[0].as_u64() {
            Some(1) => ShadowStatus::Shadow,
            Some(2) => ShadowStatus::NoShadow,
            Some(3) => ShadowStatus::ObscuredShadow,
            _ => {
                return Err(D::Error::custom(format!(
                    "Invalid input: unknown shadow status {}.",
                    arr[0]
                )))
            }
        };
        let value = InputValue::from_json(&arr[1])
            .map_err(|e| D::Error::custom(format!("Invalid input: {}.", e)))?;
        let obscured = match arr.get(2) {
            Some(raw) => Some(
                InputValue::from_json(raw)
                    .map_err(|e| D::Error::custom(format!("Invalid obscured shadow: {}.", e)))?,
            ),
            None => None,
        };
        Ok(Input {
            shadow,
            value,
            obscured,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub value: String,
    pub id: Option<String>,
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let arr = Vec::<Value>::deserialize(deserializer)?;
        let value = match arr.first() {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(D::Error::custom(
                    "Invalid field: the first element must be a string.",
                ))
            }
        };
        let id = arr.get(1).and_then(Value::as_str).map(ToString::to_string);
        Ok(Field { value, id })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub opcode: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub inputs: IndexMap<String, Input>,
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default)]
    pub top_level: bool,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub mutation: Option<Value>,
}

impl Block {
    pub fn new(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            next: None,
            parent: None,
            inputs: IndexMap::new(),
            fields: IndexMap::new(),
            shadow: false,
            top_level: false,
            x: None,
            y: None,
            mutation: None,
        }
    }

    /// Opcode prefix before the first `_`, e.g. `motion` for `motion_movesteps`.
    pub fn namespace(&self) -> &str {
        self.opcode.split('_').next().unwrap_or_default()
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }
}

#[derive(Debug, Clone)]
pub enum BlockEntry {
    Block(Block),
    /// A variable or list reporter lying loose on the workspace.
    Primitive(Vec<Value>),
}

/// Blocks of one target keyed by id, in document order.
#[derive(Debug, Clone, Default)]
pub struct BlockArena {
    entries: IndexMap<String, BlockEntry>,
}

impl BlockArena {
    pub fn get(&self, id: &str) -> Option<&Block> {
        match self.entries.get(id) {
            Some(BlockEntry::Block(block)) => Some(block),
            _ => None,
        }
    }

    pub fn entry(&self, id: &str) -> Option<&BlockEntry> {
        self.entries.get(id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (&str, &Block)> {
        self.entries.iter().filter_map(|(id, entry)| match entry {
            BlockEntry::Block(block) => Some((id.as_str(), block)),
            BlockEntry::Primitive(_) => None,
        })
    }

    pub fn insert(&mut self, id: impl Into<String>, block: Block) {
        self.entries.insert(id.into(), BlockEntry::Block(block));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for BlockArena {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut entries = IndexMap::with_capacity(raw.len());
        for (id, value) in raw {
            let entry = match value {
                Value::Array(arr) => BlockEntry::Primitive(arr),
                other => BlockEntry::Block(
                    serde_json::from_value::<Block>(other)
                        .map_err(|e| D::Error::custom(format!("Invalid block '{}': {}", id, e)))?,
                ),
            };
            entries.insert(id, entry);
        }
        Ok(BlockArena { entries })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub block_id: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: f64,
    pub height: f64,
    pub minimized: bool,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    pub asset_id: String,
    pub name: String,
    pub md5ext: Option<String>,
    pub data_format: String,
    // costumes only
    pub bitmap_resolution: Option<f64>,
    pub rotation_center_x: Option<f64>,
    pub rotation_center_y: Option<f64>,
    // sounds only
    pub rate: Option<f64>,
    pub sample_count: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub is_stage: bool,
    pub name: String,
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
    #[serde(default)]
    pub lists: IndexMap<String, List>,
    #[serde(default)]
    pub broadcasts: IndexMap<String, String>,
    #[serde(default)]
    pub blocks: BlockArena,
    #[serde(default)]
    pub comments: IndexMap<String, Comment>,
    #[serde(default)]
    pub current_costume: f64,
    #[serde(default)]
    pub costumes: Vec<Asset>,
    #[serde(default)]
    pub sounds: Vec<Asset>,
    #[serde(default)]
    pub layer_order: f64,
    #[serde(default = "default_volume")]
    pub volume: f64,
    // stage only
    #[serde(default)]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub video_state: Option<String>,
    #[serde(default)]
    pub video_transparency: Option<f64>,
    #[serde(default)]
    pub text_to_speech_language: Option<String>,
    // sprites only
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default = "default_direction")]
    pub direction: f64,
    #[serde(default)]
    pub draggable: bool,
    #[serde(default = "default_rotation_style")]
    pub rotation_style: String,
}

fn default_volume() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

fn default_size() -> f64 {
    100.0
}

fn default_direction() -> f64 {
    90.0
}

fn default_rotation_style() -> String {
    "all around".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub semver: String,
    pub vm: String,
    pub agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub targets: Vec<Target>,
    #[serde(default)]
    pub monitors: Vec<Value>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub meta: Meta,
}

pub fn parse_project_file(path: &Path) -> Result<Project, CompileError> {
    let source = fs::read_to_string(path).map_err(|e| {
        CompileError::parse(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    parse_project_str(&source)
}

pub fn parse_project_str(source: &str) -> Result<Project, CompileError> {
    serde_json::from_str(source).map_err(|e| CompileError::parse(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(json: &str) -> Result<Variable, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn variable_without_cloud_marker() {
        let v = variable(r#"["score", 5]"#).unwrap();
        assert_eq!(v.name, "score");
        assert_eq!(v.value, Scalar::Number(5.0));
        assert!(!v.is_cloud);
    }

    #[test]
    fn variable_with_cloud_marker() {
        let v = variable(r#"["score", 5, true]"#).unwrap();
        assert!(v.is_cloud);
    }

    #[test]
    fn variable_rejects_false_cloud_marker() {
        let err = variable(r#"["score", 5, false]"#).unwrap_err();
        assert!(err.to_string().contains("must be true"));
    }

    #[test]
    fn variable_rejects_bad_shapes() {
        assert!(variable(r#"["score"]"#).is_err());
        assert!(variable(r#"[1, 5]"#).is_err());
        assert!(variable(r#"["score", null]"#).is_err());
        assert!(variable(r#"["score", 1, true, 4]"#).is_err());
    }

    #[test]
    fn list_decodes_mixed_values() {
        let list: List = serde_json::from_str(r#"["mylist", [1, 2, "a"]]"#).unwrap();
        assert_eq!(list.name, "mylist");
        assert_eq!(
            list.values,
            vec![
                Scalar::Number(1.0),
                Scalar::Number(2.0),
                Scalar::Text("a".to_string())
            ]
        );
    }

    #[test]
    fn list_rejects_bad_shapes() {
        assert!(serde_json::from_str::<List>(r#"["mylist"]"#).is_err());
        assert!(serde_json::from_str::<List>(r#"["mylist", "abc"]"#).is_err());
        assert!(serde_json::from_str::<List>(r#"["mylist", [[1]]]"#).is_err());
    }

    #[test]
    fn input_encodings() {
        let literal: Input = serde_json::from_str(r#"[1, [4, "10"]]"#).unwrap();
        assert_eq!(literal.shadow, ShadowStatus::Shadow);
        assert_eq!(
            literal.value,
            InputValue::Literal {
                kind: 4,
                value: Scalar::Text("10".to_string())
            }
        );

        let reporter: Input = serde_json::from_str(r#"[3, "abc", [4, "10"]]"#).unwrap();
        assert_eq!(reporter.shadow, ShadowStatus::ObscuredShadow);
        assert_eq!(reporter.reporter_id(), Some("abc"));
        assert!(matches!(
            reporter.obscured,
            Some(InputValue::Literal { kind: 4, .. })
        ));

        let broadcast: Input =
            serde_json::from_str(r#"[1, [11, "message1", "bcast-id"]]"#).unwrap();
        assert_eq!(
            broadcast.value,
            InputValue::Broadcast {
                name: "message1".to_string(),
                id: "bcast-id".to_string()
            }
        );

        let substack: Input = serde_json::from_str(r#"[2, null]"#).unwrap();
        assert_eq!(substack.value, InputValue::Empty);

        assert!(serde_json::from_str::<Input>(r#"[7, [4, "1"]]"#).is_err());
        assert!(serde_json::from_str::<Input>(r#"[1, [99, "1"]]"#).is_err());
    }

    #[test]
    fn block_map_keeps_order_and_loose_primitives() {
        let arena: BlockArena = serde_json::from_str(
            r#"{
                "z": {"opcode": "event_whenflagclicked", "next": "a", "topLevel": true},
                "a": {"opcode": "motion_movesteps", "parent": "z", "next": null,
                      "inputs": {"STEPS": [1, [4, "10"]]}, "fields": {}},
                "loose": [12, "my variable", "var-id", 10, 20]
            }"#,
        )
        .unwrap();
        assert_eq!(arena.len(), 3);
        let ids: Vec<_> = arena.blocks().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert!(arena.get("loose").is_none());
        assert!(matches!(arena.entry("loose"), Some(BlockEntry::Primitive(_))));
        assert_eq!(arena.get("a").unwrap().namespace(), "motion");
    }

    #[test]
    fn bad_block_error_names_the_block() {
        let err = serde_json::from_str::<BlockArena>(r#"{"b1": {"next": null}}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid block 'b1'"));
    }

    #[test]
    fn stage_defaults_for_sprite_only_fields() {
        let project = parse_project_str(
            r#"{"targets": [{"isStage": true, "name": "Stage", "blocks": {},
                 "broadcasts": {"b": "message1"}}],
                "meta": {"semver": "3.0.0"}}"#,
        )
        .unwrap();
        let stage = &project.targets[0];
        assert!(stage.is_stage);
        assert_eq!(stage.direction, 90.0);
        assert_eq!(stage.size, 100.0);
        assert_eq!(stage.rotation_style, "all around");
        assert!(stage.visible);
        assert_eq!(stage.broadcasts.get("b").map(String::as_str), Some("message1"));
        assert_eq!(project.meta.semver, "3.0.0");
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        assert!(matches!(
            parse_project_str("{"),
            Err(CompileError::Parse { .. })
        ));
        assert!(matches!(
            parse_project_str(
                r#"{"targets": [{"isStage": true, "name": "Stage",
                     "variables": {"v": ["score", 5, false]}}]}"#
            ),
            Err(CompileError::Parse { .. })
        ));
        assert!(matches!(
            parse_project_file(Path::new("/definitely/not/here/project.json")),
            Err(CompileError::Parse { .. })
        ));
    }
}
