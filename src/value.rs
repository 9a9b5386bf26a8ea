//! Lowering of format specific trees into the generic `serde_json::Value`.

use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::error::Error;

/// A YAML document as the parser reports it, before any key coercion.
///
/// Mapping entries stay a list so that repeated keys reach the lowering step,
/// and integers wider than 64 bits are kept as their decimal digits.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlNode {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    BigInt(String),
    Float(f64),
    String(String),
    Seq(Vec<YamlNode>),
    Map(Vec<(YamlNode, YamlNode)>),
}

impl<'de> Deserialize<'de> for YamlNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> de::Visitor<'de> for NodeVisitor {
    type Value = YamlNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_unit<E>(self) -> Result<YamlNode, E> {
        Ok(YamlNode::Null)
    }

    fn visit_none<E>(self) -> Result<YamlNode, E> {
        Ok(YamlNode::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<YamlNode, D::Error>
    where
        D: Deserializer<'de>,
    {
        YamlNode::deserialize(deserializer)
    }

    fn visit_bool<E>(self, b: bool) -> Result<YamlNode, E> {
        Ok(YamlNode::Bool(b))
    }

    fn visit_i64<E>(self, i: i64) -> Result<YamlNode, E> {
        Ok(YamlNode::Int(i))
    }

    fn visit_u64<E>(self, u: u64) -> Result<YamlNode, E> {
        Ok(YamlNode::UInt(u))
    }

    fn visit_i128<E>(self, i: i128) -> Result<YamlNode, E> {
        Ok(match i64::try_from(i) {
            Ok(i) => YamlNode::Int(i),
            Err(_) => YamlNode::BigInt(i.to_string()),
        })
    }

    fn visit_u128<E>(self, u: u128) -> Result<YamlNode, E> {
        Ok(match u64::try_from(u) {
            Ok(u) => YamlNode::UInt(u),
            Err(_) => YamlNode::BigInt(u.to_string()),
        })
    }

    fn visit_f64<E>(self, f: f64) -> Result<YamlNode, E> {
        Ok(YamlNode::Float(f))
    }

    fn visit_str<E>(self, s: &str) -> Result<YamlNode, E> {
        Ok(YamlNode::String(s.to_string()))
    }

    fn visit_string<E>(self, s: String) -> Result<YamlNode, E> {
        Ok(YamlNode::String(s))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<YamlNode, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(YamlNode::Seq(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<YamlNode, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(YamlNode::Map(entries))
    }

    // Explicitly tagged values arrive as enums; the tag is dropped.
    fn visit_enum<A>(self, data: A) -> Result<YamlNode, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (_tag, contents) = data.variant::<String>()?;
        contents.newtype_variant()
    }
}

/// Converts a YAML tree into the generic value tree.
///
/// Scalar keys are stringified the way a JSON encoder would and a repeated
/// key keeps its first position with the last value. `<<` merge entries are
/// applied with explicit keys taking precedence. Non-finite floats and
/// integers wider than 64 bits are rejected since JSON numbers here cannot
/// carry them.
pub fn yaml_to_json(yaml: YamlNode) -> Result<Value, Error> {
    Ok(match yaml {
        YamlNode::Null => Value::Null,
        YamlNode::Bool(b) => Value::Bool(b),
        YamlNode::Int(i) => Value::Number(Number::from(i)),
        YamlNode::UInt(u) => Value::Number(Number::from(u)),
        YamlNode::BigInt(digits) => {
            return Err(Error::Unrepresentable(format!(
                "integer '{}' does not fit in 64 bits",
                digits
            )))
        }
        YamlNode::Float(f) => Value::Number(
            Number::from_f64(f)
                .ok_or_else(|| Error::Unrepresentable(format!("non-finite number '{}'", f)))?,
        ),
        YamlNode::String(s) => Value::String(s),
        YamlNode::Seq(seq) => Value::Array(
            seq.into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        YamlNode::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            let (merges, entries): (Vec<_>, Vec<_>) =
                entries.into_iter().partition(|(k, v)| is_merge(k, v));
            for (_, sources) in merges {
                let sources = match sources {
                    YamlNode::Seq(seq) => seq,
                    node => vec![node],
                };
                // earlier sources win over later ones
                for source in sources.into_iter().rev() {
                    if let Value::Object(merged) = yaml_to_json(source)? {
                        map.extend(merged);
                    }
                }
            }
            for (key, value) in entries {
                map.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
    })
}

fn is_merge(key: &YamlNode, value: &YamlNode) -> bool {
    let mergeable = match value {
        YamlNode::Map(_) => true,
        YamlNode::Seq(seq) => seq.iter().all(|node| matches!(node, YamlNode::Map(_))),
        _ => false,
    };
    matches!(key, YamlNode::String(k) if k == "<<") && mergeable
}

fn yaml_key(key: YamlNode) -> Result<String, Error> {
    match key {
        YamlNode::String(s) => Ok(s),
        YamlNode::Null => Ok("null".to_string()),
        YamlNode::Bool(b) => Ok(b.to_string()),
        YamlNode::Int(i) => Ok(i.to_string()),
        YamlNode::UInt(u) => Ok(u.to_string()),
        YamlNode::BigInt(digits) => Ok(digits),
        YamlNode::Float(f) => Ok(match Number::from_f64(f) {
            Some(n) => n.to_string(),
            // keep the YAML spelling
            None if f.is_nan() => ".nan".to_string(),
            None if f > 0.0 => ".inf".to_string(),
            None => "-.inf".to_string(),
        }),
        YamlNode::Seq(_) | YamlNode::Map(_) => Err(Error::Unrepresentable(
            "mapping key must be a scalar".to_string(),
        )),
    }
}

/// Converts a TOML tree into the generic value tree. Datetimes become strings.
pub fn toml_to_json(toml: toml::Value) -> Result<Value, Error> {
    Ok(match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(Number::from(i)),
        toml::Value::Float(f) => Value::Number(
            Number::from_f64(f)
                .ok_or_else(|| Error::Unrepresentable(format!("non-finite number '{}'", f)))?,
        ),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(
            arr.into_iter()
                .map(toml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        toml::Value::Table(table) => {
            let mut map = Map::with_capacity(table.len());
            for (key, value) in table {
                map.insert(key, toml_to_json(value)?);
            }
            Value::Object(map)
        }
    })
}
