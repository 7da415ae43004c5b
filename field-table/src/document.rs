//! Reading the parsed document layout into typed nodes.
//!
//! The document is walked by hand rather than through `Deserialize` so a
//! missing key is reported with its exact location, e.g.
//! `field_table[0].modlist[1].varlist`.

use serde_yaml_ng::{Mapping, Value};

use crate::error::{FieldTableError, NameKind, Result};
use crate::types::{AttributeValue, Module, Scalar, SubListEntry, Variable, VARIABLE_KEY};

pub(crate) const FIELD_TABLE_KEY: &str = "field_table";
pub(crate) const FIELD_TYPE_KEY: &str = "field_type";
pub(crate) const MODLIST_KEY: &str = "modlist";
pub(crate) const MODEL_TYPE_KEY: &str = "model_type";
pub(crate) const VARLIST_KEY: &str = "varlist";

/// Extract the field type and modlist of the first table in `doc`.
///
/// Further entries of the outer `field_table` sequence are ignored.
pub(crate) fn parse_document(doc: &Value) -> Result<(String, Vec<Module>)> {
    let root = doc
        .as_mapping()
        .ok_or_else(|| FieldTableError::invalid_value("document root", "expected a mapping"))?;
    let tables = required_sequence(root, FIELD_TABLE_KEY, "document root")?;
    let path = format!("{FIELD_TABLE_KEY}[0]");
    let table = tables[0]
        .as_mapping()
        .ok_or_else(|| FieldTableError::invalid_value(&path, "expected a mapping"))?;

    let field_type = required_string(table, FIELD_TYPE_KEY, &path)?;
    let modlist = required_sequence(table, MODLIST_KEY, &path)?;

    let mut modules: Vec<Module> = Vec::with_capacity(modlist.len());
    for (i, value) in modlist.iter().enumerate() {
        let module = parse_module(value, &format!("{path}.{MODLIST_KEY}[{i}]"))?;
        if modules.iter().any(|m| m.model_type() == module.model_type()) {
            return Err(FieldTableError::duplicate(
                NameKind::Module,
                module.model_type(),
                MODLIST_KEY,
            ));
        }
        modules.push(module);
    }

    Ok((field_type, modules))
}

fn parse_module(value: &Value, path: &str) -> Result<Module> {
    let map = value
        .as_mapping()
        .ok_or_else(|| FieldTableError::invalid_value(path, "expected a mapping"))?;
    let model_type = required_string(map, MODEL_TYPE_KEY, path)?;
    let varlist = required_sequence(map, VARLIST_KEY, path)?;

    let variables = varlist
        .iter()
        .enumerate()
        .map(|(i, v)| parse_variable(v, &format!("{path}.{VARLIST_KEY}[{i}]")))
        .collect::<Result<Vec<_>>>()?;

    Ok(Module::new(model_type, variables))
}

/// Build a variable from one varlist mapping.
pub(crate) fn parse_variable(value: &Value, path: &str) -> Result<Variable> {
    let map = value
        .as_mapping()
        .ok_or_else(|| FieldTableError::invalid_value(path, "expected a mapping"))?;
    let mut variable = Variable::new(required_string(map, VARIABLE_KEY, path)?);

    for (key, value) in map {
        let key = key_str(key, path)?;
        if key == VARIABLE_KEY {
            continue;
        }
        let attr_path = format!("{path}.{key}");
        let attribute = match value {
            Value::Sequence(entries) => AttributeValue::SubList(
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| parse_entry(e, &format!("{attr_path}[{i}]")))
                    .collect::<Result<Vec<_>>>()?,
            ),
            other => AttributeValue::Scalar(scalar(other, &attr_path)?),
        };
        variable.set_attribute(key, attribute);
    }

    Ok(variable)
}

fn parse_entry(value: &Value, path: &str) -> Result<SubListEntry> {
    let map = value
        .as_mapping()
        .ok_or_else(|| FieldTableError::invalid_value(path, "sub-list entries must be mappings"))?;
    map.iter()
        .map(|(k, v)| {
            let name = key_str(k, path)?;
            Ok((name.to_string(), scalar(v, &format!("{path}.{name}"))?))
        })
        .collect()
}

fn scalar(value: &Value, path: &str) -> Result<Scalar> {
    Scalar::from_value(value).ok_or_else(|| {
        let found = match value {
            Value::Null => "null",
            Value::Mapping(_) => "a mapping",
            Value::Sequence(_) => "a sequence",
            Value::Tagged(_) => "a tagged value",
            _ => "an unsupported value",
        };
        FieldTableError::invalid_value(path, format!("expected a scalar, found {found}"))
    })
}

fn key_str<'a>(key: &'a Value, path: &str) -> Result<&'a str> {
    key.as_str()
        .ok_or_else(|| FieldTableError::invalid_value(path, "keys must be strings"))
}

fn required<'a>(map: &'a Mapping, key: &'static str, path: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| FieldTableError::missing_key(key, path))
}

fn required_string(map: &Mapping, key: &'static str, path: &str) -> Result<String> {
    let value = required(map, key, path)?;
    match Scalar::from_value(value) {
        Some(Scalar::String(s)) => Ok(s),
        // `variable: 123` names a variable "123"
        Some(other) => Ok(other.to_string()),
        None => Err(FieldTableError::invalid_value(
            format!("{path}.{key}"),
            "expected a scalar name",
        )),
    }
}

fn required_sequence<'a>(map: &'a Mapping, key: &'static str, path: &str) -> Result<&'a [Value]> {
    let seq = required(map, key, path)?
        .as_sequence()
        .ok_or_else(|| FieldTableError::invalid_value(format!("{path}.{key}"), "expected a sequence"))?;
    if seq.is_empty() {
        return Err(FieldTableError::EmptySequence {
            key,
            path: path.to_string(),
        });
    }
    Ok(seq)
}
