//! FieldTable — main API surface for the field table model.
//!
//! Holds one table (`field_type` plus its modlist) in memory and exposes
//! path-qualified queries and edits addressed by module, variable,
//! attribute and sub-parameter name. Every edit validates before it touches
//! the tree, so a failed call leaves the table exactly as it was.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_yaml_ng::Value;
use tracing::debug;
use ulid::Ulid;

use crate::document::parse_document;
use crate::error::{FieldTableError, NameKind, Result};
use crate::types::{AttributeValue, Module, Scalar, SubListEntry, Variable, VARIABLE_KEY};

/// In-memory field table.
///
/// ```rust
/// use field_table::FieldTable;
///
/// let yaml = r#"
/// field_table:
/// - field_type: tracer
///   modlist:
///   - model_type: atmos_mod
///     varlist:
///     - variable: sphum
///       units: kg/kg
/// "#;
/// let mut table = FieldTable::from_yaml_str(yaml)?;
/// table.set_attribute_value("atmos_mod", "sphum", "units", "g/kg")?;
/// assert_eq!(table.get_attribute_value("atmos_mod", "sphum", "units")?, "g/kg");
/// # Ok::<(), field_table::FieldTableError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTable {
    field_type: String,
    modlist: Vec<Module>,
}

#[derive(Serialize)]
struct TableEntry<'a> {
    field_type: &'a str,
    modlist: &'a [Module],
}

#[derive(Serialize)]
struct Document<'a> {
    field_table: [TableEntry<'a>; 1],
}

impl Serialize for FieldTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Document {
            field_table: [TableEntry {
                field_type: &self.field_type,
                modlist: &self.modlist,
            }],
        }
        .serialize(serializer)
    }
}

impl FieldTable {
    // --- Construction ---

    /// Build from an already-parsed document.
    ///
    /// Fails if `field_table`, `field_type`, `modlist`, `model_type`,
    /// `varlist` or any `variable` key is missing. Only the first entry of
    /// `field_table` is read.
    pub fn from_document(doc: &Value) -> Result<Self> {
        let (field_type, modlist) = parse_document(doc)?;
        debug!(
            field_type = %field_type,
            modules = modlist.len(),
            "field table loaded"
        );
        Ok(Self {
            field_type,
            modlist,
        })
    }

    /// Parse YAML text and build from it.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: Value = serde_yaml_ng::from_str(text)?;
        Self::from_document(&doc)
    }

    /// Read and build from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| FieldTableError::io(path, e))?;
        debug!(path = %path.display(), "reading field table");
        Self::from_yaml_str(&text)
    }

    // --- Output ---

    /// The table in document layout, ready for any serializer.
    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_yaml_ng::to_value(self)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Serialize to YAML and atomically replace the file at `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.to_yaml_string()?;
        atomic_write(path, yaml.as_bytes())?;
        debug!(path = %path.display(), "field table written");
        Ok(())
    }

    // --- Queries ---

    pub fn field_type(&self) -> &str {
        &self.field_type
    }

    pub fn modules(&self) -> &[Module] {
        &self.modlist
    }

    /// Module `model_type` names in document order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modlist.iter().map(Module::model_type).collect()
    }

    pub fn get_module(&self, module: &str) -> Result<&Module> {
        self.modlist
            .iter()
            .find(|m| m.model_type() == module)
            .ok_or_else(|| FieldTableError::ModuleNotFound {
                module: module.to_string(),
            })
    }

    /// The variable named `varname` inside `module`.
    pub fn get_variable(&self, module: &str, varname: &str) -> Result<&Variable> {
        self.get_module(module)?
            .variable(varname)
            .ok_or_else(|| variable_not_found(module, varname))
    }

    /// Names of the parameterized (sub-list valued) attributes of a variable.
    ///
    /// Plain scalar attributes such as `longname` or `units` are not listed.
    pub fn get_attribute_list(&self, module: &str, varname: &str) -> Result<Vec<&str>> {
        Ok(self.get_variable(module, varname)?.sublist_names())
    }

    pub fn get_attribute_count(&self, module: &str, varname: &str) -> Result<usize> {
        Ok(self.get_attribute_list(module, varname)?.len())
    }

    pub fn get_attribute_value(&self, module: &str, varname: &str, key: &str) -> Result<&Scalar> {
        let var = self.get_variable(module, varname)?;
        match var.attribute(key) {
            Some(AttributeValue::Scalar(value)) => Ok(value),
            Some(AttributeValue::SubList(_)) => Err(FieldTableError::NotAScalar {
                variable: varname.to_string(),
                key: key.to_string(),
            }),
            None => Err(attribute_not_found(varname, key)),
        }
    }

    /// The whole sub-list stored under `subparam_name`.
    pub fn get_subparam(&self, module: &str, varname: &str, subparam_name: &str) -> Result<&[SubListEntry]> {
        let var = self.get_variable(module, varname)?;
        match var.attribute(subparam_name) {
            Some(AttributeValue::SubList(entries)) => Ok(entries),
            Some(AttributeValue::Scalar(_)) => Err(not_a_sublist(varname, subparam_name)),
            None => Err(attribute_not_found(varname, subparam_name)),
        }
    }

    /// Value of `paramname` in the first entry of sub-list `listname`.
    ///
    /// A module or variable that cannot be found is reported as
    /// [`FieldTableError::Unresolved`] since the chain never reached a
    /// sub-list; a missing `listname` or `paramname` is a key error.
    pub fn get_subparam_value(
        &self,
        module: &str,
        varname: &str,
        listname: &str,
        paramname: &str,
    ) -> Result<&Scalar> {
        let var = self
            .get_variable(module, varname)
            .map_err(|e| FieldTableError::unresolved(format!("{module}/{varname}/{listname}"), e))?;
        let entry = first_entry(var, listname)?;
        entry
            .get(paramname)
            .ok_or_else(|| subparam_not_found(varname, listname, paramname))
    }

    /// Variable names of a module in document order.
    pub fn get_variable_names(&self, module: &str) -> Result<Vec<&str>> {
        Ok(self
            .get_module(module)?
            .varlist()
            .iter()
            .map(Variable::name)
            .collect())
    }

    pub fn get_variable_count(&self, module: &str) -> Result<usize> {
        Ok(self.get_module(module)?.varlist().len())
    }

    // --- Mutations ---

    /// Append a variable to a module's varlist.
    ///
    /// The new name is not checked against existing siblings.
    pub fn add_variable(&mut self, module: &str, variable: Variable) -> Result<()> {
        let target = self.module_mut(module)?;
        debug!(module, variable = variable.name(), "adding variable");
        target.push(variable);
        Ok(())
    }

    /// Create or overwrite a scalar attribute.
    pub fn set_attribute_value(
        &mut self,
        module: &str,
        varname: &str,
        key: &str,
        value: impl Into<Scalar>,
    ) -> Result<()> {
        if key == VARIABLE_KEY {
            return Err(reserved_key(varname));
        }
        let var = self.variable_mut(module, varname)?;
        var.set_attribute(key, AttributeValue::Scalar(value.into()));
        debug!(module, variable = varname, key, "attribute set");
        Ok(())
    }

    /// Create or overwrite a sub-parameter in the first entry of `listname`.
    pub fn set_subparam_value(
        &mut self,
        module: &str,
        varname: &str,
        listname: &str,
        subparamname: &str,
        value: impl Into<Scalar>,
    ) -> Result<()> {
        let var = self.variable_mut(module, varname)?;
        first_entry_mut(var, varname, listname)?.set(subparamname, value.into());
        debug!(module, variable = varname, list = listname, key = subparamname, "sub-parameter set");
        Ok(())
    }

    /// Change the `variable` name of a variable.
    ///
    /// Renaming to the current name is allowed; any other sibling holding
    /// `new_name` is a conflict.
    pub fn rename_variable(&mut self, module: &str, old_name: &str, new_name: &str) -> Result<()> {
        let target = self.module_mut(module)?;
        let index = target
            .position(old_name)
            .ok_or_else(|| variable_not_found(module, old_name))?;
        let taken = target
            .varlist()
            .iter()
            .enumerate()
            .any(|(i, v)| i != index && v.name() == new_name);
        if taken {
            return Err(FieldTableError::duplicate(
                NameKind::Variable,
                new_name,
                format!("module '{module}'"),
            ));
        }
        target.variable_at_mut(index).set_name(new_name);
        debug!(module, old = old_name, new = new_name, "variable renamed");
        Ok(())
    }

    /// Rename an attribute key, keeping its position.
    ///
    /// Fails if `newname` is already a key on the variable, which includes
    /// `oldname == newname`.
    pub fn rename_attribute(&mut self, module: &str, varname: &str, oldname: &str, newname: &str) -> Result<()> {
        if newname == VARIABLE_KEY {
            return Err(reserved_key(varname));
        }
        let var = self.variable_mut(module, varname)?;
        if var.has_attribute(newname) {
            return Err(FieldTableError::duplicate(
                NameKind::Attribute,
                newname,
                format!("variable '{varname}'"),
            ));
        }
        if !var.has_attribute(oldname) {
            return Err(attribute_not_found(varname, oldname));
        }
        var.rename_attribute_key(oldname, newname);
        debug!(module, variable = varname, old = oldname, new = newname, "attribute renamed");
        Ok(())
    }

    /// Rename a sub-parameter in the first entry of `listname`.
    pub fn rename_subparam(
        &mut self,
        module: &str,
        varname: &str,
        listname: &str,
        oldname: &str,
        newname: &str,
    ) -> Result<()> {
        let var = self.variable_mut(module, varname)?;
        let entry = first_entry_mut(var, varname, listname)?;
        if entry.contains(newname) {
            return Err(FieldTableError::duplicate(
                NameKind::Subparam,
                newname,
                format!("'{listname}' of variable '{varname}'"),
            ));
        }
        if !entry.contains(oldname) {
            return Err(subparam_not_found(varname, listname, oldname));
        }
        entry.rename_key(oldname, newname);
        debug!(
            module,
            variable = varname,
            list = listname,
            old = oldname,
            new = newname,
            "sub-parameter renamed"
        );
        Ok(())
    }

    // --- Internal ---

    fn module_mut(&mut self, module: &str) -> Result<&mut Module> {
        self.modlist
            .iter_mut()
            .find(|m| m.model_type() == module)
            .ok_or_else(|| FieldTableError::ModuleNotFound {
                module: module.to_string(),
            })
    }

    fn variable_mut(&mut self, module: &str, varname: &str) -> Result<&mut Variable> {
        self.module_mut(module)?
            .variable_mut(varname)
            .ok_or_else(|| variable_not_found(module, varname))
    }
}

fn first_entry<'a>(var: &'a Variable, listname: &str) -> Result<&'a SubListEntry> {
    match var.attribute(listname) {
        Some(AttributeValue::SubList(entries)) => entries
            .first()
            .ok_or_else(|| empty_sublist(var.name(), listname)),
        Some(AttributeValue::Scalar(_)) => Err(not_a_sublist(var.name(), listname)),
        None => Err(attribute_not_found(var.name(), listname)),
    }
}

fn first_entry_mut<'a>(var: &'a mut Variable, varname: &str, listname: &str) -> Result<&'a mut SubListEntry> {
    match var.attribute_mut(listname) {
        Some(AttributeValue::SubList(entries)) => entries
            .first_mut()
            .ok_or_else(|| empty_sublist(varname, listname)),
        Some(AttributeValue::Scalar(_)) => Err(not_a_sublist(varname, listname)),
        None => Err(attribute_not_found(varname, listname)),
    }
}

fn variable_not_found(module: &str, varname: &str) -> FieldTableError {
    FieldTableError::VariableNotFound {
        module: module.to_string(),
        variable: varname.to_string(),
    }
}

fn attribute_not_found(varname: &str, key: &str) -> FieldTableError {
    FieldTableError::AttributeNotFound {
        variable: varname.to_string(),
        key: key.to_string(),
    }
}

fn subparam_not_found(varname: &str, listname: &str, key: &str) -> FieldTableError {
    FieldTableError::SubparamNotFound {
        variable: varname.to_string(),
        list: listname.to_string(),
        key: key.to_string(),
    }
}

fn not_a_sublist(varname: &str, key: &str) -> FieldTableError {
    FieldTableError::NotASubList {
        variable: varname.to_string(),
        key: key.to_string(),
    }
}

fn empty_sublist(varname: &str, key: &str) -> FieldTableError {
    FieldTableError::EmptySubList {
        variable: varname.to_string(),
        key: key.to_string(),
    }
}

fn reserved_key(varname: &str) -> FieldTableError {
    FieldTableError::ReservedKey {
        key: VARIABLE_KEY.to_string(),
        variable: varname.to_string(),
    }
}

/// Write to a temp file then rename for atomic persistence.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        FieldTableError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"),
        )
    })?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).map_err(|e| FieldTableError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        FieldTableError::io(path, e)
    })?;
    Ok(())
}
