//! Command handlers.
//!
//! Each handler loads the table, runs one model operation and returns the
//! text to print. Mutating handlers write the table back before returning.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use field_table::{FieldTable, FieldTableError, Scalar, Variable};

use crate::cli::Commands;

/// Run one parsed subcommand and return its output.
pub fn run(command: Commands) -> Result<String> {
    match command {
        Commands::Show { file } => show(&file),
        Commands::Get {
            file,
            module,
            variable,
            attribute,
            param,
        } => get(&file, &module, &variable, attribute.as_deref(), param.as_deref()),
        Commands::Attributes {
            file,
            module,
            variable,
        } => attributes(&file, &module, &variable),
        Commands::Set {
            file,
            module,
            variable,
            key,
            value,
            list,
            output,
        } => edit(&file, output, |table| {
            let value = Scalar::parse(&value);
            match list.as_deref() {
                Some(list) => table.set_subparam_value(&module, &variable, list, &key, value.clone()),
                None => table.set_attribute_value(&module, &variable, &key, value.clone()),
            }?;
            Ok(format!("{module}/{variable}: {key} = {value}"))
        }),
        Commands::RenameVariable {
            file,
            module,
            old,
            new,
            output,
        } => edit(&file, output, |table| {
            table.rename_variable(&module, &old, &new)?;
            Ok(format!("{module}: {old} -> {new}"))
        }),
        Commands::RenameAttribute {
            file,
            module,
            variable,
            old,
            new,
            list,
            output,
        } => edit(&file, output, |table| {
            match list.as_deref() {
                Some(list) => table.rename_subparam(&module, &variable, list, &old, &new),
                None => table.rename_attribute(&module, &variable, &old, &new),
            }?;
            Ok(format!("{module}/{variable}: {old} -> {new}"))
        }),
        Commands::Add {
            file,
            module,
            variable,
            output,
        } => edit(&file, output, |table| {
            let var = Variable::from_yaml_str(&variable)?;
            let name = var.name().to_string();
            table.add_variable(&module, var)?;
            Ok(format!("{module}: added {name}"))
        }),
    }
}

fn load(file: &Path) -> Result<FieldTable> {
    FieldTable::from_file(file).with_context(|| format!("failed to load {}", file.display()))
}

/// Load, apply `op`, then save to `output` (or back to `file`).
fn edit<F>(file: &Path, output: Option<PathBuf>, op: F) -> Result<String>
where
    F: FnOnce(&mut FieldTable) -> field_table::Result<String>,
{
    let mut table = load(file)?;
    let message = op(&mut table)?;
    let target = output.unwrap_or_else(|| file.to_path_buf());
    table
        .write_to_file(&target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    tracing::debug!(path = %target.display(), "saved");
    Ok(message)
}

fn show(file: &Path) -> Result<String> {
    let table = load(file)?;
    let mut out = format!("field_type: {}\n", table.field_type());
    for module in table.modules() {
        let _ = writeln!(
            out,
            "{} ({} variables)",
            module.model_type(),
            module.varlist().len()
        );
        for var in module.varlist() {
            let _ = writeln!(out, "  {}", var.name());
        }
    }
    Ok(out)
}

fn get(
    file: &Path,
    module: &str,
    variable: &str,
    attribute: Option<&str>,
    param: Option<&str>,
) -> Result<String> {
    let table = load(file)?;
    match (attribute, param) {
        (Some(list), Some(param)) => {
            Ok(table.get_subparam_value(module, variable, list, param)?.to_string())
        }
        (Some(key), None) => match table.get_attribute_value(module, variable, key) {
            Ok(value) => Ok(value.to_string()),
            Err(FieldTableError::NotAScalar { .. }) => {
                let entries = table.get_subparam(module, variable, key)?;
                Ok(serde_yaml_ng::to_string(entries)?)
            }
            Err(err) => Err(err.into()),
        },
        (None, _) => {
            let var = table.get_variable(module, variable)?;
            Ok(serde_yaml_ng::to_string(var)?)
        }
    }
}

fn attributes(file: &Path, module: &str, variable: &str) -> Result<String> {
    let table = load(file)?;
    Ok(table.get_attribute_list(module, variable)?.join("\n"))
}
