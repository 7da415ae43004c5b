//! Integration tests for the field table model over a two-module fixture

use std::path::PathBuf;

use field_table::{ErrorKind, FieldTable, FieldTableError, NameKind, Scalar, SubListEntry, Variable};
use rstest::rstest;
use serde_yaml_ng::{Mapping, Value};
use tempfile::TempDir;

const FIXTURE: &str = include_str!("fixtures/field_table.yaml");

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/field_table.yaml")
}

fn table() -> FieldTable {
    FieldTable::from_yaml_str(FIXTURE).expect("fixture should load")
}

fn fixture_doc() -> Value {
    serde_yaml_ng::from_str(FIXTURE).unwrap()
}

fn first_module_mut(doc: &mut Value) -> &mut Mapping {
    doc.get_mut("field_table")
        .and_then(|t| t.get_mut(0))
        .and_then(|t| t.get_mut("modlist"))
        .and_then(|m| m.get_mut(0))
        .and_then(Value::as_mapping_mut)
        .expect("fixture has a first module")
}

fn new_variable() -> Variable {
    Variable::new("test")
        .with_attribute("longname", "longtest")
        .with_attribute("units", "m")
        .with_attribute("profile_type", "fixed")
        .with_attribute("subparams", vec![SubListEntry::new().with("surface_value", 1)])
}

#[test]
fn test_fieldtable_from_file() {
    let from_file = FieldTable::from_file(fixture_path()).unwrap();
    assert_eq!(from_file, table());
}

#[test]
fn test_get_field_type() {
    assert_eq!(table().field_type(), "tracer");
}

#[test]
fn test_missing_varlist_fails() {
    let mut doc = fixture_doc();
    first_module_mut(&mut doc).remove("varlist");

    let err = FieldTable::from_document(&doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert!(matches!(err, FieldTableError::MissingKey { key: "varlist", .. }));
}

#[test]
fn test_missing_variable_key_fails() {
    let mut doc = fixture_doc();
    let module = first_module_mut(&mut doc);
    module
        .get_mut("varlist")
        .and_then(|v| v.get_mut(1))
        .and_then(Value::as_mapping_mut)
        .unwrap()
        .remove("variable");

    let err = FieldTable::from_document(&doc).unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing required key 'variable' at field_table[0].modlist[0].varlist[1]"
    );
}

#[test]
fn test_add_variable() {
    let mut table = table();
    table.add_variable("atmos_mod", new_variable()).unwrap();

    let module = table.get_module("atmos_mod").unwrap();
    assert!(module.varlist().contains(&new_variable()));
    assert_eq!(module.varlist().last().unwrap().name(), "test");
}

#[test]
fn test_add_variable_from_yaml() {
    let mut table = table();
    let var = Variable::from_yaml_str(
        "variable: test\nlongname: longtest\nunits: m\nprofile_type: fixed\nsubparams:\n- surface_value: 1\n",
    )
    .unwrap();
    assert_eq!(var, new_variable());

    table.add_variable("atmos_mod", var).unwrap();
    assert_eq!(
        table.get_variable_names("atmos_mod").unwrap(),
        vec!["sphum", "soa", "test"]
    );
}

#[test]
fn test_add_variable_to_unknown_module_fails() {
    let mut table = table();
    let err = table.add_variable("ocean_mod", new_variable()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(table, self::table());
}

#[test]
fn test_get_variable() {
    let table = table();
    let var = table.get_variable("atmos_mod", "soa").unwrap();
    assert_eq!(var, &table.modules()[0].varlist()[1]);
}

#[test]
fn test_get_variable_fail() {
    let err = table().get_variable("atmos_mod", "sob").unwrap_err();
    assert!(matches!(err, FieldTableError::VariableNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Structure);
}

#[test]
fn test_get_subparam() {
    let table = table();
    let sublist = table.get_subparam("atmos_mod", "soa", "chem_param").unwrap();
    let expected = table.modules()[0].varlist()[1]
        .attribute("chem_param")
        .and_then(|a| a.as_sublist())
        .unwrap();
    assert_eq!(sublist, expected);
    assert_eq!(sublist[0].get("value").unwrap(), "aerosol");
}

#[test]
fn test_get_attribute_value() {
    let table = table();
    assert_eq!(table.get_attribute_value("atmos_mod", "soa", "units").unwrap(), "mmr");
}

#[test]
fn test_get_attribute_value_key_fail() {
    let err = table()
        .get_attribute_value("atmos_mod", "soa", "unit")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Key);
}

#[test]
fn test_get_subparam_value() {
    let table = table();
    let value = table
        .get_subparam_value("atmos_mod", "soa", "chem_param", "frac_pm1")
        .unwrap();
    assert_eq!(value, &Scalar::Float(0.89));
}

#[test]
fn test_get_subparam_value_bad_key() {
    let err = table()
        .get_subparam_value("atmos_mod", "soa", "chem_param", "frac_pms")
        .unwrap_err();
    assert!(matches!(err, FieldTableError::SubparamNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Key);
}

#[test]
fn test_get_subparam_value_bad_var_name() {
    let err = table()
        .get_subparam_value("atmos_mod", "sob", "chem_param", "frac_pm1")
        .unwrap_err();
    assert!(matches!(err, FieldTableError::Unresolved { .. }));
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn test_get_variable_names() {
    assert_eq!(
        table().get_variable_names("atmos_mod").unwrap(),
        vec!["sphum", "soa"]
    );
}

#[test]
fn test_get_variable_count() {
    assert_eq!(table().get_variable_count("atmos_mod").unwrap(), 2);
}

#[test]
fn test_get_attribute_list() {
    assert_eq!(
        table().get_attribute_list("atmos_mod", "soa").unwrap(),
        vec!["chem_param", "profile_type"]
    );
}

#[test]
fn test_get_attribute_count() {
    assert_eq!(table().get_attribute_count("atmos_mod", "soa").unwrap(), 2);
}

#[test]
fn test_set_attribute_value() {
    let mut table = table();
    table
        .set_attribute_value("atmos_mod", "soa", "units", "m")
        .unwrap();
    assert_eq!(table.get_attribute_value("atmos_mod", "soa", "units").unwrap(), "m");
}

#[test]
fn test_set_attribute_value_creates_key() {
    let mut table = table();
    table
        .set_attribute_value("atmos_mod", "sphum", "convection", "all")
        .unwrap();
    let var = table.get_variable("atmos_mod", "sphum").unwrap();
    let keys: Vec<_> = var.attributes().map(|(k, _)| k).collect();
    assert_eq!(keys.last(), Some(&"convection"));
}

#[test]
fn test_set_subparam_value() {
    let mut table = table();
    table
        .set_subparam_value("atmos_mod", "soa", "chem_param", "frac_pm1", 1)
        .unwrap();
    let value = table
        .get_subparam_value("atmos_mod", "soa", "chem_param", "frac_pm1")
        .unwrap();
    assert_eq!(value, &Scalar::Integer(1));
}

#[test]
fn test_rename_variable() {
    let mut table = table();
    table.rename_variable("atmos_mod", "soa", "soc").unwrap();
    assert_eq!(table.modules()[0].varlist()[1].name(), "soc");
    assert!(table.get_variable("atmos_mod", "soa").is_err());
}

#[test]
fn test_rename_variable_duplicate() {
    let mut table = table();
    let err = table
        .rename_variable("atmos_mod", "soa", "sphum")
        .unwrap_err();
    assert!(matches!(
        err,
        FieldTableError::DuplicateName {
            kind: NameKind::Variable,
            ..
        }
    ));
    assert_eq!(table, self::table());
}

#[test]
fn test_rename_attribute() {
    let mut table = table();
    table
        .rename_attribute("atmos_mod", "soa", "longname", "ln")
        .unwrap();
    let var = table.get_variable("atmos_mod", "soa").unwrap();
    assert_eq!(var.attribute("ln").and_then(|a| a.as_scalar()).unwrap(), "SOA tracer");
    assert!(!var.has_attribute("longname"));
    assert_eq!(var.attributes().next().map(|(k, _)| k), Some("ln"));
}

#[test]
fn test_rename_subparam() {
    let mut table = table();
    table
        .rename_subparam("atmos_mod", "soa", "chem_param", "frac_pm1", "frac_pm2")
        .unwrap();
    let value = table
        .get_subparam_value("atmos_mod", "soa", "chem_param", "frac_pm2")
        .unwrap();
    assert_eq!(value, &0.89);
    assert_eq!(
        table
            .get_subparam_value("atmos_mod", "soa", "chem_param", "frac_pm1")
            .unwrap_err()
            .kind(),
        ErrorKind::Key
    );
}

#[rstest]
#[case("longname", "longname")]
#[case("longname", "units")]
#[case("units", "chem_param")]
fn test_rename_attribute_duplicate(#[case] old: &str, #[case] new: &str) {
    let mut table = table();
    let err = table
        .rename_attribute("atmos_mod", "soa", old, new)
        .unwrap_err();
    assert!(matches!(
        err,
        FieldTableError::DuplicateName {
            kind: NameKind::Attribute,
            ..
        }
    ));
    assert_eq!(table, self::table());
}

#[rstest]
#[case("frac_pm1", "frac_pm1")]
#[case("frac_pm1", "frac_pm25")]
#[case("frac_pm10", "value")]
fn test_rename_subparam_duplicate(#[case] old: &str, #[case] new: &str) {
    let mut table = table();
    let err = table
        .rename_subparam("atmos_mod", "soa", "chem_param", old, new)
        .unwrap_err();
    assert!(matches!(
        err,
        FieldTableError::DuplicateName {
            kind: NameKind::Subparam,
            ..
        }
    ));
    assert_eq!(table, self::table());
}

#[test]
fn test_access_other_module() {
    let mut table = table();

    table.add_variable("other_mod", new_variable()).unwrap();
    assert!(table
        .get_module("other_mod")
        .unwrap()
        .varlist()
        .contains(&new_variable()));

    let var = table.get_variable("other_mod", "soc").unwrap();
    assert_eq!(var, &table.modules()[1].varlist()[1]);

    let sublist = table.get_subparam("other_mod", "soc", "chem_params").unwrap();
    assert_eq!(sublist[0].get("frac_pm26").unwrap(), &0.96);

    assert_eq!(
        table
            .get_attribute_value("other_mod", "test_var_name", "units")
            .unwrap(),
        "t/t"
    );
    assert_eq!(
        table
            .get_subparam_value("other_mod", "soc", "chem_params", "frac_pm2")
            .unwrap(),
        &0.89
    );
    assert_eq!(
        table.get_variable_names("other_mod").unwrap(),
        vec!["test_var_name", "soc", "test"]
    );
    assert_eq!(table.get_variable_count("other_mod").unwrap(), 3);
    assert_eq!(
        table.get_attribute_list("other_mod", "test").unwrap(),
        vec!["subparams"]
    );
    assert_eq!(table.get_attribute_count("other_mod", "test").unwrap(), 1);

    table
        .set_attribute_value("other_mod", "soc", "units", "m")
        .unwrap();
    table
        .set_subparam_value("other_mod", "soc", "chem_params", "frac_pm2", 1)
        .unwrap();
    table.rename_variable("other_mod", "soc", "sob").unwrap();
    table
        .rename_attribute("other_mod", "sob", "longname", "ln")
        .unwrap();
    table
        .rename_subparam("other_mod", "sob", "chem_params", "frac_pm2", "frac_pm1")
        .unwrap();

    let var = &table.modules()[1].varlist()[1];
    assert_eq!(var.name(), "sob");
    assert_eq!(var.attribute("units").and_then(|a| a.as_scalar()).unwrap(), "m");
    assert!(var.has_attribute("ln"));
    let entry = &var.attribute("chem_params").and_then(|a| a.as_sublist()).unwrap()[0];
    assert_eq!(entry.get("frac_pm1").unwrap(), &Scalar::Integer(1));

    // atmos_mod is untouched by edits to other_mod
    assert_eq!(table.modules()[0], self::table().modules()[0].clone());
    assert_eq!(
        table.get_variable_names("atmos_mod").unwrap(),
        vec!["sphum", "soa"]
    );
}

#[test]
fn test_round_trip_preserves_names_and_order() {
    let table = table();
    let reparsed = FieldTable::from_yaml_str(&table.to_yaml_string().unwrap()).unwrap();

    assert_eq!(reparsed.field_type(), "tracer");
    assert_eq!(reparsed.module_names(), vec!["atmos_mod", "other_mod"]);
    for module in table.module_names() {
        assert_eq!(
            reparsed.get_variable_names(module).unwrap(),
            table.get_variable_names(module).unwrap()
        );
    }
    assert_eq!(reparsed, table);
}

#[test]
fn test_round_trip_through_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("field_table.yaml");

    let mut table = table();
    table
        .rename_subparam("atmos_mod", "soa", "chem_param", "frac_pm1", "frac_pm2")
        .unwrap();
    table.write_to_file(&path).unwrap();

    let reread = FieldTable::from_file(&path).unwrap();
    assert_eq!(reread, table);
    let names: Vec<_> = reread.get_subparam("atmos_mod", "soa", "chem_param").unwrap()[0]
        .names()
        .collect();
    assert_eq!(names, vec!["value", "frac_pm2", "frac_pm25", "frac_pm10"]);
}

#[test]
fn test_round_trip_keeps_large_unsigned_integers() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("field_table.yaml");
    let yaml = "field_table:\n- field_type: tracer\n  modlist:\n  - model_type: atmos_mod\n    varlist:\n    - variable: seed\n      big: 18446744073709551615\n      chem_param:\n      - value: fixed\n        mask: 9223372036854775808\n";

    let mut table = FieldTable::from_yaml_str(yaml).unwrap();
    assert_eq!(
        table.get_attribute_value("atmos_mod", "seed", "big").unwrap(),
        &Scalar::Unsigned(u64::MAX)
    );
    table
        .set_attribute_value("atmos_mod", "seed", "units", "1")
        .unwrap();
    table.write_to_file(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("big: 18446744073709551615"));
    assert!(written.contains("mask: 9223372036854775808"));
    let reread = FieldTable::from_file(&path).unwrap();
    assert_eq!(reread, table);
    assert_eq!(
        reread
            .get_subparam_value("atmos_mod", "seed", "chem_param", "mask")
            .unwrap(),
        &Scalar::Unsigned(1 << 63)
    );
}

#[test]
fn test_only_first_table_is_used() {
    let mut doc = fixture_doc();
    let extra: Value = serde_yaml_ng::from_str(
        "field_type: diag\nmodlist:\n- model_type: land_mod\n  varlist:\n  - variable: x\n",
    )
    .unwrap();
    doc.get_mut("field_table")
        .and_then(Value::as_sequence_mut)
        .unwrap()
        .push(extra);

    let table = FieldTable::from_document(&doc).unwrap();
    assert_eq!(table.field_type(), "tracer");
    assert_eq!(table.module_names(), vec!["atmos_mod", "other_mod"]);
}
