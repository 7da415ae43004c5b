//! CLI definition for the field-table command-line interface.
//!
//! This module only depends on `clap` and `std`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect and edit field table YAML documents.
#[derive(Parser, Debug)]
#[command(name = "field-table")]
#[command(version)]
#[command(about = "Inspect and edit field table YAML documents")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the field type and every module with its variables
    Show {
        /// Field table YAML file
        file: PathBuf,
    },
    /// Print a variable, one of its attributes, or a sub-parameter
    Get {
        /// Field table YAML file
        file: PathBuf,
        /// Module (model_type) name
        module: String,
        /// Variable name
        variable: String,
        /// Attribute name; the sub-list name when --param is given
        attribute: Option<String>,
        /// Sub-parameter to read from the first entry of the sub-list
        #[arg(long, requires = "attribute")]
        param: Option<String>,
    },
    /// List the parameterized (sub-list) attributes of a variable
    Attributes {
        /// Field table YAML file
        file: PathBuf,
        /// Module (model_type) name
        module: String,
        /// Variable name
        variable: String,
    },
    /// Set an attribute, or a sub-parameter with --list
    Set {
        /// Field table YAML file
        file: PathBuf,
        /// Module (model_type) name
        module: String,
        /// Variable name
        variable: String,
        /// Attribute name, or sub-parameter name when --list is given
        key: String,
        /// New value, read as a YAML scalar (1, 0.5, true, text)
        value: String,
        /// Sub-list whose first entry receives the value
        #[arg(long)]
        list: Option<String>,
        /// Write the result here instead of back to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rename a variable within its module
    RenameVariable {
        /// Field table YAML file
        file: PathBuf,
        /// Module (model_type) name
        module: String,
        /// Current variable name
        old: String,
        /// New variable name
        new: String,
        /// Write the result here instead of back to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rename an attribute, or a sub-parameter with --list
    RenameAttribute {
        /// Field table YAML file
        file: PathBuf,
        /// Module (model_type) name
        module: String,
        /// Variable name
        variable: String,
        /// Current name
        old: String,
        /// New name
        new: String,
        /// Sub-list whose first entry holds the sub-parameter
        #[arg(long)]
        list: Option<String>,
        /// Write the result here instead of back to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append a variable, given as an inline YAML mapping, to a module
    Add {
        /// Field table YAML file
        file: PathBuf,
        /// Module (model_type) name
        module: String,
        /// Variable mapping, e.g. "{variable: no2, units: mmr}"
        variable: String,
        /// Write the result here instead of back to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
