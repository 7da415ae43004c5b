//! In-memory model of a field table document.
//!
//! A field table describes the fields (tracers and the like) that each model
//! component registers, grouped by owning module:
//!
//! ```text
//! field_table:
//! - field_type: tracer
//!   modlist:
//!   - model_type: atmos_mod
//!     varlist:
//!     - variable: soa
//!       units: mmr
//!       chem_param:
//!       - value: aerosol
//!         frac_pm1: 0.89
//! ```
//!
//! # Architecture
//!
//! - **Typed levels**: `FieldTable` → `Module` → `Variable`, with an open,
//!   ordered attribute map per variable (`Scalar` or sub-list values)
//! - **Path-qualified API**: every query and edit is addressed by module,
//!   variable, attribute and sub-parameter name
//! - **All-or-nothing edits**: uniqueness and existence are checked before
//!   the tree is touched
//! - **YAML on disk**: `from_file` / `write_to_file` are thin shims over the
//!   document codec

mod document;
pub mod error;
pub mod table;
pub mod types;

pub use error::{ErrorKind, FieldTableError, NameKind, Result};
pub use table::FieldTable;
pub use types::{AttributeValue, Module, Scalar, SubListEntry, Variable, VARIABLE_KEY};
