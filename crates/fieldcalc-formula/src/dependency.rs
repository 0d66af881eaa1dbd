//! Dependency analysis
//!
//! Extracts the fields a formula reads without evaluating it. Only the token
//! stream is inspected, so a formula with a grammar error still reports its
//! references as long as it tokenizes.

use crate::error::FormulaResult;
use crate::lexer::{tokenize_with, TokenKind};
use crate::options::EngineOptions;
use crate::parser::strip_leading_equals;
use ahash::AHashSet;
use fieldcalc_core::{FieldCatalog, FieldId};

/// Field ids referenced by a formula
///
/// References to names the catalog does not know are ignored and duplicates
/// collapse, so the result only depends on which fields are mentioned.
pub fn dependencies(formula: &str, catalog: &FieldCatalog) -> FormulaResult<AHashSet<FieldId>> {
    dependencies_with(formula, catalog, &EngineOptions::default())
}

/// Field ids referenced by a formula, tokenized with the given options
pub fn dependencies_with(
    formula: &str,
    catalog: &FieldCatalog,
    options: &EngineOptions,
) -> FormulaResult<AHashSet<FieldId>> {
    let mut ids = AHashSet::new();
    for name in referenced_names_with(formula, options)? {
        if let Some(id) = catalog.resolve(&name) {
            ids.insert(id.clone());
        }
    }
    Ok(ids)
}

/// Display names referenced by a formula, in order of first appearance
///
/// Unlike [`dependencies`] this keeps names that match no field, which lets
/// callers report dangling references.
pub fn referenced_names(formula: &str) -> FormulaResult<Vec<String>> {
    referenced_names_with(formula, &EngineOptions::default())
}

/// Display names referenced by a formula, tokenized with the given options
pub fn referenced_names_with(formula: &str, options: &EngineOptions) -> FormulaResult<Vec<String>> {
    let tokens = tokenize_with(strip_leading_equals(formula), options)?;

    let mut seen = AHashSet::new();
    let names = tokens
        .into_iter()
        .filter(|t| t.kind == TokenKind::FieldRef)
        .map(|t| t.lexeme)
        .filter(|name| seen.insert(name.clone()))
        .collect();

    Ok(names)
}
