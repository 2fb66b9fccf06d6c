//! Model and label catalog: static tables plus fuzzy lookup helpers.
//!
//! Every model and label is plain Rust data rather than a class hierarchy,
//! so adding a new printer or tape size is a matter of appending a table row.

pub mod label;
pub mod models;

pub use label::{Color, FormFactor, Label};
pub use models::{Capability, Family, Model, ALL_MODELS};

use crate::error::CatalogError;

/// Normalizes an identifier for fuzzy comparison: lowercase, ASCII
/// alphanumerics only. Mirrors `cli.py`'s `_normalise`.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Levenshtein edit distance between two strings, used for "did you mean"
/// suggestions where the original Python driver uses `difflib.get_close_matches`.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    let mut row: Vec<usize> = (0..=m).collect();
    for i in 1..=n {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=m {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[m]
}

/// Returns up to `n` candidates from `choices` ordered by increasing edit
/// distance to `query` (ties broken by input order), dropping anything
/// farther than half the query's own length away.
fn close_matches<'a>(query: &str, choices: impl IntoIterator<Item = &'a str>, n: usize) -> Vec<&'a str> {
    let max_distance = (query.len() / 2).max(1);
    let mut scored: Vec<(usize, &str)> = choices
        .into_iter()
        .map(|c| (levenshtein(query, &normalize(c)), c))
        .filter(|(d, _)| *d <= max_distance)
        .collect();
    scored.sort_by_key(|(d, _)| *d);
    scored.into_iter().take(n).map(|(_, c)| c).collect()
}

/// Looks up a [`Model`] by name, case- and punctuation-insensitively.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownModel`] with up to 3 suggested near
/// matches if `name` does not normalize-match any known model.
pub fn model_by_name(name: &str) -> Result<&'static Model, CatalogError> {
    let key = normalize(name);
    ALL_MODELS
        .iter()
        .find(|m| normalize(m.name) == key)
        .ok_or_else(|| {
            let suggestions = close_matches(&key, ALL_MODELS.iter().map(|m| m.name), 3)
                .into_iter()
                .map(str::to_owned)
                .collect();
            CatalogError::UnknownModel {
                name: name.to_owned(),
                suggestions,
            }
        })
}

/// Looks up a [`Model`] by its USB vendor/product ID pair.
#[must_use]
pub fn model_by_usb_ids(vendor_id: u16, product_id: u16) -> Option<&'static Model> {
    ALL_MODELS
        .iter()
        .find(|m| m.usb_vendor_id == vendor_id && m.usb_product_id == product_id)
}

/// Looks up a [`Model`] by the model-identification byte reported at offset 4
/// of a status reply.
#[must_use]
pub fn model_by_status_code(code: u8) -> Option<&'static Model> {
    ALL_MODELS.iter().find(|m| m.status_code == Some(code))
}

/// Looks up a [`Label`] accepted by `model`, by identifier, case- and
/// punctuation-insensitively.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownLabel`] with up to 3 suggested near
/// matches if `identifier` does not normalize-match any label `model` accepts.
pub fn label_by_identifier(model: &Model, identifier: &str) -> Result<&'static Label, CatalogError> {
    let key = normalize(identifier);
    let labels = model.labels();
    labels
        .iter()
        .find(|l| l.identifiers.iter().any(|id| normalize(id) == key))
        .copied()
        .ok_or_else(|| {
            let all_ids: Vec<&str> = labels.iter().flat_map(|l| l.identifiers.iter().copied()).collect();
            let suggestions = close_matches(&key, all_ids, 3).into_iter().map(str::to_owned).collect();
            CatalogError::UnknownLabel {
                identifier: identifier.to_owned(),
                model: model.name,
                suggestions,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_lookup_is_case_and_punctuation_insensitive() {
        let exact = model_by_name("QL-600").unwrap();
        let loose = model_by_name("ql600").unwrap();
        assert_eq!(exact.name, loose.name);
    }

    #[test]
    fn unknown_model_name_suggests_close_matches() {
        let err = model_by_name("QL-60").unwrap_err();
        match err {
            CatalogError::UnknownModel { suggestions, .. } => {
                assert!(!suggestions.is_empty());
            }
            other => panic!("expected UnknownModel, got {other:?}"),
        }
    }

    #[test]
    fn label_lookup_resolves_alias() {
        let model = model_by_name("QL-600").unwrap();
        let label = label_by_identifier(model, "dk-22205").unwrap();
        assert!(label.identifiers.contains(&"62"));
    }

    #[test]
    fn usb_ids_resolve_to_model() {
        let model = model_by_usb_ids(0x04F9, 0x20C0).unwrap();
        assert_eq!(model.name, "QL-600");
    }
}
