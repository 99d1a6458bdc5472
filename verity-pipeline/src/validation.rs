//! Commit-order validation for `observe`/`assume` (spec §4.3: "order matters").

use verity_core::constants::{MAX_CONDITION_CHARS, MAX_CONTENT_CHARS, MAX_TAGS_SERIALIZED_CHARS};
use verity_core::errors::{VerityError, VerityResult};
use verity_core::traits::EntityStore;

use crate::write_pipeline::ObserveRequest;

pub fn validate_observe_request(req: &ObserveRequest, store: &dyn EntityStore) -> VerityResult<()> {
    validate_content(&req.content)?;
    validate_origin(req)?;
    validate_time_bound(req)?;
    validate_derived_from_exists(req, store)?;
    validate_field_lengths(req)?;
    Ok(())
}

fn validate_content(content: &str) -> VerityResult<()> {
    if content.is_empty() {
        return Err(VerityError::validation("content must not be empty"));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(VerityError::validation(format!(
            "content exceeds {MAX_CONTENT_CHARS} characters"
        )));
    }
    Ok(())
}

/// Exactly one origin rule: a `source` xor a non-empty `derived_from`.
fn validate_origin(req: &ObserveRequest) -> VerityResult<()> {
    let has_source = req.source.as_ref().is_some_and(|s| !s.is_empty());
    let has_derived = req.derived_from.as_ref().is_some_and(|d| !d.is_empty());
    if has_source == has_derived {
        return Err(VerityError::validation(
            "exactly one of `source` or a non-empty `derived_from` is required",
        ));
    }
    Ok(())
}

fn validate_time_bound(req: &ObserveRequest) -> VerityResult<()> {
    if req.resolves_by.is_some() && req.outcome_condition.is_none() {
        return Err(VerityError::validation(
            "`outcome_condition` is required when `resolves_by` is set",
        ));
    }
    Ok(())
}

fn validate_derived_from_exists(req: &ObserveRequest, store: &dyn EntityStore) -> VerityResult<()> {
    let Some(parents) = req.derived_from.as_ref() else {
        return Ok(());
    };
    for parent_id in parents {
        match store.get_memory(parent_id)? {
            None => return Err(VerityError::validation(format!("derived_from parent not found: {parent_id}"))),
            Some(m) if m.retracted => {
                return Err(VerityError::validation(format!("derived_from parent is retracted: {parent_id}")))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn validate_field_lengths(req: &ObserveRequest) -> VerityResult<()> {
    let tags_serialized = serde_json::to_string(&req.tags).unwrap_or_default();
    if tags_serialized.len() > MAX_TAGS_SERIALIZED_CHARS {
        return Err(VerityError::validation(format!(
            "tags exceed {MAX_TAGS_SERIALIZED_CHARS} serialized characters"
        )));
    }
    for condition in req.invalidates_if.iter().chain(req.confirms_if.iter()) {
        if condition.chars().count() > MAX_CONDITION_CHARS {
            return Err(VerityError::validation(format!(
                "condition exceeds {MAX_CONDITION_CHARS} characters: {condition:.40}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_storage::StorageEngine;

    fn base_request() -> ObserveRequest {
        ObserveRequest {
            content: "revenue rose 5% YoY".to_string(),
            source: Some("market".to_string()),
            derived_from: None,
            invalidates_if: vec![],
            confirms_if: vec![],
            assumes: vec![],
            resolves_by: None,
            outcome_condition: None,
            tags: vec![],
            session_id: None,
            agent_id: None,
        }
    }

    #[test]
    fn rejects_empty_content() {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut req = base_request();
        req.content = String::new();
        assert!(validate_observe_request(&req, &store).is_err());
    }

    #[test]
    fn rejects_content_over_limit() {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut req = base_request();
        req.content = "a".repeat(MAX_CONTENT_CHARS + 1);
        assert!(validate_observe_request(&req, &store).is_err());
    }

    #[test]
    fn accepts_content_at_exact_limit() {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut req = base_request();
        req.content = "a".repeat(MAX_CONTENT_CHARS);
        assert!(validate_observe_request(&req, &store).is_ok());
    }

    #[test]
    fn rejects_both_source_and_derived_from() {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut req = base_request();
        req.derived_from = Some(vec!["p1".to_string()]);
        assert!(validate_observe_request(&req, &store).is_err());
    }

    #[test]
    fn rejects_neither_source_nor_derived_from() {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut req = base_request();
        req.source = None;
        assert!(validate_observe_request(&req, &store).is_err());
    }

    #[test]
    fn rejects_resolves_by_without_outcome_condition() {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut req = base_request();
        req.resolves_by = Some(chrono::Utc::now());
        assert!(validate_observe_request(&req, &store).is_err());
    }

    #[test]
    fn rejects_missing_derived_from_parent() {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut req = base_request();
        req.source = None;
        req.derived_from = Some(vec!["ghost".to_string()]);
        assert!(validate_observe_request(&req, &store).is_err());
    }
}
