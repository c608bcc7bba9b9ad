//! Per-building registry of applied and dismissed suggestions with a version clock.
//!
//! Owned by the composition root and shared by reference (or `Arc`). Building
//! state is created on the first mutation; reads of an unknown building see an
//! empty registry at version 0. Each building has its own lock, so mutations on
//! different buildings never wait on each other, while an apply or dismiss on one
//! building runs check, update and version bump as one unit.

use super::{infer_params, AppliedAction, SuggestionPayload};
use crate::error::ValidationError;
use crate::suggestions::{content_hash, Params};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::info;

/// Hash scheme used when a payload carries no identity of its own
const PAYLOAD_HASH_VERSION: u32 = 1;

#[derive(Debug, Default)]
struct BuildingActions {
    applied: HashMap<String, AppliedAction>,
    dismissed_ids: HashSet<String>,
    dismissed_keys: HashSet<String>,
    version: u64,
}

impl BuildingActions {
    fn suppresses(&self, id: &str, dedupe_key: &str) -> bool {
        if !id.is_empty() && (self.applied.contains_key(id) || self.dismissed_ids.contains(id)) {
            return true;
        }
        !dedupe_key.is_empty()
            && (self.dismissed_keys.contains(dedupe_key)
                || self.applied.values().any(|a| a.dedupe_key == dedupe_key))
    }
}

fn lock(state: &Mutex<BuildingActions>) -> MutexGuard<'_, BuildingActions> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn payload_params(payload: &SuggestionPayload) -> Params {
    payload
        .params
        .clone()
        .unwrap_or_else(|| infer_params(&payload.kind, &payload.description))
}

/// Dedupe key and signature from the payload, or hashed from its content.
fn similarity(payload: &SuggestionPayload, params: &Params) -> (String, String) {
    let dedupe_key = match payload.dedupe_key.as_deref() {
        Some(k) if !k.is_empty() => k.to_string(),
        _ => content_hash(PAYLOAD_HASH_VERSION, &payload.kind, params, None, None),
    };
    let signature = match payload.signature.as_deref() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => content_hash(
            PAYLOAD_HASH_VERSION,
            &payload.kind,
            params,
            None,
            Some(&payload.description),
        ),
    };
    (dedupe_key, signature)
}

#[derive(Default)]
pub struct ActionRegistry {
    buildings: RwLock<HashMap<String, Arc<Mutex<BuildingActions>>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, building_id: &str) -> Option<Arc<Mutex<BuildingActions>>> {
        let map = self.buildings.read().unwrap_or_else(PoisonError::into_inner);
        map.get(building_id).cloned()
    }

    fn state(&self, building_id: &str) -> Arc<Mutex<BuildingActions>> {
        if let Some(state) = self.existing(building_id) {
            return state;
        }
        let mut map = self.buildings.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(building_id.to_string()).or_default().clone()
    }

    /// Read-only view; unknown buildings yield `R::default()` without being created.
    fn view<R: Default>(&self, building_id: &str, f: impl FnOnce(&BuildingActions) -> R) -> R {
        match self.existing(building_id) {
            Some(state) => {
                let s = lock(&state);
                f(&*s)
            }
            None => R::default(),
        }
    }

    /// Mark a suggestion applied, clearing any dismissal of it or its dedupe key.
    /// Re-applying the same id overwrites the record.
    pub fn apply(&self, building_id: &str, payload: &SuggestionPayload) -> Result<AppliedAction, ValidationError> {
        if building_id.is_empty() {
            return Err(ValidationError::MissingBuildingId);
        }
        if payload.id.is_empty() {
            return Err(ValidationError::MissingSuggestionId);
        }

        let params = payload_params(payload);
        let (dedupe_key, signature) = similarity(payload, &params);
        let action = AppliedAction {
            id: payload.id.clone(),
            kind: payload.kind.clone(),
            description: payload.description.clone(),
            estimated_savings_kwh: payload.estimated_savings_kwh,
            comfort_risk: payload.comfort_risk.unwrap_or_default(),
            applied_at: Utc::now(),
            params,
            dedupe_key,
            signature,
        };

        let state = self.state(building_id);
        let mut s = lock(&state);
        s.dismissed_ids.remove(&action.id);
        s.dismissed_keys.remove(&action.dedupe_key);
        s.applied.insert(action.id.clone(), action.clone());
        s.version += 1;
        info!(building_id, suggestion_id = %action.id, version = s.version, "suggestion applied");
        Ok(action)
    }

    /// Mark a suggestion dismissed. With a payload, its dedupe key is dismissed too,
    /// which suppresses near-identical regenerations.
    pub fn dismiss(
        &self,
        building_id: &str,
        suggestion_id: &str,
        payload: Option<&SuggestionPayload>,
    ) -> Result<(), ValidationError> {
        if building_id.is_empty() {
            return Err(ValidationError::MissingBuildingId);
        }
        if suggestion_id.is_empty() {
            return Err(ValidationError::MissingSuggestionId);
        }
        let dedupe_key = payload.map(|p| similarity(p, &payload_params(p)).0);

        let state = self.state(building_id);
        let mut s = lock(&state);
        s.applied.remove(suggestion_id);
        s.dismissed_ids.insert(suggestion_id.to_string());
        if let Some(key) = dedupe_key {
            s.dismissed_keys.insert(key);
        }
        s.version += 1;
        info!(building_id, suggestion_id, version = s.version, "suggestion dismissed");
        Ok(())
    }

    /// True when the suggestion, or a sibling sharing its dedupe key, is applied or dismissed.
    pub fn should_suppress(&self, building_id: &str, payload: &SuggestionPayload) -> bool {
        let Some(state) = self.existing(building_id) else {
            return false;
        };
        let (dedupe_key, _) = similarity(payload, &payload_params(payload));
        let s = lock(&state);
        s.suppresses(&payload.id, &dedupe_key)
    }

    /// Applied actions ordered by `applied_at`, then id.
    pub fn get_applied(&self, building_id: &str) -> Vec<AppliedAction> {
        let mut applied: Vec<AppliedAction> = self.view(building_id, |s| s.applied.values().cloned().collect());
        applied.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then_with(|| a.id.cmp(&b.id)));
        applied
    }

    pub fn get_version(&self, building_id: &str) -> u64 {
        self.view(building_id, |s| s.version)
    }

    pub fn is_applied(&self, building_id: &str, suggestion_id: &str) -> bool {
        self.view(building_id, |s| s.applied.contains_key(suggestion_id))
    }

    pub fn is_dismissed(&self, building_id: &str, suggestion_id: &str) -> bool {
        self.view(building_id, |s| s.dismissed_ids.contains(suggestion_id))
    }

    /// Dismissed suggestion ids, sorted.
    pub fn dismissed_ids(&self, building_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self.view(building_id, |s| s.dismissed_ids.iter().cloned().collect());
        ids.sort();
        ids
    }

    /// Dismissed dedupe keys, sorted.
    pub fn dismissed_keys(&self, building_id: &str) -> Vec<String> {
        let mut keys: Vec<String> = self.view(building_id, |s| s.dismissed_keys.iter().cloned().collect());
        keys.sort();
        keys
    }
}
