//! JSON action dispatch
//!
//! The only place a JSON request becomes a core call. The `cache` and
//! `validate` CLI subcommands both go through here, so wire names and
//! failure texts are defined once.

use crate::error::{ActionError, ActionResult};
use cplane_patch::{validate_patch, PatchPolicy, ValidationResult};
use chrono::Duration;
use cplane_store::{
    ArtifactStore, KeyExtra, LookupOutcome, Namespace, StoreError, StoreOptions, StoreOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Operations accepted in the `action` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Lookup,
    Store,
    Invalidate,
    Stats,
    Validate,
}

impl Action {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Store => "store",
            Self::Invalidate => "invalidate",
            Self::Stats => "stats",
            Self::Validate => "validate",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lookup" => Ok(Self::Lookup),
            "store" => Ok(Self::Store),
            "invalidate" => Ok(Self::Invalidate),
            "stats" => Ok(Self::Stats),
            "validate" => Ok(Self::Validate),
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }
}

/// One request object: `{action, ...fields}`
///
/// Numeric options and the artifact stay untyped so that a wrong type is
/// treated the way the wire contract says (ignored, or `Missing artifact`)
/// instead of failing the whole parse.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActionRequest {
    pub action: Option<String>,
    pub namespace: Option<String>,
    pub key: Option<Value>,
    pub key_extra: Option<Value>,
    pub ttl_sec: Option<Value>,
    pub max_bytes: Option<Value>,
    pub artifact: Option<Value>,
    pub metadata: Option<Value>,
    pub invalidate_prefix: Option<String>,
    pub patch: Option<String>,
    pub max_change_percent: Option<f64>,
    pub strict: Option<bool>,
}

impl ActionRequest {
    /// Parse a request from raw input text
    ///
    /// # Errors
    /// [`ActionError::EmptyInput`] for blank input, [`ActionError::InvalidJson`]
    /// when the text is not a JSON object of the expected shape.
    pub fn parse(input: &str) -> ActionResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ActionError::EmptyInput);
        }
        serde_json::from_str(input).map_err(ActionError::InvalidJson)
    }

    /// The requested action
    ///
    /// # Errors
    /// [`ActionError::MissingAction`] or [`ActionError::UnknownAction`].
    pub fn action(&self) -> ActionResult<Action> {
        match self.action.as_deref() {
            None | Some("") => Err(ActionError::MissingAction),
            Some(name) => name.parse(),
        }
    }

    fn namespace(&self) -> Namespace {
        Namespace::from_option(self.namespace.as_deref())
    }

    fn key(&self) -> ActionResult<&str> {
        match self.key.as_ref().and_then(Value::as_str) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(StoreError::MissingKey.into()),
        }
    }

    fn key_extra(&self) -> KeyExtra {
        KeyExtra::from_option(self.key_extra.as_ref())
    }

    /// Non-numeric values are ignored; fractional seconds keep millisecond
    /// precision and a TTL too large to represent never expires
    #[allow(clippy::cast_possible_truncation)]
    fn ttl(&self) -> Option<Duration> {
        number(self.ttl_sec.as_ref())
            .and_then(|t| Duration::try_milliseconds((t * 1000.0).round() as i64))
    }

    /// Non-numeric values are ignored; negative limits clamp to zero
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn max_bytes(&self) -> Option<u64> {
        number(self.max_bytes.as_ref()).map(|m| m.max(0.0).floor() as u64)
    }

    fn validate_request(&self) -> ValidateRequest {
        ValidateRequest {
            patch: self.patch.clone(),
            max_change_percent: self.max_change_percent,
            strict: self.strict,
        }
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|n| n.is_finite())
}

/// Classifier request: `{patch, max_change_percent?, strict?}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidateRequest {
    pub patch: Option<String>,
    pub max_change_percent: Option<f64>,
    pub strict: Option<bool>,
}

impl ValidateRequest {
    /// Request for a raw diff, using the base policy
    #[must_use]
    pub fn raw(patch: impl Into<String>) -> Self {
        Self {
            patch: Some(patch.into()),
            ..Self::default()
        }
    }

    /// Parse a request from raw input text
    ///
    /// # Errors
    /// [`ActionError::EmptyInput`] or [`ActionError::InvalidJson`].
    pub fn parse(input: &str) -> ActionResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ActionError::EmptyInput);
        }
        serde_json::from_str(input).map_err(ActionError::InvalidJson)
    }

    /// Run the classifier, request fields overriding `base`
    ///
    /// # Errors
    /// [`ActionError::MissingPatch`] when there is no patch.
    pub fn run(&self, base: PatchPolicy) -> ActionResult<ValidationResult> {
        let patch = self.patch.as_deref().ok_or(ActionError::MissingPatch)?;
        let policy = base.with_overrides(self.max_change_percent, self.strict);
        Ok(validate_patch(patch, &policy))
    }
}

/// Routes requests to the store and the classifier
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: ArtifactStore,
    policy: PatchPolicy,
}

impl Dispatcher {
    /// Dispatcher over `store` with the default patch policy
    #[must_use]
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            policy: PatchPolicy::default(),
        }
    }

    /// Use `policy` as the base for `validate` requests
    #[must_use]
    pub fn with_policy(mut self, policy: PatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Parse `input` and dispatch it
    ///
    /// # Errors
    /// Any [`ActionError`]; render it with [`ActionError::envelope`].
    pub fn handle_json(&self, input: &str) -> ActionResult<Value> {
        let request = ActionRequest::parse(input)?;
        self.dispatch(&request)
    }

    /// Run one request, returning the `{ok: true, ...}` payload
    ///
    /// # Errors
    /// Any [`ActionError`]; render it with [`ActionError::envelope`].
    pub fn dispatch(&self, request: &ActionRequest) -> ActionResult<Value> {
        let action = request.action()?;
        tracing::info!(%action, "dispatching action");
        match action {
            Action::Lookup => self.lookup(request),
            Action::Store => self.store_artifact(request),
            Action::Invalidate => self.invalidate(request),
            Action::Stats => self.stats(request),
            Action::Validate => ok_payload(request.validate_request().run(self.policy)?),
        }
    }

    fn lookup(&self, request: &ActionRequest) -> ActionResult<Value> {
        let key = request.key()?;
        let outcome = self
            .store
            .lookup(&request.namespace(), key, &request.key_extra())?;
        Ok(match outcome {
            LookupOutcome::Miss => json!({ "ok": true, "cache_hit": false }),
            LookupOutcome::Expired => json!({ "ok": true, "cache_hit": false, "expired": true }),
            LookupOutcome::Hit(entry) => {
                let entry = serde_json::to_value(&*entry).map_err(StoreError::Encode)?;
                json!({ "ok": true, "cache_hit": true, "entry": entry })
            }
        })
    }

    fn store_artifact(&self, request: &ActionRequest) -> ActionResult<Value> {
        let key = request.key()?;
        let Some(Value::String(artifact)) = &request.artifact else {
            return Err(StoreError::MissingArtifact.into());
        };
        let options = StoreOptions {
            ttl: request.ttl(),
            max_bytes: request.max_bytes(),
            metadata: request.metadata.clone(),
        };

        match self.store.store(
            &request.namespace(),
            key,
            &request.key_extra(),
            artifact.clone(),
            options,
        )? {
            StoreOutcome::Stored(receipt) => {
                let mut payload = ok_payload(receipt)?;
                payload["stored"] = Value::Bool(true);
                Ok(payload)
            }
            StoreOutcome::TooLarge { bytes, max_bytes } => {
                Err(ActionError::ArtifactTooLarge { bytes, max_bytes })
            }
        }
    }

    fn invalidate(&self, request: &ActionRequest) -> ActionResult<Value> {
        let report = self
            .store
            .invalidate(&request.namespace(), request.invalidate_prefix.as_deref())?;
        ok_payload(report)
    }

    fn stats(&self, request: &ActionRequest) -> ActionResult<Value> {
        ok_payload(self.store.stats(&request.namespace())?)
    }
}

/// Serialize `payload` as an object with `ok: true` added
fn ok_payload<T: Serialize>(payload: T) -> ActionResult<Value> {
    let value = serde_json::to_value(payload).map_err(StoreError::Encode)?;
    let mut out = Map::new();
    out.insert("ok".to_string(), Value::Bool(true));
    if let Value::Object(fields) = value {
        out.extend(fields);
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_round_trip() {
        for action in [
            Action::Lookup,
            Action::Store,
            Action::Invalidate,
            Action::Stats,
            Action::Validate,
        ] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!(matches!(
            "purge".parse::<Action>(),
            Err(ActionError::UnknownAction(name)) if name == "purge"
        ));
    }

    #[test]
    fn blank_and_malformed_input() {
        assert!(matches!(ActionRequest::parse(" \n\t"), Err(ActionError::EmptyInput)));
        assert!(matches!(ActionRequest::parse("{nope"), Err(ActionError::InvalidJson(_))));
        assert!(matches!(ActionRequest::parse("[1, 2]"), Err(ActionError::InvalidJson(_))));
    }

    #[test]
    fn missing_action() {
        let req = ActionRequest::parse(r#"{"key": "k"}"#).unwrap();
        assert!(matches!(req.action(), Err(ActionError::MissingAction)));
        let req = ActionRequest::parse(r#"{"action": ""}"#).unwrap();
        assert!(matches!(req.action(), Err(ActionError::MissingAction)));
    }

    #[test]
    fn numeric_options_are_lenient() {
        let req = ActionRequest::parse(
            r#"{"action": "store", "ttl_sec": 1.2, "max_bytes": "big"}"#,
        )
        .unwrap();
        assert_eq!(req.ttl(), Some(Duration::milliseconds(1_200)));
        assert_eq!(req.max_bytes(), None);

        let req = ActionRequest::parse(r#"{"action": "store", "max_bytes": -5}"#).unwrap();
        assert_eq!(req.max_bytes(), Some(0));
    }

    #[test]
    fn key_must_be_non_empty_string() {
        for body in [r#"{"key": ""}"#, r#"{"key": 7}"#, r"{}"] {
            let req = ActionRequest::parse(body).unwrap();
            assert!(matches!(req.key(), Err(ActionError::Store(StoreError::MissingKey))));
        }
    }

    #[test]
    fn ok_payload_prepends_ok() {
        let v = ok_payload(json!({ "deleted": 3 })).unwrap();
        assert_eq!(v, json!({ "ok": true, "deleted": 3 }));
    }

    #[test]
    fn validate_request_overrides_base() {
        let patch = "--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n ctx\n-x(); // a\n+x(); // b\n";
        let req = ValidateRequest {
            patch: Some(patch.to_string()),
            max_change_percent: Some(500.0),
            strict: Some(false),
        };
        assert!(req.run(PatchPolicy::default()).unwrap().valid);
        assert!(!ValidateRequest::raw(patch).run(PatchPolicy::default()).unwrap().valid);
        assert!(matches!(
            ValidateRequest::default().run(PatchPolicy::default()),
            Err(ActionError::MissingPatch)
        ));
    }
}
