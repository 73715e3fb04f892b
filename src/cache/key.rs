//! Cache Key Module
//!
//! Derives deterministic cache keys from a computation identity, its call
//! arguments and an optional user scope.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::{request, HeaderMap, Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::cache::float_check::ensure_finite;
use crate::error::{CacheError, Result};

/// Bytes of the SHA-256 digest kept in the base key (32 hex characters).
const KEY_HASH_BYTES: usize = 16;

/// Separator between a base key and its user scope.
pub const USER_KEY_MARKER: &str = ":user=";

/// Builds a computation identity from the calling module path and a name.
///
/// ```
/// let identity = crm_cache::cache_identity!("dashboard_summary");
/// assert!(identity.ends_with("::dashboard_summary"));
/// ```
#[macro_export]
macro_rules! cache_identity {
    ($name:expr) => {
        concat!(module_path!(), "::", $name)
    };
}

// == User Id ==
/// Identifier of the user a cached result belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

// == User Scope ==
/// Anything that can tell which user a call is made for.
pub trait UserScope {
    fn user_id(&self) -> Option<UserId>;
}

impl UserScope for UserId {
    fn user_id(&self) -> Option<UserId> {
        Some(self.clone())
    }
}

impl<T: UserScope> UserScope for Option<T> {
    fn user_id(&self) -> Option<UserId> {
        self.as_ref().and_then(UserScope::user_id)
    }
}

impl<T: UserScope + ?Sized> UserScope for &T {
    fn user_id(&self) -> Option<UserId> {
        (**self).user_id()
    }
}

// == Transport Artifacts ==
/// Marker for per-request transport objects that never take part in a key.
pub trait TransportArtifact {}

impl<B> TransportArtifact for Request<B> {}
impl<B> TransportArtifact for Response<B> {}
impl TransportArtifact for request::Parts {}
impl TransportArtifact for HeaderMap {}

// == Call Args ==
/// Canonicalized arguments of one cached call.
///
/// Values are serialized as they are added. A value that fails to serialize
/// is remembered and reported when the key is derived.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
    user: Option<UserId>,
    error: Option<String>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match canonical_value(value) {
            Ok(value) => self.positional.push(value),
            Err(e) => self.fail(format!("argument {}: {e}", self.positional.len())),
        }
        self
    }

    /// Adds a named argument. Name order never affects the key.
    pub fn named<T: Serialize + ?Sized>(mut self, name: &str, value: &T) -> Self {
        match canonical_value(value) {
            Ok(value) => {
                self.named.insert(name.to_string(), value);
            }
            Err(e) => self.fail(format!("argument `{name}`: {e}")),
        }
        self
    }

    /// Accepts a transport object without letting it influence the key.
    pub fn transport<T: TransportArtifact + ?Sized>(self, _artifact: &T) -> Self {
        self
    }

    /// Attaches the user the call is made for.
    pub fn scope(mut self, scope: &impl UserScope) -> Self {
        self.user = scope.user_id();
        self
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    fn fail(&mut self, reason: String) {
        if self.error.is_none() {
            self.error = Some(reason);
        }
    }

    /// Canonical text of the positional and named arguments.
    fn canonical(&self) -> (String, String) {
        let positional = if self.positional.is_empty() {
            String::new()
        } else {
            Value::Array(self.positional.clone()).to_string()
        };
        let named = if self.named.is_empty() {
            String::new()
        } else {
            let pairs: Vec<Value> = self
                .named
                .iter()
                .map(|(name, value)| Value::Array(vec![Value::String(name.clone()), value.clone()]))
                .collect();
            Value::Array(pairs).to_string()
        };
        (positional, named)
    }
}

/// Renders one argument as JSON, refusing floats JSON would turn into `null`.
fn canonical_value<T: Serialize + ?Sized>(value: &T) -> std::result::Result<Value, String> {
    ensure_finite(value).map_err(|e| e.to_string())?;
    serde_json::to_value(value).map_err(|e| e.to_string())
}

// == Derive Key ==
/// Hashes the identity and arguments into a fixed-length base key.
pub fn base_key(identity: &str, args: &CallArgs) -> Result<String> {
    if let Some(reason) = &args.error {
        return Err(CacheError::KeyDerivation(reason.clone()));
    }

    let (positional, named) = args.canonical();
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(b":");
    hasher.update(positional.as_bytes());
    hasher.update(b":");
    hasher.update(named.as_bytes());
    Ok(hex::encode(&hasher.finalize()[..KEY_HASH_BYTES]))
}

/// Derives the full cache key, suffixed with the user when one is given.
pub fn derive_key(identity: &str, args: &CallArgs, user: Option<&UserId>) -> Result<String> {
    let base = base_key(identity, args)?;
    Ok(match user {
        Some(user) => format!("{base}{USER_KEY_MARKER}{user}"),
        None => base,
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::collections::HashMap;

    const IDENTITY: &str = "crm::clients::list_clients";

    #[test]
    fn test_key_is_deterministic() {
        let args = || CallArgs::new().arg(&10).arg("active").named("page", &2);

        let first = derive_key(IDENTITY, &args(), None).unwrap();
        let second = derive_key(IDENTITY, &args(), None).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), KEY_HASH_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_named_order_does_not_matter() {
        let a = CallArgs::new().named("skip", &0).named("limit", &50);
        let b = CallArgs::new().named("limit", &50).named("skip", &0);

        assert_eq!(
            derive_key(IDENTITY, &a, None).unwrap(),
            derive_key(IDENTITY, &b, None).unwrap()
        );
    }

    #[test]
    fn test_positional_order_matters() {
        let a = CallArgs::new().arg(&1).arg(&2);
        let b = CallArgs::new().arg(&2).arg(&1);

        assert_ne!(
            derive_key(IDENTITY, &a, None).unwrap(),
            derive_key(IDENTITY, &b, None).unwrap()
        );
    }

    #[test]
    fn test_argument_value_changes_key() {
        let a = CallArgs::new().named("status", "won");
        let b = CallArgs::new().named("status", "lost");

        assert_ne!(
            derive_key(IDENTITY, &a, None).unwrap(),
            derive_key(IDENTITY, &b, None).unwrap()
        );
    }

    #[test]
    fn test_non_finite_float_is_not_keyable() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let positional = CallArgs::new().arg(&value);
            let nested = CallArgs::new().named("bounds", &vec![Some(0.5), Some(value)]);

            assert!(matches!(
                derive_key(IDENTITY, &positional, None),
                Err(CacheError::KeyDerivation(_))
            ));
            assert!(matches!(
                derive_key(IDENTITY, &nested, None),
                Err(CacheError::KeyDerivation(_))
            ));
        }

        let none = derive_key(IDENTITY, &CallArgs::new().arg(&None::<f64>), None).unwrap();
        let finite = derive_key(IDENTITY, &CallArgs::new().arg(&0.5f64), None).unwrap();
        assert_ne!(none, finite);
    }

    #[test]
    fn test_identity_changes_key() {
        let args = CallArgs::new().arg(&1);
        assert_ne!(
            derive_key("crm::deals::get", &args, None).unwrap(),
            derive_key("crm::invoices::get", &args, None).unwrap()
        );
    }

    #[test]
    fn test_transport_artifacts_are_ignored() {
        let request = Request::builder().uri("/clients").body(Body::empty()).unwrap();
        let headers = HeaderMap::new();

        let with = CallArgs::new()
            .transport(&request)
            .arg(&5)
            .transport(&headers)
            .named("q", "acme");
        let without = CallArgs::new().arg(&5).named("q", "acme");

        assert_eq!(
            derive_key(IDENTITY, &with, None).unwrap(),
            derive_key(IDENTITY, &without, None).unwrap()
        );
    }

    #[test]
    fn test_user_scope_suffix() {
        let args = CallArgs::new().arg(&"summary");

        let user_42 = derive_key(IDENTITY, &args, Some(&UserId::from(42i64))).unwrap();
        let user_7 = derive_key(IDENTITY, &args, Some(&UserId::from(7i64))).unwrap();
        let base = derive_key(IDENTITY, &args, None).unwrap();

        assert!(user_42.ends_with(":user=42"));
        assert!(user_42.starts_with(&base));
        assert_ne!(user_42, user_7);
    }

    #[test]
    fn test_unserializable_argument_is_key_error() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys cannot become JSON object keys");

        let args = CallArgs::new().arg(&map);
        let result = derive_key(IDENTITY, &args, None);

        assert!(matches!(result, Err(CacheError::KeyDerivation(_))));
    }

    #[test]
    fn test_scope_from_option() {
        let none: Option<UserId> = None;
        assert!(CallArgs::new().scope(&none).user().is_none());

        let some = Some(UserId::from("u-1"));
        assert_eq!(CallArgs::new().scope(&some).user(), Some(&UserId::from("u-1")));
    }

    #[test]
    fn test_identity_macro() {
        let identity = crate::cache_identity!("list_deals");
        assert_eq!(identity, "crm_cache::cache::key::tests::list_deals");
    }
}
