//! Value Computation Module
//!
//! Caller-supplied capabilities attached to a cache at construction time:
//! computing missing values and verifying cached ones. Both are optional;
//! absence is modeled as `Option<Arc<dyn ...>>` on the cache, not as a
//! sentinel implementation.

use anyhow::Result;

// == Value Computer ==
/// Computes a value when it is not found in a cache.
///
/// Returning `Ok(None)` means no value could be computed for the key; the
/// cache then reports a plain miss without storing anything. Errors are
/// propagated to the caller of `get` as a computation failure.
///
/// Implemented for any matching `Fn` closure.
pub trait ValueComputer<K, V>: Send + Sync {
    /// Computes the value for the given key.
    fn compute(&self, key: &K) -> Result<Option<V>>;
}

impl<K, V, F> ValueComputer<K, V> for F
where
    F: Fn(&K) -> Result<Option<V>> + Send + Sync,
{
    fn compute(&self, key: &K) -> Result<Option<V>> {
        self(key)
    }
}

// == Value Verifier ==
/// Checks whether a cached value is still valid before it is returned.
///
/// Values are not verified on every read but once their verification
/// interval has elapsed. A `false` result drops the entry from the cache.
///
/// Implemented for any matching `Fn` closure.
pub trait ValueVerifier<V>: Send + Sync {
    /// Verifies the given value.
    fn valid(&self, value: &V) -> Result<bool>;
}

impl<V, F> ValueVerifier<V> for F
where
    F: Fn(&V) -> Result<bool> + Send + Sync,
{
    fn valid(&self, value: &V) -> Result<bool> {
        self(value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_as_computer() {
        let computer = |key: &String| Ok(Some(key.to_uppercase()));

        let value = ValueComputer::compute(&computer, &"key".to_string()).unwrap();
        assert_eq!(value, Some("KEY".to_string()));
    }

    #[test]
    fn test_computer_may_return_absent() {
        let computer = |key: &String| {
            if key.is_empty() {
                Ok(None)
            } else {
                Ok(Some(key.clone()))
            }
        };

        assert_eq!(ValueComputer::compute(&computer, &String::new()).unwrap(), None);
        assert!(ValueComputer::compute(&computer, &"x".to_string())
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_computer_error_propagates() {
        let computer = |_key: &String| -> Result<Option<String>> {
            Err(anyhow::anyhow!("backend unavailable"))
        };

        assert!(ValueComputer::compute(&computer, &"key".to_string()).is_err());
    }

    #[test]
    fn test_closure_as_verifier() {
        let verifier = |value: &u32| Ok(*value < 100);

        assert!(ValueVerifier::valid(&verifier, &42).unwrap());
        assert!(!ValueVerifier::valid(&verifier, &200).unwrap());
    }
}
