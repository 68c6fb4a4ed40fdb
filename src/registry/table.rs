//! Per-family operator tables.

use super::types::{OperatorDescriptor, OperatorFamily};
use crate::problem::ProblemFamily;
use std::collections::BTreeMap;
use thiserror::Error;

/// Registration failures, detected once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("operator key must not be empty")]
    EmptyKey,
    #[error("{family} operator '{key}' registered twice")]
    DuplicateKey { family: OperatorFamily, key: String },
    #[error("default repair '{0}' is not a registered repair operator")]
    UnknownDefaultRepair(String),
}

/// Read-only name → operator map for one problem family.
///
/// Keys are kept sorted so pool enumeration, and therefore every seeded
/// draw from a pool, is independent of registration order.
#[derive(Debug)]
pub struct OperatorRegistry {
    problem_family: ProblemFamily,
    pools: BTreeMap<OperatorFamily, BTreeMap<String, OperatorDescriptor>>,
    default_repair: Option<String>,
}

impl OperatorRegistry {
    pub fn builder(problem_family: ProblemFamily) -> RegistryBuilder {
        RegistryBuilder::new(problem_family)
    }

    pub fn problem_family(&self) -> ProblemFamily {
        self.problem_family
    }

    /// Sorted keys of one pool.
    pub fn keys(&self, family: OperatorFamily) -> Vec<&str> {
        self.pools
            .get(&family)
            .map(|pool| pool.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, family: OperatorFamily, key: &str) -> bool {
        self.get(family, key).is_some()
    }

    pub fn get(&self, family: OperatorFamily, key: &str) -> Option<&OperatorDescriptor> {
        self.pools.get(&family).and_then(|pool| pool.get(key))
    }

    pub fn pool_len(&self, family: OperatorFamily) -> usize {
        self.pools.get(&family).map_or(0, BTreeMap::len)
    }

    /// The repair invoked by `Repair` nodes without a key.
    pub fn default_repair(&self) -> Option<(&str, &OperatorDescriptor)> {
        let key = self.default_repair.as_deref()?;
        self.get(OperatorFamily::Repair, key).map(|d| (key, d))
    }
}

/// Collects operators before freezing them into an [`OperatorRegistry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    problem_family: ProblemFamily,
    pools: BTreeMap<OperatorFamily, BTreeMap<String, OperatorDescriptor>>,
    default_repair: Option<String>,
}

impl RegistryBuilder {
    pub fn new(problem_family: ProblemFamily) -> Self {
        Self {
            problem_family,
            pools: BTreeMap::new(),
            default_repair: None,
        }
    }

    pub fn register(
        &mut self,
        family: OperatorFamily,
        key: &str,
        descriptor: OperatorDescriptor,
    ) -> Result<&mut Self, RegistryError> {
        if key.is_empty() {
            return Err(RegistryError::EmptyKey);
        }
        let pool = self.pools.entry(family).or_default();
        if pool.contains_key(key) {
            return Err(RegistryError::DuplicateKey {
                family,
                key: key.to_string(),
            });
        }
        pool.insert(key.to_string(), descriptor);
        Ok(self)
    }

    pub fn default_repair(&mut self, key: &str) -> &mut Self {
        self.default_repair = Some(key.to_string());
        self
    }

    pub fn build(self) -> Result<OperatorRegistry, RegistryError> {
        if let Some(key) = &self.default_repair {
            let known = self
                .pools
                .get(&OperatorFamily::Repair)
                .is_some_and(|pool| pool.contains_key(key));
            if !known {
                return Err(RegistryError::UnknownDefaultRepair(key.clone()));
            }
        }
        Ok(OperatorRegistry {
            problem_family: self.problem_family,
            pools: self.pools,
            default_repair: self.default_repair,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Problem, Solution};
    use crate::random::{create_rng, GaaRng};
    use crate::registry::{OpParams, OperatorFault};

    fn identity(
        _p: &Problem,
        s: &Solution,
        _params: &OpParams,
        _rng: &mut GaaRng,
    ) -> Result<Solution, OperatorFault> {
        Ok(s.clone())
    }

    fn failing(
        _p: &Problem,
        _s: &Solution,
        _params: &OpParams,
        _rng: &mut GaaRng,
    ) -> Result<Solution, OperatorFault> {
        Err(OperatorFault::new("boom"))
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut b = RegistryBuilder::new(ProblemFamily::Knapsack);
        b.register(OperatorFamily::LocalSearch, "zeta", OperatorDescriptor::new(identity))
            .unwrap()
            .register(OperatorFamily::LocalSearch, "alpha", OperatorDescriptor::new(identity))
            .unwrap();
        let r = b.build().unwrap();
        assert_eq!(r.keys(OperatorFamily::LocalSearch), vec!["alpha", "zeta"]);
        assert!(r.keys(OperatorFamily::Perturbation).is_empty());
        assert_eq!(r.pool_len(OperatorFamily::LocalSearch), 2);
    }

    #[test]
    fn test_duplicate_and_empty_keys() {
        let mut b = RegistryBuilder::new(ProblemFamily::Knapsack);
        b.register(OperatorFamily::Constructive, "g", OperatorDescriptor::new(identity))
            .unwrap();
        let err = b
            .register(OperatorFamily::Constructive, "g", OperatorDescriptor::new(identity))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKey { .. }));
        assert_eq!(
            b.register(OperatorFamily::Repair, "", OperatorDescriptor::new(identity))
                .unwrap_err(),
            RegistryError::EmptyKey
        );
        // same key in another pool is fine
        assert!(b
            .register(OperatorFamily::Repair, "g", OperatorDescriptor::new(identity))
            .is_ok());
    }

    #[test]
    fn test_default_repair_must_exist() {
        let mut b = RegistryBuilder::new(ProblemFamily::Knapsack);
        b.default_repair("fix");
        assert_eq!(
            b.build().unwrap_err(),
            RegistryError::UnknownDefaultRepair("fix".into())
        );

        let mut b = RegistryBuilder::new(ProblemFamily::Knapsack);
        b.register(OperatorFamily::Repair, "fix", OperatorDescriptor::new(identity))
            .unwrap()
            .default_repair("fix");
        let r = b.build().unwrap();
        assert_eq!(r.default_repair().map(|(k, _)| k), Some("fix"));
    }

    #[test]
    fn test_descriptor_apply() {
        let p = Problem::knapsack("k", 5, &[(3, 2)]).unwrap();
        let s = Solution::empty(&p);
        let mut rng = create_rng(1);
        let ok = OperatorDescriptor::new(identity).with_stochastic(true);
        assert!(ok.is_stochastic());
        assert!(!ok.may_return_infeasible());
        assert_eq!(ok.apply(&p, &s, &OpParams::default(), &mut rng).unwrap(), s);
        let bad = OperatorDescriptor::new(failing);
        assert_eq!(
            bad.apply(&p, &s, &OpParams::default(), &mut rng),
            Err(OperatorFault::new("boom"))
        );
    }
}
