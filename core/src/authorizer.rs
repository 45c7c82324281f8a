//! Capability checks for privileged economy operations
//!
//! Role storage lives outside the engines; they only ever ask an
//! `Authorizer` whether a principal may act. `RoleTable` is the reference
//! implementation with the creator/minter split plus admin roles that
//! manage each grant list.

use crate::error::{EconomyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// May create scenes, partitions and box definitions
    Creator,
    /// May mint box tokens (storefronts, drops)
    Minter,
    CreatorAdmin,
    MinterAdmin,
}

impl Capability {
    /// The capability that administers grants of `self`.
    pub fn admin(&self) -> Capability {
        match self {
            Capability::Creator => Capability::CreatorAdmin,
            Capability::Minter => Capability::MinterAdmin,
            Capability::CreatorAdmin => Capability::CreatorAdmin,
            Capability::MinterAdmin => Capability::MinterAdmin,
        }
    }
}

pub trait Authorizer {
    fn check(&self, capability: Capability, principal: &str) -> bool;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleTable {
    grants: HashMap<Capability, HashSet<String>>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose `owner` holds every capability, including the admin ones.
    pub fn with_owner(owner: &str) -> Self {
        let mut table = Self::new();
        for capability in [
            Capability::Creator,
            Capability::Minter,
            Capability::CreatorAdmin,
            Capability::MinterAdmin,
        ] {
            table
                .grants
                .entry(capability)
                .or_default()
                .insert(owner.to_string());
        }
        table
    }

    pub fn grant(
        &mut self,
        admin: &str,
        capability: Capability,
        principal: &str,
    ) -> Result<()> {
        if !self.check(capability.admin(), admin) {
            return Err(EconomyError::Capability(format!(
                "{} cannot grant {:?}",
                admin, capability
            )));
        }
        self.grants
            .entry(capability)
            .or_default()
            .insert(principal.to_string());
        Ok(())
    }

    pub fn revoke(
        &mut self,
        admin: &str,
        capability: Capability,
        principal: &str,
    ) -> Result<()> {
        if !self.check(capability.admin(), admin) {
            return Err(EconomyError::Capability(format!(
                "{} cannot revoke {:?}",
                admin, capability
            )));
        }
        if let Some(holders) = self.grants.get_mut(&capability) {
            holders.remove(principal);
        }
        Ok(())
    }

    pub fn holder_count(&self, capability: Capability) -> usize {
        self.grants
            .get(&capability)
            .map(|holders| holders.len())
            .unwrap_or(0)
    }
}

impl Authorizer for RoleTable {
    fn check(&self, capability: Capability, principal: &str) -> bool {
        self.grants
            .get(&capability)
            .map(|holders| holders.contains(principal))
            .unwrap_or(false)
    }
}
