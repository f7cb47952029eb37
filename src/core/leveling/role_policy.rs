// Role policy - maps cumulative XP onto one tier role.
//
// This is PURE business logic. It never talks to Discord; the tier sync in
// `xp_service` asks it what to do and then performs the role calls itself.

use thiserror::Error;

/// A named badge unlocked at a cumulative XP threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTier {
    pub threshold: u64,
    pub label: String,
}

impl RoleTier {
    pub fn new(threshold: u64, label: impl Into<String>) -> Self {
        Self {
            threshold,
            label: label.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RolePolicyError {
    #[error("Role table must not be empty")]
    Empty,

    #[error("Thresholds must be strictly increasing ({previous} then {next})")]
    NotIncreasing { previous: u64, next: u64 },
}

/// What the tier sync has to do for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierPlan {
    /// Below the lowest threshold: leave their roles alone.
    NoTier,
    /// They already hold the role they qualify for.
    AlreadyHeld,
    /// Remove `revoke`, then add `assign`.
    Assign { assign: String, revoke: Vec<String> },
}

/// The community's tier table, lowest first.
pub fn default_tiers() -> Vec<RoleTier> {
    vec![
        RoleTier::new(100, "🏑 Rookie"),
        RoleTier::new(500, "🥉 Member"),
        RoleTier::new(1000, "🏅 Local Leader"),
        RoleTier::new(2000, "🏇 Core Leader"),
        RoleTier::new(3500, "🏆 Mentor"),
    ]
}

/// The immutable threshold table.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    tiers: Vec<RoleTier>,
}

impl RolePolicy {
    /// Build a policy, rejecting tables whose thresholds don't strictly increase.
    pub fn new(tiers: Vec<RoleTier>) -> Result<Self, RolePolicyError> {
        if tiers.is_empty() {
            return Err(RolePolicyError::Empty);
        }
        for pair in tiers.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(RolePolicyError::NotIncreasing {
                    previous: pair[0].threshold,
                    next: pair[1].threshold,
                });
            }
        }
        Ok(Self { tiers })
    }

    /// Highest tier whose threshold is <= `xp`.
    ///
    /// Walks the table in ascending order and keeps the last match, so the
    /// table order is the only thing that ranks the labels.
    pub fn resolve_role(&self, xp: u64) -> Option<&RoleTier> {
        let mut found = None;
        for tier in &self.tiers {
            if xp >= tier.threshold {
                found = Some(tier);
            }
        }
        found
    }

    /// Tier labels the member holds that are not `target`.
    pub fn roles_to_revoke<S: AsRef<str>>(&self, current_roles: &[S], target: &str) -> Vec<String> {
        self.tiers
            .iter()
            .filter(|tier| tier.label != target)
            .filter(|tier| current_roles.iter().any(|r| r.as_ref() == tier.label))
            .map(|tier| tier.label.clone())
            .collect()
    }

    /// Decide what to do for a member with `xp` who currently holds `current_roles`.
    pub fn plan<S: AsRef<str>>(&self, xp: u64, current_roles: &[S]) -> TierPlan {
        let Some(target) = self.resolve_role(xp) else {
            return TierPlan::NoTier;
        };
        if current_roles.iter().any(|r| r.as_ref() == target.label) {
            return TierPlan::AlreadyHeld;
        }
        TierPlan::Assign {
            assign: target.label.clone(),
            revoke: self.roles_to_revoke(current_roles, &target.label),
        }
    }
}
