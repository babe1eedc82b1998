//! Project member directory with a simulated, occasionally failing remove call.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

pub const REMOVE_FAILURE_PROBABILITY: f64 = 0.1;
pub const REMOVE_LATENCY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemberRole {
    Owner,
    Participant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    #[error("member not found: {0}")]
    NotFound(String),
    #[error("the project owner cannot be removed")]
    OwnerRemoval,
    #[error("failed to remove {name}. Please try again.")]
    Network { name: String },
}

/// Decides whether a simulated remove request fails.
#[derive(Debug)]
pub enum FailurePolicy {
    RandomFailure { probability: f64, rng: StdRng },
    NeverFail,
}

impl FailurePolicy {
    pub fn random(probability: f64) -> Self {
        Self::RandomFailure {
            probability: probability.clamp(0.0, 1.0),
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self::RandomFailure {
            probability: probability.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn should_fail(&mut self) -> bool {
        match self {
            Self::RandomFailure { probability, rng } => rng.random_bool(*probability),
            Self::NeverFail => false,
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::random(REMOVE_FAILURE_PROBABILITY)
    }
}

#[derive(Debug)]
pub struct MemberDirectory {
    members: Vec<ProjectMember>,
    failure: FailurePolicy,
    latency: Duration,
}

impl MemberDirectory {
    pub fn new(members: Vec<ProjectMember>, failure: FailurePolicy) -> Self {
        let mut directory = Self {
            members,
            failure,
            latency: Duration::ZERO,
        };
        directory.sort_owner_first();
        directory
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn sort_owner_first(&mut self) {
        self.members.sort_by_key(|member| member.role);
    }

    pub fn members(&self) -> &[ProjectMember] {
        &self.members
    }

    /// Removes a participant. On failure the directory is left unchanged and
    /// the caller may retry.
    pub fn remove(&mut self, member_id: &str) -> Result<ProjectMember, MemberError> {
        let index = self
            .members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or_else(|| MemberError::NotFound(member_id.to_string()))?;
        if self.members[index].role == MemberRole::Owner {
            return Err(MemberError::OwnerRemoval);
        }

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.failure.should_fail() {
            let name = self.members[index].name.clone();
            tracing::warn!(member_id, %name, "simulated member removal failure");
            return Err(MemberError::Network { name });
        }

        let removed = self.members.remove(index);
        tracing::info!(member_id, name = %removed.name, "member removed from project");
        Ok(removed)
    }
}

pub fn demo_members() -> Vec<ProjectMember> {
    let member = |id: &str, name: &str, email: &str, role| ProjectMember {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
    };
    vec![
        member("u2", "Jamie L", "jamie@labelforge.ai", MemberRole::Participant),
        member("u1", "Alex Kim", "alex@labelforge.ai", MemberRole::Owner),
        member("u3", "Sam R", "sam@labelforge.ai", MemberRole::Participant),
    ]
}
