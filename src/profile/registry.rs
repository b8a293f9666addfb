//! Global profile registry
//!
//! Profiles are registered once, usually at startup, and looked up by
//! id whenever a client is built. The registry ships with the strict
//! `openai` profile; custom targets are registered by the host.

use std::collections::HashMap;

use crate::error::GenError;
use crate::profile::ProviderProfile;

/// Keyed store of provider profiles
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<String, ProviderProfile>,
}

impl ProfileRegistry {
    /// Create a registry populated with the built-in profiles.
    pub fn new() -> Self {
        let mut registry = Self {
            profiles: HashMap::new(),
        };
        registry.register_builtin_profiles();
        registry
    }

    fn register_builtin_profiles(&mut self) {
        let openai = ProviderProfile::openai();
        self.profiles.insert(openai.id.clone(), openai);
    }

    /// Get a profile by id.
    pub fn get(&self, id: &str) -> Option<&ProviderProfile> {
        self.profiles.get(id)
    }

    /// Register a profile, replacing any existing one with the same id.
    ///
    /// The profile is validated first; invalid profiles are rejected
    /// rather than poisoning later lookups.
    pub fn register(&mut self, profile: ProviderProfile) -> Result<(), GenError> {
        profile.validate()?;
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// List all registered profile ids.
    pub fn list(&self) -> Vec<&str> {
        self.profiles.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Global registry instance
lazy_static::lazy_static! {
    pub static ref PROFILE_REGISTRY: std::sync::Mutex<ProfileRegistry> =
        std::sync::Mutex::new(ProfileRegistry::new());
}

/// Look up a profile in the global registry, cloning it out so no lock
/// is held by the caller.
pub fn profile(id: &str) -> Result<ProviderProfile, GenError> {
    PROFILE_REGISTRY
        .lock()
        .map_err(|_| GenError::ConfigurationError("failed to lock profile registry".to_string()))?
        .get(id)
        .cloned()
        .ok_or_else(|| GenError::ConfigurationError(format!("unknown provider profile: {id}")))
}

/// Register a profile in the global registry.
pub fn register_profile(profile: ProviderProfile) -> Result<(), GenError> {
    PROFILE_REGISTRY
        .lock()
        .map_err(|_| GenError::ConfigurationError("failed to lock profile registry".to_string()))?
        .register(profile)
}
