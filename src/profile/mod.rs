//! Provider profiles
//!
//! A [`ProviderProfile`] is the declarative description of one target
//! endpoint: where it lives, how it authenticates, which optional
//! fields each modality accepts, and how free-form values are snapped
//! to the target's discrete sets. The normalizer consults the profile;
//! adding a provider means adding a profile, not a code path.

pub mod registry;

use std::collections::{BTreeMap, BTreeSet};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::GenError;
use crate::types::request::Modality;

/// How a modality's submission endpoint completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CompletionStyle {
    /// The POST response carries the finished payload
    Sync,
    /// The POST response carries a job reference, polled until terminal
    Job {
        /// Status endpoint path under the base URL, with `{id}` standing
        /// in for the job identifier, e.g. `videos/{id}`
        status_template: String,
    },
}

/// A pixel size a target can produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeOption {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Aspect label this size serves, e.g. `16:9`
    pub aspect_ratio: String,
    /// Fallback entry when no requested ratio matches
    #[serde(default)]
    pub is_default: bool,
}

impl SizeOption {
    /// Render as the wire `size` string, `WIDTHxHEIGHT`.
    pub fn to_wire(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Width-over-height as a float, for nearest-ratio comparisons.
    pub fn ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Discrete-value snapping rules for one modality target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantizeRules {
    /// Allowed clip durations in seconds, ascending; `None` means any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durations: Option<Vec<u32>>,
    /// Allowed output sizes; `aspect_ratio` and `resolution` inputs are
    /// resolved against this table into a single `size` field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<SizeOption>,
}

impl QuantizeRules {
    /// Whether no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.durations.is_none() && self.sizes.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// What one target accepts for a single modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalitySupport {
    /// Path under the base URL, e.g. `chat/completions`
    pub endpoint: String,
    /// Whether submissions complete in the response or yield a job
    pub completion: CompletionStyle,
    /// Optional field names this target accepts
    #[serde(default)]
    pub supported: BTreeSet<String>,
    /// Fan-out aliases: a supported field is also emitted under each
    /// alias, for backends that read a different name for the same knob
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Snapping rules for values the target only accepts discretely
    #[serde(default, skip_serializing_if = "QuantizeRules::is_empty")]
    pub quantize: QuantizeRules,
    /// Whether extended fields are merged into the body unfiltered;
    /// when `false` they are subject to the same support filtering as
    /// optional fields
    #[serde(default = "default_true")]
    pub extended_passthrough: bool,
}

impl ModalitySupport {
    /// A support entry accepting only what is explicitly listed later.
    pub fn new(endpoint: impl Into<String>, completion: CompletionStyle) -> Self {
        Self {
            endpoint: endpoint.into(),
            completion,
            supported: BTreeSet::new(),
            aliases: BTreeMap::new(),
            quantize: QuantizeRules::default(),
            extended_passthrough: true,
        }
    }

    /// Whether an optional field is accepted by this target.
    pub fn supports(&self, field: &str) -> bool {
        self.supported.contains(field)
    }

    /// The job status path template, when this target completes
    /// out-of-band.
    pub fn status_template(&self) -> Option<&str> {
        match &self.completion {
            CompletionStyle::Job { status_template } => Some(status_template),
            CompletionStyle::Sync => None,
        }
    }

    fn supporting(mut self, fields: &[&str]) -> Self {
        self.supported.extend(fields.iter().map(|f| (*f).to_string()));
        self
    }

    fn aliased(mut self, canonical: &str, aliases: &[&str]) -> Self {
        self.aliases.insert(
            canonical.to_string(),
            aliases.iter().map(|a| (*a).to_string()).collect(),
        );
        self
    }
}

/// Declarative description of one OpenAI-compatible target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Registry key and log label for this target
    pub id: String,
    /// Base URL endpoints are joined onto, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Bearer token; never serialized back out
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    /// Environment variable consulted for the bearer token when no
    /// explicit key is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Per-modality acceptance rules; an absent modality is unsupported
    pub modalities: BTreeMap<Modality, ModalitySupport>,
}

impl ProviderProfile {
    /// The strict OpenAI target: no diffusion-style extension fields,
    /// video durations snapped to a fixed set, sizes from a fixed table.
    pub fn openai() -> Self {
        let mut modalities = BTreeMap::new();
        modalities.insert(
            Modality::Text,
            ModalitySupport::new("chat/completions", CompletionStyle::Sync).supporting(&[
                "temperature",
                "max_tokens",
                "top_p",
                "frequency_penalty",
                "presence_penalty",
                "stop",
                "seed",
                "response_format",
                "n",
                "logprobs",
                "top_logprobs",
            ]),
        );
        modalities.insert(
            Modality::Image,
            ModalitySupport::new("images/generations", CompletionStyle::Sync)
                .supporting(&["n", "size", "quality", "style", "response_format"]),
        );
        let mut video = ModalitySupport::new(
            "videos/create",
            CompletionStyle::Job {
                status_template: "videos/{id}".to_string(),
            },
        )
        .supporting(&["resolution", "duration", "aspect_ratio", "image_url"]);
        video.quantize = QuantizeRules {
            durations: Some(vec![4, 8, 12]),
            sizes: vec![
                SizeOption {
                    width: 1280,
                    height: 720,
                    aspect_ratio: "16:9".to_string(),
                    is_default: true,
                },
                SizeOption {
                    width: 720,
                    height: 1280,
                    aspect_ratio: "9:16".to_string(),
                    is_default: false,
                },
                SizeOption {
                    width: 1024,
                    height: 1024,
                    aspect_ratio: "1:1".to_string(),
                    is_default: false,
                },
                SizeOption {
                    width: 1024,
                    height: 768,
                    aspect_ratio: "4:3".to_string(),
                    is_default: false,
                },
            ],
        };
        modalities.insert(Modality::Video, video);
        modalities.insert(
            Modality::Speech,
            ModalitySupport::new("audio/speech", CompletionStyle::Sync)
                .supporting(&["response_format", "speed"]),
        );

        Self {
            id: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            modalities,
        }
    }

    /// A permissive profile for self-hosted or aggregator targets that
    /// accept the full parameter vocabulary, including diffusion-style
    /// extension fields with their common alternative names.
    pub fn openai_compatible(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut modalities = BTreeMap::new();
        modalities.insert(
            Modality::Text,
            ModalitySupport::new("chat/completions", CompletionStyle::Sync).supporting(&[
                "temperature",
                "max_tokens",
                "top_p",
                "frequency_penalty",
                "presence_penalty",
                "stop",
                "seed",
                "response_format",
                "n",
                "logprobs",
                "top_logprobs",
            ]),
        );
        modalities.insert(
            Modality::Image,
            ModalitySupport::new("images/generations", CompletionStyle::Sync)
                .supporting(&[
                    "n",
                    "size",
                    "quality",
                    "style",
                    "response_format",
                    "width",
                    "height",
                    "negative_prompt",
                    "guidance_scale",
                    "steps",
                    "seed",
                    "sampler",
                ])
                .aliased("guidance_scale", &["cfg_scale"])
                .aliased("steps", &["num_inference_steps"])
                .aliased("sampler", &["scheduler"]),
        );
        modalities.insert(
            Modality::Video,
            ModalitySupport::new(
                "videos/create",
                CompletionStyle::Job {
                    status_template: "videos/{id}".to_string(),
                },
            )
            .supporting(&[
                "resolution",
                "duration",
                "fps",
                "aspect_ratio",
                "image_url",
                "end_image_url",
                "motion_strength",
                "camera_motion",
                "loop",
                "upscale",
                "negative_prompt",
                "guidance_scale",
                "steps",
                "seed",
            ])
            .aliased("guidance_scale", &["cfg_scale"])
            .aliased("steps", &["num_inference_steps"]),
        );
        modalities.insert(
            Modality::Speech,
            ModalitySupport::new("audio/speech", CompletionStyle::Sync).supporting(&[
                "response_format",
                "speed",
                "pitch",
                "stability",
                "similarity_boost",
                "emotion",
                "language",
            ]),
        );

        Self {
            id: id.into(),
            base_url: base_url.into(),
            api_key: None,
            api_key_env: None,
            modalities,
        }
    }

    /// Attach a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Name the environment variable consulted when no explicit key is set.
    pub fn with_api_key_env(mut self, variable: impl Into<String>) -> Self {
        self.api_key_env = Some(variable.into());
        self
    }

    /// The support entry for a modality, if this target has one.
    pub fn support(&self, modality: Modality) -> Option<&ModalitySupport> {
        self.modalities.get(&modality)
    }

    /// Check structural consistency, returning `ConfigurationError`
    /// on the first problem found.
    pub fn validate(&self) -> Result<(), GenError> {
        if self.id.trim().is_empty() {
            return Err(GenError::ConfigurationError(
                "profile id must not be empty".to_string(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(GenError::ConfigurationError(format!(
                "profile `{}` base_url must start with http:// or https://",
                self.id
            )));
        }
        if self.modalities.is_empty() {
            return Err(GenError::ConfigurationError(format!(
                "profile `{}` declares no modalities",
                self.id
            )));
        }
        for (modality, support) in &self.modalities {
            if support.endpoint.trim().is_empty() {
                return Err(GenError::ConfigurationError(format!(
                    "profile `{}` has an empty {modality} endpoint",
                    self.id
                )));
            }
            if let CompletionStyle::Job { status_template } = &support.completion {
                if !status_template.contains("{id}") {
                    return Err(GenError::ConfigurationError(format!(
                        "profile `{}` {modality} status template must contain `{{id}}`",
                        self.id
                    )));
                }
            }
            if let Some(durations) = &support.quantize.durations {
                if durations.is_empty() {
                    return Err(GenError::ConfigurationError(format!(
                        "profile `{}` lists an empty {modality} duration set",
                        self.id
                    )));
                }
            }
            if support.quantize.sizes.iter().filter(|s| s.is_default).count() > 1 {
                return Err(GenError::ConfigurationError(format!(
                    "profile `{}` lists more than one default {modality} size",
                    self.id
                )));
            }
            if support
                .quantize
                .sizes
                .iter()
                .any(|s| s.width == 0 || s.height == 0)
            {
                return Err(GenError::ConfigurationError(format!(
                    "profile `{}` lists a zero-dimension {modality} size",
                    self.id
                )));
            }
        }
        Ok(())
    }
}
