//! Request normalization
//!
//! Renders a canonical request into the exact wire body one target
//! accepts. Required fields go in first, optional fields are filtered
//! against the profile's supported set, surviving values are snapped to
//! the target's discrete sets, and extended fields are merged last so
//! explicit overrides always win. Every drop and every snap is recorded
//! as a warning; nothing changes silently.
//!
//! This module performs no I/O and touches no clocks: the same request
//! and profile always produce the same body and the same warning list,
//! byte for byte.

mod quantize;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::GenError;
use crate::profile::ProviderProfile;
use crate::types::request::{GenerationRequest, RequestPayload};
use crate::types::response::NormalizationWarning;

/// A wire body ready to send, plus what changed to produce it
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBody {
    /// The JSON object to POST; keys are sorted, so serialization is
    /// deterministic
    pub body: Map<String, Value>,
    /// Drops and snaps applied while rendering
    pub warnings: Vec<NormalizationWarning>,
}

impl NormalizedBody {
    /// The body as a `serde_json::Value`.
    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }
}

/// Render a request for a target profile.
///
/// Fails with `UnsupportedOperation` when the profile has no entry for
/// the request's modality; otherwise always succeeds, reporting
/// anything it altered through [`NormalizedBody::warnings`].
pub fn normalize(
    request: &GenerationRequest,
    profile: &ProviderProfile,
) -> Result<NormalizedBody, GenError> {
    let modality = request.modality();
    let support = profile.support(modality).ok_or_else(|| {
        GenError::UnsupportedOperation(format!(
            "profile `{}` does not support {modality} generation",
            profile.id
        ))
    })?;

    let mut body = Map::new();
    let mut warnings = Vec::new();

    match request.payload() {
        RequestPayload::Text { model, messages } => {
            body.insert("model".to_string(), model.clone().into());
            body.insert("messages".to_string(), serde_json::to_value(messages)?);
        }
        RequestPayload::Image { model, prompt } => {
            if let Some(model) = model {
                body.insert("model".to_string(), model.clone().into());
            }
            body.insert("prompt".to_string(), prompt.clone().into());
        }
        RequestPayload::Video { model, prompt } => {
            body.insert("model".to_string(), model.clone().into());
            body.insert("prompt".to_string(), prompt.clone().into());
        }
        RequestPayload::Speech {
            model,
            input,
            voice,
        } => {
            body.insert("model".to_string(), model.clone().into());
            body.insert("input".to_string(), input.clone().into());
            body.insert("voice".to_string(), voice.clone().into());
        }
    }

    // Filter optional fields against the target's supported set.
    let mut accepted: BTreeMap<String, Value> = BTreeMap::new();
    for (name, value) in request.options() {
        if support.supports(name) {
            accepted.insert(name.clone(), value.clone());
        } else {
            warnings.push(NormalizationWarning::Dropped {
                field: name.clone(),
            });
        }
    }

    // Snap surviving values to the target's discrete sets.
    if let Some(allowed) = &support.quantize.durations {
        if let Some(value) = accepted.get("duration").cloned() {
            if let Some(requested) = value.as_f64() {
                if let Some(snapped) = quantize::snap_duration(allowed, requested) {
                    if (f64::from(snapped) - requested).abs() > f64::EPSILON {
                        warnings.push(NormalizationWarning::Quantized {
                            field: "duration".to_string(),
                            requested: value,
                            applied: snapped.into(),
                        });
                    }
                    accepted.insert("duration".to_string(), snapped.into());
                }
            }
        }
    }

    let mut derived_size: Option<String> = None;
    if !support.quantize.sizes.is_empty() {
        let aspect_value = accepted.remove("aspect_ratio");
        let resolution_value = accepted.remove("resolution");
        if aspect_value.is_some() || resolution_value.is_some() {
            let aspect = aspect_value.as_ref().and_then(Value::as_str);
            let resolution = resolution_value.as_ref().and_then(Value::as_str);
            if let Some(chosen) =
                quantize::resolve_size(&support.quantize.sizes, aspect, resolution)
            {
                let malformed = (aspect_value.is_some() && aspect.is_none())
                    || (resolution_value.is_some() && resolution.is_none());
                if malformed || !quantize::size_honors_request(chosen, aspect, resolution) {
                    let mut requested = Map::new();
                    if let Some(value) = &aspect_value {
                        requested.insert("aspect_ratio".to_string(), value.clone());
                    }
                    if let Some(value) = &resolution_value {
                        requested.insert("resolution".to_string(), value.clone());
                    }
                    warnings.push(NormalizationWarning::Quantized {
                        field: "size".to_string(),
                        requested: Value::Object(requested),
                        applied: chosen.to_wire().into(),
                    });
                }
                derived_size = Some(chosen.to_wire());
            }
        }
    }

    // Emit accepted fields, fanning each out under its aliases.
    for (name, value) in &accepted {
        body.insert(name.clone(), value.clone());
        if let Some(aliases) = support.aliases.get(name) {
            for alias in aliases {
                body.insert(alias.clone(), value.clone());
            }
        }
    }
    if let Some(size) = derived_size {
        body.insert("size".to_string(), size.into());
    }

    // Extended fields go last and overwrite anything above.
    for (name, value) in request.extended() {
        if support.extended_passthrough || support.supports(name) {
            body.insert(name.clone(), value.clone());
        } else {
            warnings.push(NormalizationWarning::Dropped {
                field: name.clone(),
            });
        }
    }

    Ok(NormalizedBody { body, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProviderProfile;
    use crate::types::chat::ChatMessage;
    use crate::types::request::{GenerationRequest, Modality};

    fn strict() -> ProviderProfile {
        ProviderProfile::openai()
    }

    fn permissive() -> ProviderProfile {
        ProviderProfile::openai_compatible("local", "http://localhost:8080/v1")
    }

    #[test]
    fn required_fields_come_through_per_modality() {
        let request = GenerationRequest::speech("tts-1", "hello", "alloy")
            .build()
            .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();
        assert_eq!(normalized.body["model"], "tts-1");
        assert_eq!(normalized.body["input"], "hello");
        assert_eq!(normalized.body["voice"], "alloy");
    }

    #[test]
    fn unsupported_fields_are_dropped_and_reported() {
        let request = GenerationRequest::video("sora-1.0", "waves")
            .duration(8)
            .fps(30)
            .motion_strength(1.5)
            .build()
            .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();

        assert!(!normalized.body.contains_key("fps"));
        assert!(!normalized.body.contains_key("motion_strength"));
        assert_eq!(normalized.body["duration"], 8);
        let dropped: Vec<&str> = normalized
            .warnings
            .iter()
            .filter_map(|w| match w {
                NormalizationWarning::Dropped { field } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(dropped, vec!["fps", "motion_strength"]);
    }

    #[test]
    fn duration_snaps_with_a_warning() {
        let request = GenerationRequest::video("sora-1.0", "waves")
            .duration(5)
            .build()
            .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();
        assert_eq!(normalized.body["duration"], 4);
        assert!(normalized.warnings.contains(&NormalizationWarning::Quantized {
            field: "duration".to_string(),
            requested: 5.into(),
            applied: 4.into(),
        }));
    }

    #[test]
    fn exact_duration_snaps_silently() {
        let request = GenerationRequest::video("sora-1.0", "waves")
            .duration(8)
            .build()
            .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();
        assert_eq!(normalized.body["duration"], 8);
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn aspect_ratio_resolves_to_landscape_default() {
        let request = GenerationRequest::video("sora-1.0", "waves")
            .aspect_ratio("16:9")
            .build()
            .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();
        assert_eq!(normalized.body["size"], "1280x720");
        assert!(!normalized.body.contains_key("aspect_ratio"));
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn unmet_resolution_hint_is_reported() {
        let request = GenerationRequest::video("sora-1.0", "waves")
            .aspect_ratio("16:9")
            .resolution("1080p")
            .build()
            .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();
        assert_eq!(normalized.body["size"], "1280x720");
        assert!(normalized.warnings.iter().any(|w| matches!(
            w,
            NormalizationWarning::Quantized { field, .. } if field == "size"
        )));
    }

    #[test]
    fn permissive_target_passes_fields_untouched() {
        let request = GenerationRequest::video("wan-2.1", "waves")
            .duration(5)
            .fps(30)
            .aspect_ratio("16:9")
            .build()
            .unwrap();
        let normalized = normalize(&request, &permissive()).unwrap();
        assert_eq!(normalized.body["duration"], 5);
        assert_eq!(normalized.body["fps"], 30);
        assert_eq!(normalized.body["aspect_ratio"], "16:9");
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn supported_fields_fan_out_under_aliases() {
        let request = GenerationRequest::image("a lighthouse")
            .model("flux-dev")
            .guidance_scale(9.0)
            .steps(30)
            .build()
            .unwrap();
        let normalized = normalize(&request, &permissive()).unwrap();
        assert_eq!(normalized.body["guidance_scale"], 9.0);
        assert_eq!(normalized.body["cfg_scale"], 9.0);
        assert_eq!(normalized.body["steps"], 30);
        assert_eq!(normalized.body["num_inference_steps"], 30);
    }

    #[test]
    fn extended_fields_override_derived_values() {
        let request = GenerationRequest::video("sora-1.0", "waves")
            .duration(5)
            .extended("duration", 7)
            .build()
            .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();
        // The snap produced 4, but the explicit override wins.
        assert_eq!(normalized.body["duration"], 7);
    }

    #[test]
    fn extended_filtering_applies_when_passthrough_is_off() {
        let mut profile = strict();
        let video = profile.modalities.get_mut(&Modality::Video).unwrap();
        video.extended_passthrough = false;

        let request = GenerationRequest::video("sora-1.0", "waves")
            .extended("style_preset", "anime")
            .build()
            .unwrap();
        let normalized = normalize(&request, &profile).unwrap();
        assert!(!normalized.body.contains_key("style_preset"));
        assert!(normalized
            .warnings
            .contains(&NormalizationWarning::Dropped {
                field: "style_preset".to_string()
            }));
    }

    #[test]
    fn missing_modality_is_an_unsupported_operation() {
        let mut profile = strict();
        profile.modalities.remove(&Modality::Speech);
        let request = GenerationRequest::speech("tts-1", "hello", "alloy")
            .build()
            .unwrap();
        assert!(matches!(
            normalize(&request, &profile),
            Err(GenError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn normalization_is_deterministic() {
        let request = GenerationRequest::video("sora-1.0", "waves")
            .duration(5)
            .fps(30)
            .aspect_ratio("16:9")
            .extended("style_preset", "anime")
            .build()
            .unwrap();
        let profile = strict();

        let first = normalize(&request, &profile).unwrap();
        let second = normalize(&request, &profile).unwrap();
        assert_eq!(
            serde_json::to_string(&first.to_value()).unwrap(),
            serde_json::to_string(&second.to_value()).unwrap()
        );
        assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn chat_messages_serialize_into_the_body() {
        let request = GenerationRequest::text(
            "gpt-4o",
            vec![
                ChatMessage::system("be terse"),
                ChatMessage::user_with_image("what is this", "data:image/png;base64,AA=="),
            ],
        )
        .temperature(0.2)
        .build()
        .unwrap();
        let normalized = normalize(&request, &strict()).unwrap();
        let messages = normalized.body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "be terse");
        assert_eq!(messages[1]["content"][1]["type"], "image_url");
        assert_eq!(normalized.body["temperature"], 0.2);
    }
}
