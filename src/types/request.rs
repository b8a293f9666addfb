//! Canonical generation requests
//!
//! A [`GenerationRequest`] carries the modality-specific required fields
//! plus two open maps: `options` for optional parameters that target
//! profiles may or may not support, and `extended` for raw passthrough
//! fields that are merged into the wire body last. Requests are immutable
//! once built; all validation happens in the builders.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenError;
use crate::types::chat::ChatMessage;

/// Output modality of a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Chat completion
    Text,
    /// Image generation
    Image,
    /// Video generation
    Video,
    /// Speech synthesis
    Speech,
}

impl Modality {
    /// Stable lowercase name, used in logs and profile lookups.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Speech => "speech",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modality-specific required fields of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestPayload {
    /// Chat completion input
    Text {
        /// Model identifier
        model: String,
        /// Conversation messages in order
        messages: Vec<ChatMessage>,
    },
    /// Image generation input
    Image {
        /// Model identifier; some targets infer a default when absent
        model: Option<String>,
        /// Text prompt
        prompt: String,
    },
    /// Video generation input
    Video {
        /// Model identifier
        model: String,
        /// Text prompt
        prompt: String,
    },
    /// Speech synthesis input
    Speech {
        /// Model identifier
        model: String,
        /// Text to synthesize
        input: String,
        /// Voice identifier
        voice: String,
    },
}

impl RequestPayload {
    /// The modality this payload belongs to.
    pub const fn modality(&self) -> Modality {
        match self {
            Self::Text { .. } => Modality::Text,
            Self::Image { .. } => Modality::Image,
            Self::Video { .. } => Modality::Video,
            Self::Speech { .. } => Modality::Speech,
        }
    }
}

/// A provider-independent generation request
///
/// Built through the per-modality builders ([`GenerationRequest::text`],
/// [`GenerationRequest::image`], [`GenerationRequest::video`],
/// [`GenerationRequest::speech`]) and never mutated afterwards, so the
/// same request can be normalized against any number of profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    payload: RequestPayload,
    options: BTreeMap<String, Value>,
    extended: BTreeMap<String, Value>,
}

impl GenerationRequest {
    /// Start building a chat completion request.
    pub fn text(model: impl Into<String>, messages: Vec<ChatMessage>) -> TextRequestBuilder {
        TextRequestBuilder::new(model.into(), messages)
    }

    /// Start building an image generation request.
    pub fn image(prompt: impl Into<String>) -> ImageRequestBuilder {
        ImageRequestBuilder::new(prompt.into())
    }

    /// Start building a video generation request.
    pub fn video(model: impl Into<String>, prompt: impl Into<String>) -> VideoRequestBuilder {
        VideoRequestBuilder::new(model.into(), prompt.into())
    }

    /// Start building a speech synthesis request.
    pub fn speech(
        model: impl Into<String>,
        input: impl Into<String>,
        voice: impl Into<String>,
    ) -> SpeechRequestBuilder {
        SpeechRequestBuilder::new(model.into(), input.into(), voice.into())
    }

    /// The modality of this request.
    pub const fn modality(&self) -> Modality {
        self.payload.modality()
    }

    /// The modality-specific required fields.
    pub const fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    /// The requested model, if one was given.
    pub fn model(&self) -> Option<&str> {
        match &self.payload {
            RequestPayload::Text { model, .. }
            | RequestPayload::Video { model, .. }
            | RequestPayload::Speech { model, .. } => Some(model),
            RequestPayload::Image { model, .. } => model.as_deref(),
        }
    }

    /// Optional parameters, subject to per-target support filtering.
    pub const fn options(&self) -> &BTreeMap<String, Value> {
        &self.options
    }

    /// Extended passthrough fields, merged into the wire body last.
    pub const fn extended(&self) -> &BTreeMap<String, Value> {
        &self.extended
    }
}

fn require_nonempty(name: &str, value: &str) -> Result<(), GenError> {
    if value.trim().is_empty() {
        return Err(GenError::InvalidInput(format!("{name} must not be empty")));
    }
    Ok(())
}

fn check_range_f64(name: &str, value: f64, min: f64, max: f64) -> Result<(), GenError> {
    if !value.is_finite() || value < min || value > max {
        return Err(GenError::InvalidParameter(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

fn check_range_u32(name: &str, value: u32, min: u32, max: u32) -> Result<(), GenError> {
    if value < min || value > max {
        return Err(GenError::InvalidParameter(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Shared tail of every builder: open options plus passthrough fields.
#[derive(Debug, Clone, Default)]
struct OpenFields {
    options: BTreeMap<String, Value>,
    extended: BTreeMap<String, Value>,
    extended_json: Option<String>,
}

impl OpenFields {
    fn finish(mut self) -> Result<(BTreeMap<String, Value>, BTreeMap<String, Value>), GenError> {
        if let Some(raw) = self.extended_json {
            let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
                GenError::InvalidInput(format!("extended parameters are not valid JSON: {e}"))
            })?;
            let Value::Object(object) = parsed else {
                return Err(GenError::InvalidInput(
                    "extended parameters must be a JSON object".to_string(),
                ));
            };
            for (key, value) in object {
                self.extended.insert(key, value);
            }
        }
        Ok((self.options, self.extended))
    }
}

macro_rules! open_field_setters {
    () => {
        /// Set an arbitrary optional parameter.
        ///
        /// The value is still subject to the target profile's support
        /// filtering during normalization.
        pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
            self.open.options.insert(key.into(), value.into());
            self
        }

        /// Set a raw extended field that bypasses support filtering.
        pub fn extended(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
            self.open.extended.insert(key.into(), value.into());
            self
        }

        /// Merge a JSON object of extended fields, parsed at build time.
        pub fn extended_json(mut self, json: impl Into<String>) -> Self {
            self.open.extended_json = Some(json.into());
            self
        }
    };
}

/// Builder for chat completion requests
#[derive(Debug, Clone)]
pub struct TextRequestBuilder {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    top_p: Option<f64>,
    frequency_penalty: Option<f64>,
    presence_penalty: Option<f64>,
    seed: Option<u64>,
    stop: Vec<String>,
    n: Option<u32>,
    json_output: bool,
    top_logprobs: Option<u32>,
    open: OpenFields,
}

impl TextRequestBuilder {
    fn new(model: String, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            seed: None,
            stop: Vec::new(),
            n: None,
            json_output: false,
            top_logprobs: None,
            open: OpenFields::default(),
        }
    }

    /// Sampling temperature, `0.0..=2.0`.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Maximum tokens to generate, `1..=128000`.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Nucleus sampling cutoff, `0.0..=1.0`.
    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Frequency penalty, `-2.0..=2.0`.
    pub fn frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Presence penalty, `-2.0..=2.0`.
    pub fn presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Deterministic sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Stop sequences; empty entries are ignored.
    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    /// Number of completions to generate, `1..=10`.
    pub fn n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    /// Request a JSON object response.
    pub fn json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Enable log probabilities with the given number of alternatives,
    /// `0..=20`.
    pub fn logprobs(mut self, top_logprobs: u32) -> Self {
        self.top_logprobs = Some(top_logprobs);
        self
    }

    open_field_setters!();

    /// Validate and build the request.
    pub fn build(self) -> Result<GenerationRequest, GenError> {
        require_nonempty("model", &self.model)?;
        if self.messages.is_empty() {
            return Err(GenError::InvalidInput(
                "messages must not be empty".to_string(),
            ));
        }

        let mut options = BTreeMap::new();
        if let Some(temperature) = self.temperature {
            check_range_f64("temperature", temperature, 0.0, 2.0)?;
            options.insert("temperature".to_string(), temperature.into());
        }
        if let Some(max_tokens) = self.max_tokens {
            check_range_u32("max_tokens", max_tokens, 1, 128_000)?;
            options.insert("max_tokens".to_string(), max_tokens.into());
        }
        if let Some(top_p) = self.top_p {
            check_range_f64("top_p", top_p, 0.0, 1.0)?;
            options.insert("top_p".to_string(), top_p.into());
        }
        if let Some(penalty) = self.frequency_penalty {
            check_range_f64("frequency_penalty", penalty, -2.0, 2.0)?;
            options.insert("frequency_penalty".to_string(), penalty.into());
        }
        if let Some(penalty) = self.presence_penalty {
            check_range_f64("presence_penalty", penalty, -2.0, 2.0)?;
            options.insert("presence_penalty".to_string(), penalty.into());
        }
        if let Some(seed) = self.seed {
            options.insert("seed".to_string(), seed.into());
        }
        let stop: Vec<String> = self.stop.into_iter().filter(|s| !s.is_empty()).collect();
        if !stop.is_empty() {
            options.insert("stop".to_string(), stop.into());
        }
        if let Some(n) = self.n {
            check_range_u32("n", n, 1, 10)?;
            options.insert("n".to_string(), n.into());
        }
        if self.json_output {
            options.insert(
                "response_format".to_string(),
                serde_json::json!({"type": "json_object"}),
            );
        }
        if let Some(top_logprobs) = self.top_logprobs {
            check_range_u32("top_logprobs", top_logprobs, 0, 20)?;
            options.insert("logprobs".to_string(), true.into());
            options.insert("top_logprobs".to_string(), top_logprobs.into());
        }

        let (open_options, extended) = self.open.finish()?;
        options.extend(open_options);

        Ok(GenerationRequest {
            payload: RequestPayload::Text {
                model: self.model,
                messages: self.messages,
            },
            options,
            extended,
        })
    }
}

/// Builder for image generation requests
#[derive(Debug, Clone)]
pub struct ImageRequestBuilder {
    prompt: String,
    model: Option<String>,
    n: Option<u32>,
    size: Option<String>,
    quality: Option<String>,
    style: Option<String>,
    response_format: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    negative_prompt: Option<String>,
    guidance_scale: Option<f64>,
    steps: Option<u32>,
    seed: Option<u64>,
    sampler: Option<String>,
    open: OpenFields,
}

impl ImageRequestBuilder {
    fn new(prompt: String) -> Self {
        Self {
            prompt,
            model: None,
            n: None,
            size: None,
            quality: None,
            style: None,
            response_format: None,
            width: None,
            height: None,
            negative_prompt: None,
            guidance_scale: None,
            steps: None,
            seed: None,
            sampler: None,
            open: OpenFields::default(),
        }
    }

    /// Model identifier, e.g. `dall-e-3`.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Number of images to generate, `1..=10`.
    pub fn n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    /// Image size as `WIDTHxHEIGHT`, e.g. `1024x1024`.
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Rendering quality, e.g. `standard` or `hd`.
    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    /// Rendering style, e.g. `vivid` or `natural`.
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Response format, `url` or `b64_json`.
    pub fn response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = Some(format.into());
        self
    }

    /// Explicit output width in pixels, `256..=2048`.
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Explicit output height in pixels, `256..=2048`.
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Negative prompt for diffusion backends.
    pub fn negative_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(prompt.into());
        self
    }

    /// Classifier-free guidance scale, `1.0..=20.0`.
    pub fn guidance_scale(mut self, scale: f64) -> Self {
        self.guidance_scale = Some(scale);
        self
    }

    /// Number of inference steps, `1..=150`.
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Deterministic sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sampler name for diffusion backends, e.g. `euler_a`.
    pub fn sampler(mut self, sampler: impl Into<String>) -> Self {
        self.sampler = Some(sampler.into());
        self
    }

    open_field_setters!();

    /// Validate and build the request.
    pub fn build(self) -> Result<GenerationRequest, GenError> {
        require_nonempty("prompt", &self.prompt)?;

        let mut options = BTreeMap::new();
        if let Some(n) = self.n {
            check_range_u32("n", n, 1, 10)?;
            options.insert("n".to_string(), n.into());
        }
        if let Some(size) = self.size {
            options.insert("size".to_string(), size.into());
        }
        if let Some(quality) = self.quality {
            options.insert("quality".to_string(), quality.into());
        }
        if let Some(style) = self.style {
            options.insert("style".to_string(), style.into());
        }
        if let Some(format) = self.response_format {
            if format != "url" && format != "b64_json" {
                return Err(GenError::InvalidParameter(format!(
                    "response_format must be \"url\" or \"b64_json\", got {format:?}"
                )));
            }
            options.insert("response_format".to_string(), format.into());
        }
        if let Some(width) = self.width {
            check_range_u32("width", width, 256, 2048)?;
            options.insert("width".to_string(), width.into());
        }
        if let Some(height) = self.height {
            check_range_u32("height", height, 256, 2048)?;
            options.insert("height".to_string(), height.into());
        }
        if let Some(prompt) = self.negative_prompt {
            options.insert("negative_prompt".to_string(), prompt.into());
        }
        if let Some(scale) = self.guidance_scale {
            check_range_f64("guidance_scale", scale, 1.0, 20.0)?;
            options.insert("guidance_scale".to_string(), scale.into());
        }
        if let Some(steps) = self.steps {
            check_range_u32("steps", steps, 1, 150)?;
            options.insert("steps".to_string(), steps.into());
        }
        if let Some(seed) = self.seed {
            options.insert("seed".to_string(), seed.into());
        }
        if let Some(sampler) = self.sampler {
            options.insert("sampler".to_string(), sampler.into());
        }

        let (open_options, extended) = self.open.finish()?;
        options.extend(open_options);

        Ok(GenerationRequest {
            payload: RequestPayload::Image {
                model: self.model,
                prompt: self.prompt,
            },
            options,
            extended,
        })
    }
}

/// Builder for video generation requests
#[derive(Debug, Clone)]
pub struct VideoRequestBuilder {
    model: String,
    prompt: String,
    resolution: Option<String>,
    duration: Option<u32>,
    fps: Option<u32>,
    aspect_ratio: Option<String>,
    image_url: Option<String>,
    end_image_url: Option<String>,
    negative_prompt: Option<String>,
    guidance_scale: Option<f64>,
    steps: Option<u32>,
    seed: Option<u64>,
    motion_strength: Option<f64>,
    camera_motion: Option<String>,
    loop_video: Option<bool>,
    upscale: Option<bool>,
    open: OpenFields,
}

impl VideoRequestBuilder {
    fn new(model: String, prompt: String) -> Self {
        Self {
            model,
            prompt,
            resolution: None,
            duration: None,
            fps: None,
            aspect_ratio: None,
            image_url: None,
            end_image_url: None,
            negative_prompt: None,
            guidance_scale: None,
            steps: None,
            seed: None,
            motion_strength: None,
            camera_motion: None,
            loop_video: None,
            upscale: None,
            open: OpenFields::default(),
        }
    }

    /// Target resolution label, e.g. `1080p`, `720p`, `480p`.
    pub fn resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    /// Clip duration in seconds, `1..=60`.
    pub fn duration(mut self, seconds: u32) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Frames per second, `1..=60`.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Aspect ratio as `W:H`, e.g. `16:9`.
    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    /// Source image for image-to-video, an `http(s)` URL or data URL.
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Final frame image for interpolation backends.
    pub fn end_image_url(mut self, url: impl Into<String>) -> Self {
        self.end_image_url = Some(url.into());
        self
    }

    /// Negative prompt.
    pub fn negative_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(prompt.into());
        self
    }

    /// Classifier-free guidance scale, `1.0..=20.0`.
    pub fn guidance_scale(mut self, scale: f64) -> Self {
        self.guidance_scale = Some(scale);
        self
    }

    /// Number of inference steps, `1..=150`.
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Deterministic sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Motion intensity, `0.0..=2.0`.
    pub fn motion_strength(mut self, strength: f64) -> Self {
        self.motion_strength = Some(strength);
        self
    }

    /// Camera motion preset, e.g. `pan_left`, `zoom_in`.
    pub fn camera_motion(mut self, motion: impl Into<String>) -> Self {
        self.camera_motion = Some(motion.into());
        self
    }

    /// Whether the clip should loop seamlessly.
    pub fn loop_video(mut self, looped: bool) -> Self {
        self.loop_video = Some(looped);
        self
    }

    /// Whether to upscale the output.
    pub fn upscale(mut self, upscale: bool) -> Self {
        self.upscale = Some(upscale);
        self
    }

    open_field_setters!();

    /// Validate and build the request.
    pub fn build(self) -> Result<GenerationRequest, GenError> {
        require_nonempty("model", &self.model)?;
        require_nonempty("prompt", &self.prompt)?;

        let mut options = BTreeMap::new();
        if let Some(resolution) = self.resolution {
            options.insert("resolution".to_string(), resolution.into());
        }
        if let Some(duration) = self.duration {
            check_range_u32("duration", duration, 1, 60)?;
            options.insert("duration".to_string(), duration.into());
        }
        if let Some(fps) = self.fps {
            check_range_u32("fps", fps, 1, 60)?;
            options.insert("fps".to_string(), fps.into());
        }
        if let Some(ratio) = self.aspect_ratio {
            options.insert("aspect_ratio".to_string(), ratio.into());
        }
        if let Some(url) = self.image_url {
            options.insert("image_url".to_string(), url.into());
        }
        if let Some(url) = self.end_image_url {
            options.insert("end_image_url".to_string(), url.into());
        }
        if let Some(prompt) = self.negative_prompt {
            options.insert("negative_prompt".to_string(), prompt.into());
        }
        if let Some(scale) = self.guidance_scale {
            check_range_f64("guidance_scale", scale, 1.0, 20.0)?;
            options.insert("guidance_scale".to_string(), scale.into());
        }
        if let Some(steps) = self.steps {
            check_range_u32("steps", steps, 1, 150)?;
            options.insert("steps".to_string(), steps.into());
        }
        if let Some(seed) = self.seed {
            options.insert("seed".to_string(), seed.into());
        }
        if let Some(strength) = self.motion_strength {
            check_range_f64("motion_strength", strength, 0.0, 2.0)?;
            options.insert("motion_strength".to_string(), strength.into());
        }
        if let Some(motion) = self.camera_motion {
            options.insert("camera_motion".to_string(), motion.into());
        }
        if let Some(looped) = self.loop_video {
            options.insert("loop".to_string(), looped.into());
        }
        if let Some(upscale) = self.upscale {
            options.insert("upscale".to_string(), upscale.into());
        }

        let (open_options, extended) = self.open.finish()?;
        options.extend(open_options);

        Ok(GenerationRequest {
            payload: RequestPayload::Video {
                model: self.model,
                prompt: self.prompt,
            },
            options,
            extended,
        })
    }
}

/// Builder for speech synthesis requests
#[derive(Debug, Clone)]
pub struct SpeechRequestBuilder {
    model: String,
    input: String,
    voice: String,
    speed: Option<f64>,
    response_format: Option<String>,
    pitch: Option<f64>,
    stability: Option<f64>,
    similarity_boost: Option<f64>,
    emotion: Option<String>,
    language: Option<String>,
    open: OpenFields,
}

impl SpeechRequestBuilder {
    fn new(model: String, input: String, voice: String) -> Self {
        Self {
            model,
            input,
            voice,
            speed: None,
            response_format: None,
            pitch: None,
            stability: None,
            similarity_boost: None,
            emotion: None,
            language: None,
            open: OpenFields::default(),
        }
    }

    /// Playback speed multiplier, `0.25..=4.0`.
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Audio container format, e.g. `mp3`, `opus`, `wav`.
    pub fn response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = Some(format.into());
        self
    }

    /// Pitch multiplier, `0.5..=2.0`.
    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Voice stability for cloned voices, `0.0..=1.0`.
    pub fn stability(mut self, stability: f64) -> Self {
        self.stability = Some(stability);
        self
    }

    /// Voice similarity boost for cloned voices, `0.0..=1.0`.
    pub fn similarity_boost(mut self, boost: f64) -> Self {
        self.similarity_boost = Some(boost);
        self
    }

    /// Emotion preset, e.g. `happy`, `sad`.
    pub fn emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    /// BCP-47 language hint, e.g. `en`, `zh-CN`.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    open_field_setters!();

    /// Validate and build the request.
    pub fn build(self) -> Result<GenerationRequest, GenError> {
        require_nonempty("model", &self.model)?;
        require_nonempty("input", &self.input)?;
        require_nonempty("voice", &self.voice)?;

        let mut options = BTreeMap::new();
        if let Some(speed) = self.speed {
            check_range_f64("speed", speed, 0.25, 4.0)?;
            options.insert("speed".to_string(), speed.into());
        }
        if let Some(format) = self.response_format {
            options.insert("response_format".to_string(), format.into());
        }
        if let Some(pitch) = self.pitch {
            check_range_f64("pitch", pitch, 0.5, 2.0)?;
            options.insert("pitch".to_string(), pitch.into());
        }
        if let Some(stability) = self.stability {
            check_range_f64("stability", stability, 0.0, 1.0)?;
            options.insert("stability".to_string(), stability.into());
        }
        if let Some(boost) = self.similarity_boost {
            check_range_f64("similarity_boost", boost, 0.0, 1.0)?;
            options.insert("similarity_boost".to_string(), boost.into());
        }
        if let Some(emotion) = self.emotion {
            options.insert("emotion".to_string(), emotion.into());
        }
        if let Some(language) = self.language {
            options.insert("language".to_string(), language.into());
        }

        let (open_options, extended) = self.open.finish()?;
        options.extend(open_options);

        Ok(GenerationRequest {
            payload: RequestPayload::Speech {
                model: self.model,
                input: self.input,
                voice: self.voice,
            },
            options,
            extended,
        })
    }
}
