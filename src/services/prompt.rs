use serde::{Deserialize, Serialize};

/// Hand-tuned interior-renovation prompt. `{zone}` and `{style}` are
/// substituted with the visitor's picks.
const DEFAULT_TEMPLATE: &str = "A stunning {zone} interior completely renovated in {style} style. \
Professional architectural photography with magazine-quality composition. Features: premium \
{style} furniture, designer lighting fixtures, high-end finishes, perfect color coordination. \
Ultra-realistic, 8K resolution, sharp focus, natural daylight, award-winning interior design, \
photorealistic rendering, architectural digest quality.";

/// Prompt construction for the hosted model, kept as configuration so a
/// prompt change never means another copy of the generation route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, style: &str, zone: &str) -> String {
        self.template
            .replace("{style}", style)
            .replace("{zone}", zone)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Input knobs for the hosted image-generation model, with the tuned
/// defaults the funnel ships with. Swappable via configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    /// Version hash of the hosted model.
    #[serde(default = "default_model_version")]
    pub version: String,

    #[serde(default = "default_num_inference_steps")]
    pub num_inference_steps: u32,

    #[serde(default = "default_guidance")]
    pub guidance: f64,

    #[serde(default = "default_megapixels")]
    pub megapixels: String,

    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default = "default_output_quality")]
    pub output_quality: u32,

    #[serde(default)]
    pub disable_safety_checker: bool,
}

fn default_model_version() -> String {
    // FLUX Fill Dev, balanced speed and quality.
    "a053f84125613d83e65328a289e14eb6639e10725c243e8fb0c24128e5573f4c".to_string()
}

fn default_num_inference_steps() -> u32 {
    28
}

fn default_guidance() -> f64 {
    25.0
}

fn default_megapixels() -> String {
    "1.5".to_string()
}

fn default_output_format() -> String {
    "jpg".to_string()
}

fn default_output_quality() -> u32 {
    95
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            version: default_model_version(),
            num_inference_steps: default_num_inference_steps(),
            guidance: default_guidance(),
            megapixels: default_megapixels(),
            output_format: default_output_format(),
            output_quality: default_output_quality(),
            disable_safety_checker: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_style_and_zone() {
        let prompt = PromptTemplate::default().render("Moderno", "Sala");
        assert!(prompt.contains("Sala interior completely renovated in Moderno style"));
        assert!(prompt.contains("premium Moderno furniture"));
        assert!(!prompt.contains("{style}"));
        assert!(!prompt.contains("{zone}"));
    }

    #[test]
    fn custom_template_overrides_default() {
        let template = PromptTemplate::new("{zone} in {style}");
        assert_eq!(template.render("Rústico", "Cozinha"), "Cozinha in Rústico");
    }

    #[test]
    fn default_params_match_tuned_values() {
        let params = ModelParams::default();
        assert_eq!(params.num_inference_steps, 28);
        assert_eq!(params.guidance, 25.0);
        assert_eq!(params.megapixels, "1.5");
        assert_eq!(params.output_quality, 95);
        assert!(!params.disable_safety_checker);
    }
}
