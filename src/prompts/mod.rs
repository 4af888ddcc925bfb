// src/prompts/mod.rs
//! The prompt contracts for both pipeline phases.
//!
//! Both prompts are Handlebars templates rendered from in-memory values.
//! The built-in pair is embedded in the binary and versioned together; a
//! directory holding `classify.hbs` and `synthesize.hbs` can replace them
//! for experiments without rebuilding.

use crate::error::AppError;
use crate::types::{Requirement, TopologyInfo};
use handlebars::Handlebars;
use serde_json::json;
use std::path::Path;

/// Revision of the embedded prompt contracts, reported on every result.
pub const PROMPT_TEMPLATE_VERSION: &str = "v1";

const CLASSIFY_TEMPLATE: &str = "classify";
const SYNTHESIZE_TEMPLATE: &str = "synthesize";

const BUILTIN_CLASSIFY: &str = include_str!("templates/classify.hbs");
const BUILTIN_SYNTHESIZE: &str = include_str!("templates/synthesize.hbs");

/// Registered prompt templates for the classification and synthesis phases.
pub struct PromptTemplates {
    registry: Handlebars<'static>,
    version: String,
}

impl std::fmt::Debug for PromptTemplates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplates")
            .field("version", &self.version)
            .finish()
    }
}

impl PromptTemplates {
    /// The embedded templates.
    pub fn builtin() -> Result<Self, AppError> {
        // The files end with a newline; the prompts do not.
        Self::from_sources(
            without_final_newline(BUILTIN_CLASSIFY),
            without_final_newline(BUILTIN_SYNTHESIZE),
            PROMPT_TEMPLATE_VERSION.to_string(),
        )
    }

    /// Loads `classify.hbs` and `synthesize.hbs` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, AppError> {
        let classify = read_template(dir, CLASSIFY_TEMPLATE)?;
        let synthesize = read_template(dir, SYNTHESIZE_TEMPLATE)?;
        log::info!("Using prompt templates from {}", dir.display());
        Self::from_sources(&classify, &synthesize, format!("custom:{}", dir.display()))
    }

    fn from_sources(classify: &str, synthesize: &str, version: String) -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle `<INSUFFICIENT_DATA: ...>`.
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        for (name, source) in [(CLASSIFY_TEMPLATE, classify), (SYNTHESIZE_TEMPLATE, synthesize)] {
            registry
                .register_template_string(name, source)
                .map_err(|e| AppError::TemplateRenderError {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        let templates = Self { registry, version };
        templates.check_renders()?;
        Ok(templates)
    }

    /// Renders both templates once with sample values so field typos in
    /// custom templates surface at startup instead of mid-run.
    fn check_renders(&self) -> Result<(), AppError> {
        let requirement = Requirement::new("sample requirement")?;
        let topology = TopologyInfo::from_optional(Some("sample topology"));
        self.classification_prompt(&requirement)?;
        self.synthesis_prompt(&requirement, &["sample step".to_string()], topology.as_ref())?;
        self.synthesis_prompt(&requirement, &["sample step".to_string()], None)?;
        Ok(())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Phase 1 prompt: category rules, JSON-only reply contract, then the requirement.
    pub fn classification_prompt(&self, requirement: &Requirement) -> Result<String, AppError> {
        self.render(
            CLASSIFY_TEMPLATE,
            &json!({ "requirement": requirement.as_str() }),
        )
    }

    /// Phase 2 prompt: the nine output rules, the requirement, numbered steps,
    /// and the topology section only when topology is known.
    pub fn synthesis_prompt(
        &self,
        requirement: &Requirement,
        steps: &[String],
        topology: Option<&TopologyInfo>,
    ) -> Result<String, AppError> {
        self.render(
            SYNTHESIZE_TEMPLATE,
            &json!({
                "requirement": requirement.as_str(),
                "steps": numbered_steps(steps),
                // Empty string is falsy for `{{#if}}`, so the section disappears.
                "topology": topology.map(TopologyInfo::as_str).unwrap_or_default(),
            }),
        )
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, AppError> {
        self.registry
            .render(name, data)
            .map_err(|e| AppError::TemplateRenderError {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}

fn read_template(dir: &Path, name: &str) -> Result<String, AppError> {
    let path = dir.join(format!("{}.hbs", name));
    std::fs::read_to_string(&path).map_err(|e| AppError::TemplateNotFound {
        path: path.display().to_string(),
        source: e,
    })
}

fn without_final_newline(source: &str) -> &str {
    source.strip_suffix('\n').unwrap_or(source)
}

/// `1. first\n2. second`, one step per line.
fn numbered_steps(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(text: &str) -> Requirement {
        Requirement::new(text).unwrap()
    }

    #[test]
    fn classification_prompt_ends_with_requirement() {
        let templates = PromptTemplates::builtin().unwrap();
        let prompt = templates
            .classification_prompt(&requirement("Block telnet from 10.0.0.0/8 on R1"))
            .unwrap();

        assert!(prompt.starts_with("You are a network configuration assistant.\n"));
        assert!(prompt.contains("TN is used ONLY for tunnels and VPNs"));
        assert!(prompt.contains("- Output ONLY JSON"));
        assert!(prompt
            .trim_end()
            .ends_with("\n\nUser requirement: Block telnet from 10.0.0.0/8 on R1"));
    }

    #[test]
    fn prompts_are_not_html_escaped() {
        let templates = PromptTemplates::builtin().unwrap();
        let prompt = templates
            .synthesis_prompt(&requirement("permit \"web\" & <ssh>"), &[], None)
            .unwrap();

        assert!(prompt.contains("respond ONLY: <INSUFFICIENT_DATA: specify what is needed>"));
        assert!(prompt.contains("Original requirement: permit \"web\" & <ssh>"));
    }

    #[test]
    fn synthesis_prompt_numbers_steps_in_order() {
        let templates = PromptTemplates::builtin().unwrap();
        let steps = vec![
            "Enter router configuration".to_string(),
            "Advertise network".to_string(),
        ];
        let prompt = templates
            .synthesis_prompt(&requirement("Configure OSPF"), &steps, None)
            .unwrap();

        assert!(prompt.contains(
            "Steps to implement:\n1. Enter router configuration\n2. Advertise network"
        ));
    }

    #[test]
    fn topology_section_only_when_present() {
        let templates = PromptTemplates::builtin().unwrap();
        let steps = vec!["Configure interface".to_string()];

        let without = templates
            .synthesis_prompt(&requirement("Configure OSPF"), &steps, None)
            .unwrap();
        assert!(!without.contains("Network state/topology"));
        assert!(without.trim_end().ends_with("1. Configure interface"));

        let topology = TopologyInfo::from_optional(Some("R1: Gi0/0 192.168.1.1/30"));
        let with = templates
            .synthesis_prompt(&requirement("Configure OSPF"), &steps, topology.as_ref())
            .unwrap();
        assert!(with.contains(
            "1. Configure interface\n\nNetwork state/topology:\nR1: Gi0/0 192.168.1.1/30"
        ));
    }

    #[test]
    fn separator_contract_is_in_synthesis_prompt() {
        let templates = PromptTemplates::builtin().unwrap();
        let prompt = templates
            .synthesis_prompt(&requirement("x"), &["y".to_string()], None)
            .unwrap();

        assert!(prompt.contains("Group ALL commands for each device under ONE separator: ~~~<device_name>~~~"));
        assert!(prompt.contains("respond ONLY: <No Configuration Requirements>"));
        assert!(prompt.contains("OUTPUT FORMAT:\n~~~Device1~~~\ncommand1\ncommand2\n~~~Device2~~~"));
    }

    #[test]
    fn synthesis_instructions_and_request_are_two_blank_lines_apart() {
        let prompt = PromptTemplates::builtin()
            .unwrap()
            .synthesis_prompt(&requirement("Configure OSPF"), &["Enable OSPF".to_string()], None)
            .unwrap();

        assert!(prompt.contains(
            "~~~Device2~~~\ncommand1\ncommand2\n\n\nOriginal requirement: Configure OSPF\n\nSteps to implement:\n1. Enable OSPF"
        ));
        assert!(prompt.ends_with("\n1. Enable OSPF"));
    }

    #[test]
    fn builtin_version_is_reported() {
        assert_eq!(PromptTemplates::builtin().unwrap().version(), PROMPT_TEMPLATE_VERSION);
    }

    #[test]
    fn missing_template_dir_is_reported() {
        let err = PromptTemplates::from_dir(Path::new("/nonexistent/prompt/dir")).unwrap_err();
        assert!(matches!(err, AppError::TemplateNotFound { .. }));
    }

    #[test]
    fn custom_templates_with_unknown_fields_are_rejected() {
        let dir = std::env::temp_dir().join(format!("netconfig_gen_tpl_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("classify.hbs"), "Classify: {{requirment}}").unwrap();
        std::fs::write(dir.join("synthesize.hbs"), "{{requirement}} {{steps}} {{topology}}").unwrap();

        let err = PromptTemplates::from_dir(&dir).unwrap_err();
        assert!(matches!(err, AppError::TemplateRenderError { ref name, .. } if name == "classify"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn custom_templates_are_used() {
        let dir = std::env::temp_dir().join(format!("netconfig_gen_tpl_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("classify.hbs"), "Classify: {{requirement}}").unwrap();
        std::fs::write(dir.join("synthesize.hbs"), "{{requirement}}|{{steps}}|{{topology}}").unwrap();

        let templates = PromptTemplates::from_dir(&dir).unwrap();
        assert!(templates.version().starts_with("custom:"));
        assert_eq!(
            templates.classification_prompt(&requirement("ACL on R2")).unwrap(),
            "Classify: ACL on R2"
        );
        assert_eq!(
            templates
                .synthesis_prompt(&requirement("r"), &["a".into(), "b".into()], None)
                .unwrap(),
            "r|1. a\n2. b|"
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
