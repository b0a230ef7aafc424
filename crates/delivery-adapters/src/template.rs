//! Generadores deterministas basados en plantillas.
//!
//! Misma entrada ⇒ misma salida, sin IO. Suficientes para correr el pipeline
//! de punta a punta y para la paridad entre backends.

use delivery_core::canonical_dump;
use delivery_domain::{validate_stored_text, Asset, Brief, DeliveryArtifact, DraftBundle, Strategy, TacticAssignment};
use serde_json::Value;

use crate::generator::{BriefContent, DeliveryGenerator, DraftGenerator, Evaluation, GeneratorError, IntakeNormalizer, QualityEvaluator,
                       StrategyDraft, StrategyGenerator};

fn required_text(payload: &serde_json::Map<String, Value>, key: &str) -> Result<String, GeneratorError> {
    match payload.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) | None => Err(GeneratorError::InvalidInput(format!("payload field '{key}' is required"))),
        Some(_) => Err(GeneratorError::InvalidInput(format!("payload field '{key}' must be a string"))),
    }
}

/// Normaliza la solicitud: exige `client` y `goal`, recorta espacios,
/// normaliza `channels` (minúsculas, sin duplicados) y emite JSON canónico.
#[derive(Debug, Clone, Default)]
pub struct CanonicalIntakeNormalizer;

impl IntakeNormalizer for CanonicalIntakeNormalizer {
    fn normalize(&self, _run_id: &str, payload: &Value) -> Result<String, GeneratorError> {
        let Value::Object(map) = payload else {
            return Err(GeneratorError::InvalidInput("payload must be a JSON object".into()));
        };
        let client = required_text(map, "client")?;
        let goal = required_text(map, "goal")?;

        let mut channels: Vec<String> = Vec::new();
        match map.get("channels") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let Some(ch) = item.as_str() else {
                        return Err(GeneratorError::InvalidInput("payload field 'channels' must contain strings".into()));
                    };
                    let ch = ch.trim().to_lowercase();
                    if !ch.is_empty() && !channels.contains(&ch) {
                        channels.push(ch);
                    }
                }
            }
            Some(_) => return Err(GeneratorError::InvalidInput("payload field 'channels' must be an array".into())),
        }
        let notes = map.get("notes")
                       .and_then(Value::as_str)
                       .map(str::trim)
                       .filter(|n| !n.is_empty())
                       .map(str::to_string);

        for (field, text) in [("client", &client), ("goal", &goal)].into_iter()
                                                                   .chain(channels.iter().map(|c| ("channels", c)))
                                                                   .chain(notes.iter().map(|n| ("notes", n)))
        {
            validate_stored_text(field, text).map_err(|e| GeneratorError::InvalidInput(e.to_string()))?;
        }

        let content = BriefContent { client,
                                     goal,
                                     channels,
                                     notes };
        canonical_dump(&content).map_err(|e| GeneratorError::Failed(format!("normalize: {e}")))
    }
}

pub struct TemplateStrategyGenerator {
    default_channels: Vec<String>,
}

impl TemplateStrategyGenerator {
    pub fn new(default_channels: Vec<String>) -> Self {
        Self { default_channels }
    }

    fn tactic_for(channel: &str, goal: &str) -> String {
        match channel {
            "email" => format!("nurture sequence announcing the {goal}"),
            "social" => format!("teaser posts building up to the {goal}"),
            "web" => format!("landing page explaining the {goal}"),
            "search" => format!("paid keywords around the {goal}"),
            other => format!("{other} placement supporting the {goal}"),
        }
    }
}

impl Default for TemplateStrategyGenerator {
    fn default() -> Self {
        Self::new(vec!["email".into(), "social".into(), "web".into()])
    }
}

impl StrategyGenerator for TemplateStrategyGenerator {
    fn generate(&self, brief: &Brief) -> Result<StrategyDraft, GeneratorError> {
        let content = BriefContent::parse(brief)?;
        let channels = if content.channels.is_empty() { &self.default_channels } else { &content.channels };
        if channels.is_empty() {
            return Err(GeneratorError::Failed("no channels available".into()));
        }
        let tactic_assignments: Vec<TacticAssignment> =
            channels.iter()
                    .map(|c| TacticAssignment { channel: c.clone(),
                                                tactic: Self::tactic_for(c, &content.goal) })
                    .collect();
        let mut text = format!("{} {} strategy across {} channel(s): {}.",
                               content.client,
                               content.goal,
                               channels.len(),
                               channels.join(", "));
        if let Some(notes) = &content.notes {
            text.push_str(&format!(" Notes: {notes}"));
        }
        Ok(StrategyDraft { content: text,
                           tactic_assignments })
    }
}

/// Un asset `summary` con la estrategia completa y uno por táctica.
#[derive(Debug, Clone, Default)]
pub struct TemplateDraftGenerator;

impl DraftGenerator for TemplateDraftGenerator {
    fn generate(&self, strategy: &Strategy) -> Result<Vec<Asset>, GeneratorError> {
        if strategy.content.trim().is_empty() {
            return Err(GeneratorError::InvalidInput(format!("strategy {} has no content", strategy.strategy_id)));
        }
        let mut assets = Vec::with_capacity(strategy.tactic_assignments.len() + 1);
        assets.push(Asset { kind: "summary".into(),
                            title: "Campaign summary".into(),
                            body: strategy.content.clone() });
        for (i, t) in strategy.tactic_assignments.iter().enumerate() {
            assets.push(Asset { kind: t.channel.clone(),
                                title: format!("{} asset {}", t.channel, i + 1),
                                body: format!("{}. {}", capitalize(&t.tactic), strategy.content) });
        }
        Ok(assets)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Evaluador por rúbrica: cada chequeo aporta lo mismo al score; aprueba si
/// `score >= threshold`.
#[derive(Debug, Clone)]
pub struct RubricQualityEvaluator {
    pub threshold: f64,
    pub min_body_len: usize,
}

impl RubricQualityEvaluator {
    pub const DEFAULT_THRESHOLD: f64 = 0.75;
    pub const DEFAULT_MIN_BODY_LEN: usize = 24;

    pub fn new(threshold: f64) -> Self {
        Self { threshold,
               min_body_len: Self::DEFAULT_MIN_BODY_LEN }
    }
}

impl Default for RubricQualityEvaluator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl QualityEvaluator for RubricQualityEvaluator {
    fn evaluate(&self, bundle: &DraftBundle) -> Result<Evaluation, GeneratorError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(GeneratorError::Failed(format!("threshold {} outside 0..=1", self.threshold)));
        }
        let a = &bundle.assets;
        let mut titles: Vec<&str> = a.iter().map(|x| x.title.as_str()).collect();
        titles.sort_unstable();
        titles.dedup();

        let checks: [(bool, String); 4] =
            [(!a.is_empty(), "draft has no assets".to_string()),
             (a.iter().all(|x| !x.title.trim().is_empty()), "every asset needs a title".to_string()),
             (a.iter().all(|x| x.body.chars().count() >= self.min_body_len),
              format!("asset bodies must have at least {} characters", self.min_body_len)),
             (titles.len() == a.len(), "asset titles must be unique".to_string())];

        let passed_checks = checks.iter().filter(|(ok, _)| *ok).count();
        let issues: Vec<String> = checks.into_iter().filter(|(ok, _)| !ok).map(|(_, msg)| msg).collect();
        let score = passed_checks as f64 / 4.0;
        Ok(Evaluation { passed: score >= self.threshold,
                        score,
                        issues })
    }
}

/// Un artifact markdown por asset más un manifiesto JSON.
#[derive(Debug, Clone)]
pub struct TemplateDeliveryGenerator {
    base_url: String,
}

impl TemplateDeliveryGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string() }
    }
}

impl Default for TemplateDeliveryGenerator {
    fn default() -> Self {
        Self::new("memory://deliveries")
    }
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

impl DeliveryGenerator for TemplateDeliveryGenerator {
    fn package(&self, bundle: &DraftBundle) -> Result<Vec<DeliveryArtifact>, GeneratorError> {
        if bundle.assets.is_empty() {
            return Err(GeneratorError::Failed(format!("bundle {} has nothing to package", bundle.bundle_id)));
        }
        let mut artifacts: Vec<DeliveryArtifact> = bundle.assets
                                                         .iter()
                                                         .enumerate()
                                                         .map(|(i, a)| {
                                                             let name = format!("{:02}-{}", i + 1, slug(&a.title));
                                                             DeliveryArtifact { url: format!("{}/{}/{}.md", self.base_url, bundle.bundle_id, name),
                                                                                name,
                                                                                format: "markdown".into() }
                                                         })
                                                         .collect();
        artifacts.push(DeliveryArtifact { name: "manifest".into(),
                                          url: format!("{}/{}/manifest.json", self.base_url, bundle.bundle_id),
                                          format: "json".into() });
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brief(content: &str) -> Brief {
        Brief { brief_id: "brief-1".into(),
                run_id: "run-001".into(),
                normalized_content: content.into() }
    }

    #[test]
    fn normalizer_is_canonical_and_trims() {
        let n = CanonicalIntakeNormalizer;
        let a = n.normalize("run-1", &json!({"goal": " launch ", "client": "Acme"})).unwrap();
        let b = n.normalize("run-2", &json!({"client": "Acme", "goal": "launch"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, r#"{"client":"Acme","goal":"launch"}"#);
    }

    #[test]
    fn normalizer_rejects_incomplete_requests() {
        let n = CanonicalIntakeNormalizer;
        assert!(matches!(n.normalize("r", &json!({"client": "Acme"})), Err(GeneratorError::InvalidInput(_))));
        assert!(matches!(n.normalize("r", &json!("launch")), Err(GeneratorError::InvalidInput(_))));
        assert!(matches!(n.normalize("r", &json!({"client": "Acme", "goal": "x", "channels": "email"})),
                         Err(GeneratorError::InvalidInput(_))));
        assert!(matches!(n.normalize("r", &json!({"client": "Acme", "goal": "launch", "notes": "a\u{0}b"})),
                         Err(GeneratorError::InvalidInput(m)) if m.contains("notes")));
    }

    #[test]
    fn strategy_uses_requested_channels_in_order() {
        let content = CanonicalIntakeNormalizer.normalize("r", &json!({"client": "Acme", "goal": "launch", "channels": ["Web", "email", "web"]}))
                                               .unwrap();
        let draft = TemplateStrategyGenerator::default().generate(&brief(&content)).unwrap();
        let channels: Vec<&str> = draft.tactic_assignments.iter().map(|t| t.channel.as_str()).collect();
        assert_eq!(channels, vec!["web", "email"]);
        assert!(draft.content.starts_with("Acme launch strategy"));
    }

    #[test]
    fn rubric_scores_each_check_equally() {
        let thin = DraftBundle { bundle_id: "bundle-1".into(),
                                 strategy_id: "strategy-1".into(),
                                 assets: vec![Asset { kind: "email".into(),
                                                      title: "x".into(),
                                                      body: "short".into() },
                                              Asset { kind: "email".into(),
                                                      title: "x".into(),
                                                      body: "short".into() }] };
        let eval = RubricQualityEvaluator::default().evaluate(&thin).unwrap();
        assert!(!eval.passed);
        assert_eq!(eval.score, 0.5);
        assert_eq!(eval.issues.len(), 2);
    }

    #[test]
    fn slugs_are_url_safe() {
        assert_eq!(slug("Campaign summary"), "campaign-summary");
        assert_eq!(slug("  Q3: Launch!! "), "q3-launch");
    }
}
