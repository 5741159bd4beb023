//! Boundary documents. Every document is a JSON object with a `kind`
//! discriminator and an `experiment_id`; both are checked before any other
//! field is read.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kiv::KivStatus;
use super::plan::BulkgenPlan;
use super::review::ReviewPatchPack;
use crate::errors::{AdsOptError, AdsOptResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ProductExperimentOutputPack,
    ReviewPatchPack,
    EvaluationOutputPack,
    EvidencePack,
    RollbackPack,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductExperimentOutputPack => "product_experiment_output_pack",
            Self::ReviewPatchPack => "review_patch_pack",
            Self::EvaluationOutputPack => "evaluation_output_pack",
            Self::EvidencePack => "evidence_pack",
            Self::RollbackPack => "rollback_pack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product_experiment_output_pack" => Some(Self::ProductExperimentOutputPack),
            "review_patch_pack" => Some(Self::ReviewPatchPack),
            "evaluation_output_pack" => Some(Self::EvaluationOutputPack),
            "evidence_pack" => Some(Self::EvidencePack),
            "rollback_pack" => Some(Self::RollbackPack),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub asin: String,
}

/// AI-authored proposal for one product experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalPack {
    pub experiment_id: String,
    pub product: ProductRef,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub hypothesis: Option<String>,
    #[serde(default)]
    pub plans: Vec<BulkgenPlan>,
    /// Backlog items this proposal addresses.
    #[serde(default)]
    pub kiv_refs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeClaim {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    /// Either a level (`"high"`) or a number; kept as authored.
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Status change for an existing backlog item, or a new item when `kiv_id` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KivUpdate {
    #[serde(default)]
    pub kiv_id: Option<String>,
    pub status: KivStatus,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub summary: String,
    #[serde(default)]
    pub outcome: OutcomeClaim,
    #[serde(default)]
    pub why: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub kiv_updates: Vec<KivUpdate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationBody {
    Complete(Evaluation),
    /// The author could not evaluate and asks for more data instead.
    MissingData { questions: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationPack {
    pub experiment_id: String,
    pub product: Option<ProductRef>,
    pub body: EvaluationBody,
}

/// A parsed, shape-checked inbound document.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPack {
    Proposal(ProposalPack),
    ReviewPatch(ReviewPatchPack),
    Evaluation(EvaluationPack),
}

impl InboundPack {
    /// Parse any importable document.
    pub fn parse(doc: &Value) -> AdsOptResult<Self> {
        let (obj, kind) = discriminate(doc)?;
        match kind {
            DocumentKind::ProductExperimentOutputPack => {
                let pack: ProposalPack = from_object(obj, kind)?;
                if pack.product.asin.trim().is_empty() {
                    return Err(AdsOptError::input_shape("product.asin must not be empty"));
                }
                Ok(Self::Proposal(pack))
            }
            DocumentKind::ReviewPatchPack => Ok(Self::ReviewPatch(from_object(obj, kind)?)),
            DocumentKind::EvaluationOutputPack => Ok(Self::Evaluation(parse_evaluation(obj)?)),
            DocumentKind::EvidencePack | DocumentKind::RollbackPack => Err(AdsOptError::input_shape(
                format!("kind '{}' is generated here and cannot be imported", kind),
            )),
        }
    }

    /// Parse, requiring a specific kind.
    pub fn parse_as(doc: &Value, expected: DocumentKind) -> AdsOptResult<Self> {
        let (_, kind) = discriminate(doc)?;
        if kind != expected {
            return Err(AdsOptError::KindMismatch {
                expected: expected.as_str().to_string(),
                found: kind.as_str().to_string(),
            });
        }
        Self::parse(doc)
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Proposal(_) => DocumentKind::ProductExperimentOutputPack,
            Self::ReviewPatch(_) => DocumentKind::ReviewPatchPack,
            Self::Evaluation(_) => DocumentKind::EvaluationOutputPack,
        }
    }

    pub fn experiment_id(&self) -> &str {
        match self {
            Self::Proposal(p) => &p.experiment_id,
            Self::ReviewPatch(p) => &p.experiment_id,
            Self::Evaluation(p) => &p.experiment_id,
        }
    }
}

/// Check the object shape, `kind` and `experiment_id` without touching other fields.
fn discriminate(doc: &Value) -> AdsOptResult<(&Map<String, Value>, DocumentKind)> {
    let obj = doc
        .as_object()
        .ok_or_else(|| AdsOptError::input_shape("document must be a JSON object"))?;
    let kind_str = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| AdsOptError::input_shape("missing 'kind' discriminator"))?;
    let kind = DocumentKind::parse(kind_str)
        .ok_or_else(|| AdsOptError::input_shape(format!("unknown kind '{}'", kind_str)))?;
    let has_experiment_id = obj
        .get("experiment_id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !has_experiment_id {
        return Err(AdsOptError::input_shape(format!(
            "{} is missing 'experiment_id'",
            kind
        )));
    }
    Ok((obj, kind))
}

fn from_object<T: DeserializeOwned>(obj: &Map<String, Value>, kind: DocumentKind) -> AdsOptResult<T> {
    serde_json::from_value(Value::Object(obj.clone()))
        .map_err(|e| AdsOptError::input_shape(format!("malformed {}: {}", kind, e)))
}

fn parse_evaluation(obj: &Map<String, Value>) -> AdsOptResult<EvaluationPack> {
    let kind = DocumentKind::EvaluationOutputPack;
    let experiment_id = obj
        .get("experiment_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let product: Option<ProductRef> = match obj.get("product") {
        Some(v) if !v.is_null() => Some(
            serde_json::from_value(v.clone())
                .map_err(|e| AdsOptError::input_shape(format!("malformed {} product: {}", kind, e)))?,
        ),
        _ => None,
    };

    if obj.get("ok").and_then(Value::as_bool) == Some(false) {
        let questions: Vec<String> = match obj.get("questions") {
            Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                AdsOptError::input_shape(format!("malformed {} questions: {}", kind, e))
            })?,
            None => Vec::new(),
        };
        return Ok(EvaluationPack {
            experiment_id,
            product,
            body: EvaluationBody::MissingData { questions },
        });
    }

    let product = product
        .filter(|p| !p.asin.trim().is_empty())
        .ok_or_else(|| AdsOptError::input_shape(format!("{} requires product.asin", kind)))?;
    let evaluation_value = obj
        .get("evaluation")
        .ok_or_else(|| AdsOptError::input_shape(format!("{} requires 'evaluation'", kind)))?;
    let evaluation: Evaluation = serde_json::from_value(evaluation_value.clone())
        .map_err(|e| AdsOptError::input_shape(format!("malformed {} evaluation: {}", kind, e)))?;

    for (i, update) in evaluation.kiv_updates.iter().enumerate() {
        let untitled = update.title.as_deref().map_or(true, |t| t.trim().is_empty());
        if update.kiv_id.is_none() && untitled {
            return Err(AdsOptError::input_shape(format!(
                "evaluation.kiv_updates[{}] needs either kiv_id or title",
                i
            )));
        }
    }

    Ok(EvaluationPack {
        experiment_id,
        product: Some(product),
        body: EvaluationBody::Complete(evaluation),
    })
}
