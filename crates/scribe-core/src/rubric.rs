use serde::{Deserialize, Serialize};

/// Cardinality constraints enforced by validation.
pub const IDEAS_REQUIRED: usize = 3;
pub const REFINEMENTS_REQUIRED: usize = 3;
pub const MIN_SPECIFICATIONS: usize = 4;
pub const MIN_MERITS: usize = 2;
pub const MIN_DEMERITS: usize = 2;
pub const MIN_CHALLENGES: usize = 2;
pub const MIN_RECOMMENDATIONS: usize = 2;

/// One proposed solution in stage 2 or 3.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub title: String,
    pub description: String,
    pub merits: Vec<String>,
    pub demerits: Vec<String>,
}

/// One improvement applied to the chosen idea in stage 4.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refinement {
    pub aspect: String,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage1 {
    pub problem_statement: String,
    pub background: String,
    pub specifications: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage2 {
    pub ideas: Vec<Idea>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage3 {
    pub ideas: Vec<Idea>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage4 {
    pub refinements: Vec<Refinement>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage5 {
    pub description: String,
    pub justification: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage6 {
    pub summary: String,
    pub challenges: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Validated content for one project: all six stages present.
/// Immutable once compiled — edits produce a new document via
/// [`RubricPatch::merge_into`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricDocument {
    pub stage1: Stage1,
    pub stage2: Stage2,
    pub stage3: Stage3,
    pub stage4: Stage4,
    pub stage5: Stage5,
    pub stage6: Stage6,
}

/// Merge-patch over stages: only stages present are validated and replace
/// the prior values; absent stages pass through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricPatch {
    pub stage1: Option<Stage1>,
    pub stage2: Option<Stage2>,
    pub stage3: Option<Stage3>,
    pub stage4: Option<Stage4>,
    pub stage5: Option<Stage5>,
    pub stage6: Option<Stage6>,
}

impl RubricPatch {
    pub fn is_empty(&self) -> bool {
        self.stage1.is_none()
            && self.stage2.is_none()
            && self.stage3.is_none()
            && self.stage4.is_none()
            && self.stage5.is_none()
            && self.stage6.is_none()
    }

    /// Apply the patch on top of a prior document.
    pub fn merge_into(self, prior: &RubricDocument) -> RubricDocument {
        RubricDocument {
            stage1: self.stage1.unwrap_or_else(|| prior.stage1.clone()),
            stage2: self.stage2.unwrap_or_else(|| prior.stage2.clone()),
            stage3: self.stage3.unwrap_or_else(|| prior.stage3.clone()),
            stage4: self.stage4.unwrap_or_else(|| prior.stage4.clone()),
            stage5: self.stage5.unwrap_or_else(|| prior.stage5.clone()),
            stage6: self.stage6.unwrap_or_else(|| prior.stage6.clone()),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("invalid document shape: {0}")]
    Shape(String),
    #[error("stage {stage}: expected exactly {expected} {what}, got {got}")]
    Cardinality {
        stage: u8,
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("stage {stage}: {field} requires at least {min} entries, got {got}")]
    TooFew {
        stage: u8,
        field: &'static str,
        min: usize,
        got: usize,
    },
    #[error("stage {stage}: {field} must not be blank")]
    Blank { stage: u8, field: &'static str },
    #[error("empty patch: no stages supplied")]
    EmptyPatch,
}

/// Validate a full document candidate (first generation: all six stages
/// required).
pub fn validate(candidate: &serde_json::Value) -> Result<RubricDocument, ValidationError> {
    let doc: RubricDocument = serde_json::from_value(candidate.clone())
        .map_err(|e| ValidationError::Shape(e.to_string()))?;
    check_stage1(&doc.stage1)?;
    check_ideas(2, &doc.stage2.ideas)?;
    check_ideas(3, &doc.stage3.ideas)?;
    check_stage4(&doc.stage4)?;
    check_stage5(&doc.stage5)?;
    check_stage6(&doc.stage6)?;
    Ok(doc)
}

/// Validate an edit candidate: per-stage validation, absent stages skipped.
pub fn validate_patch(candidate: &serde_json::Value) -> Result<RubricPatch, ValidationError> {
    let patch: RubricPatch = serde_json::from_value(candidate.clone())
        .map_err(|e| ValidationError::Shape(e.to_string()))?;
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    if let Some(s) = &patch.stage1 {
        check_stage1(s)?;
    }
    if let Some(s) = &patch.stage2 {
        check_ideas(2, &s.ideas)?;
    }
    if let Some(s) = &patch.stage3 {
        check_ideas(3, &s.ideas)?;
    }
    if let Some(s) = &patch.stage4 {
        check_stage4(s)?;
    }
    if let Some(s) = &patch.stage5 {
        check_stage5(s)?;
    }
    if let Some(s) = &patch.stage6 {
        check_stage6(s)?;
    }
    Ok(patch)
}

fn non_blank(stage: u8, field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { stage, field });
    }
    Ok(())
}

fn min_len(
    stage: u8,
    field: &'static str,
    min: usize,
    items: &[String],
) -> Result<(), ValidationError> {
    if items.len() < min {
        return Err(ValidationError::TooFew {
            stage,
            field,
            min,
            got: items.len(),
        });
    }
    for item in items {
        non_blank(stage, field, item)?;
    }
    Ok(())
}

fn check_stage1(s: &Stage1) -> Result<(), ValidationError> {
    non_blank(1, "problemStatement", &s.problem_statement)?;
    non_blank(1, "background", &s.background)?;
    min_len(1, "specifications", MIN_SPECIFICATIONS, &s.specifications)
}

fn check_ideas(stage: u8, ideas: &[Idea]) -> Result<(), ValidationError> {
    if ideas.len() != IDEAS_REQUIRED {
        return Err(ValidationError::Cardinality {
            stage,
            what: "ideas",
            expected: IDEAS_REQUIRED,
            got: ideas.len(),
        });
    }
    for idea in ideas {
        non_blank(stage, "idea.title", &idea.title)?;
        non_blank(stage, "idea.description", &idea.description)?;
        min_len(stage, "idea.merits", MIN_MERITS, &idea.merits)?;
        min_len(stage, "idea.demerits", MIN_DEMERITS, &idea.demerits)?;
    }
    Ok(())
}

fn check_stage4(s: &Stage4) -> Result<(), ValidationError> {
    if s.refinements.len() != REFINEMENTS_REQUIRED {
        return Err(ValidationError::Cardinality {
            stage: 4,
            what: "refinements",
            expected: REFINEMENTS_REQUIRED,
            got: s.refinements.len(),
        });
    }
    for r in &s.refinements {
        non_blank(4, "refinement.aspect", &r.aspect)?;
        non_blank(4, "refinement.detail", &r.detail)?;
    }
    Ok(())
}

fn check_stage5(s: &Stage5) -> Result<(), ValidationError> {
    non_blank(5, "description", &s.description)?;
    non_blank(5, "justification", &s.justification)
}

fn check_stage6(s: &Stage6) -> Result<(), ValidationError> {
    non_blank(6, "summary", &s.summary)?;
    min_len(6, "challenges", MIN_CHALLENGES, &s.challenges)?;
    min_len(6, "recommendations", MIN_RECOMMENDATIONS, &s.recommendations)
}

/// Expected prose depth for a field — authoring guidance rendered into the
/// marking table, never machine-enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthHint {
    Sentences(u8),
    Items(u8),
}

pub struct FieldSpec {
    pub label: &'static str,
    pub marks: u8,
    pub depth: DepthHint,
}

pub struct StageSpec {
    pub number: u8,
    pub title: &'static str,
    pub marks: u8,
    pub fields: &'static [FieldSpec],
}

/// The fixed marking rubric: six stages, 50 marks total.
pub static RUBRIC: [StageSpec; 6] = [
    StageSpec {
        number: 1,
        title: "Problem Identification",
        marks: 10,
        fields: &[
            FieldSpec { label: "Problem Statement", marks: 4, depth: DepthHint::Sentences(5) },
            FieldSpec { label: "Background", marks: 3, depth: DepthHint::Sentences(4) },
            FieldSpec { label: "Specifications", marks: 3, depth: DepthHint::Items(4) },
        ],
    },
    StageSpec {
        number: 2,
        title: "Investigation of Ideas",
        marks: 9,
        fields: &[FieldSpec { label: "Ideas", marks: 9, depth: DepthHint::Items(3) }],
    },
    StageSpec {
        number: 3,
        title: "Generation of Ideas",
        marks: 9,
        fields: &[FieldSpec { label: "Ideas", marks: 9, depth: DepthHint::Items(3) }],
    },
    StageSpec {
        number: 4,
        title: "Refinement of Chosen Idea",
        marks: 9,
        fields: &[FieldSpec { label: "Refinements", marks: 9, depth: DepthHint::Items(3) }],
    },
    StageSpec {
        number: 5,
        title: "Final Solution",
        marks: 5,
        fields: &[
            FieldSpec { label: "Description", marks: 3, depth: DepthHint::Sentences(5) },
            FieldSpec { label: "Justification", marks: 2, depth: DepthHint::Sentences(3) },
        ],
    },
    StageSpec {
        number: 6,
        title: "Evaluation",
        marks: 8,
        fields: &[
            FieldSpec { label: "Summary", marks: 4, depth: DepthHint::Sentences(4) },
            FieldSpec { label: "Challenges", marks: 2, depth: DepthHint::Items(2) },
            FieldSpec { label: "Recommendations", marks: 2, depth: DepthHint::Items(2) },
        ],
    },
];

pub const TOTAL_MARKS: u8 = 50;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil {
    use super::*;

    pub fn idea(n: usize) -> Idea {
        Idea {
            title: format!("Idea {n}"),
            description: format!("Description of idea {n}."),
            merits: vec!["Cheap to build.".into(), "Locally available materials.".into()],
            demerits: vec!["Short lifespan.".into(), "Needs maintenance.".into()],
        }
    }

    pub fn sample_document() -> RubricDocument {
        RubricDocument {
            stage1: Stage1 {
                problem_statement: "Bilharzia affects rural communities near stagnant water.".into(),
                background: "The disease spreads through contaminated water sources.".into(),
                specifications: vec![
                    "Must be affordable.".into(),
                    "Must use local materials.".into(),
                    "Must be maintainable by the community.".into(),
                    "Must not pollute the water source.".into(),
                ],
            },
            stage2: Stage2 { ideas: vec![idea(1), idea(2), idea(3)] },
            stage3: Stage3 { ideas: vec![idea(4), idea(5), idea(6)] },
            stage4: Stage4 {
                refinements: vec![
                    Refinement { aspect: "Materials".into(), detail: "Replace steel with treated timber.".into() },
                    Refinement { aspect: "Cost".into(), detail: "Source gravel from the local quarry.".into() },
                    Refinement { aspect: "Safety".into(), detail: "Add a covered access hatch.".into() },
                ],
            },
            stage5: Stage5 {
                description: "A slow sand filtration unit at the communal well.".into(),
                justification: "Filtration removes the parasite vector cheaply.".into(),
            },
            stage6: Stage6 {
                summary: "The filtration unit met all specifications during trials.".into(),
                challenges: vec!["Seasonal flooding delayed testing.".into(), "Gravel supply was inconsistent.".into()],
                recommendations: vec!["Build raised foundations.".into(), "Stockpile gravel before the wet season.".into()],
            },
        }
    }

    pub fn sample_value() -> serde_json::Value {
        serde_json::to_value(sample_document()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{idea, sample_document, sample_value};
    use super::*;

    #[test]
    fn valid_document_passes() {
        let doc = validate(&sample_value()).unwrap();
        assert_eq!(doc.stage2.ideas.len(), 3);
        assert_eq!(doc.stage4.refinements.len(), 3);
    }

    #[test]
    fn missing_stage_fails_shape() {
        let mut v = sample_value();
        v.as_object_mut().unwrap().remove("stage4");
        assert!(matches!(validate(&v), Err(ValidationError::Shape(_))));
    }

    #[test]
    fn stage2_with_two_ideas_fails() {
        let mut doc = sample_document();
        doc.stage2.ideas.pop();
        let v = serde_json::to_value(doc).unwrap();
        let err = validate(&v).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Cardinality { stage: 2, what: "ideas", expected: 3, got: 2 }
        );
    }

    #[test]
    fn stage3_with_four_ideas_fails() {
        let mut doc = sample_document();
        doc.stage3.ideas.push(idea(7));
        let v = serde_json::to_value(doc).unwrap();
        assert!(matches!(
            validate(&v),
            Err(ValidationError::Cardinality { stage: 3, .. })
        ));
    }

    #[test]
    fn idea_with_one_merit_fails() {
        let mut doc = sample_document();
        doc.stage2.ideas[1].merits.truncate(1);
        let v = serde_json::to_value(doc).unwrap();
        assert!(matches!(
            validate(&v),
            Err(ValidationError::TooFew { stage: 2, field: "idea.merits", .. })
        ));
    }

    #[test]
    fn too_few_specifications_fails() {
        let mut doc = sample_document();
        doc.stage1.specifications.truncate(3);
        let v = serde_json::to_value(doc).unwrap();
        assert!(matches!(
            validate(&v),
            Err(ValidationError::TooFew { stage: 1, field: "specifications", min: 4, got: 3 })
        ));
    }

    #[test]
    fn blank_problem_statement_fails() {
        let mut doc = sample_document();
        doc.stage1.problem_statement = "   ".into();
        let v = serde_json::to_value(doc).unwrap();
        assert!(matches!(validate(&v), Err(ValidationError::Blank { stage: 1, .. })));
    }

    #[test]
    fn stage6_minimums_enforced() {
        let mut doc = sample_document();
        doc.stage6.recommendations.truncate(1);
        let v = serde_json::to_value(doc).unwrap();
        assert!(matches!(
            validate(&v),
            Err(ValidationError::TooFew { stage: 6, field: "recommendations", .. })
        ));
    }

    #[test]
    fn patch_with_only_stage4_passes() {
        let doc = sample_document();
        let v = serde_json::json!({ "stage4": serde_json::to_value(&doc.stage4).unwrap() });
        let patch = validate_patch(&v).unwrap();
        assert!(patch.stage4.is_some());
        assert!(patch.stage1.is_none());
    }

    #[test]
    fn patch_validates_present_stage() {
        let mut s4 = sample_document().stage4;
        s4.refinements.pop();
        let v = serde_json::json!({ "stage4": serde_json::to_value(&s4).unwrap() });
        assert!(matches!(
            validate_patch(&v),
            Err(ValidationError::Cardinality { stage: 4, .. })
        ));
    }

    #[test]
    fn empty_patch_rejected() {
        assert_eq!(
            validate_patch(&serde_json::json!({})),
            Err(ValidationError::EmptyPatch)
        );
    }

    #[test]
    fn merge_replaces_only_patched_stages() {
        let prior = sample_document();
        let mut replacement = prior.stage4.clone();
        replacement.refinements[0].detail = "Use galvanized fittings.".into();
        let patch = RubricPatch { stage4: Some(replacement.clone()), ..Default::default() };

        let merged = patch.merge_into(&prior);
        assert_eq!(merged.stage1, prior.stage1);
        assert_eq!(merged.stage2, prior.stage2);
        assert_eq!(merged.stage3, prior.stage3);
        assert_eq!(merged.stage5, prior.stage5);
        assert_eq!(merged.stage6, prior.stage6);
        assert_eq!(merged.stage4, replacement);
        assert_ne!(merged.stage4, prior.stage4);
    }

    #[test]
    fn rubric_marks_sum_to_total() {
        let sum: u8 = RUBRIC.iter().map(|s| s.marks).sum();
        assert_eq!(sum, TOTAL_MARKS);
        for stage in &RUBRIC {
            let field_sum: u8 = stage.fields.iter().map(|f| f.marks).sum();
            assert_eq!(field_sum, stage.marks, "stage {}", stage.number);
        }
    }

    #[test]
    fn content_json_roundtrip() {
        let doc = sample_document();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("problemStatement"));
        let parsed: RubricDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }
}
