//! Questionnaire answers: one feedback record per LINE identity.
//!
//! Phase 1 is three fixed free-text questions. Phase 2 is split into four
//! bases, each an open map of question id to answer; a base is submitted as
//! a unit and replaces only itself.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Collection, Record};

// ─── Phase 1 ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Phase1Question {
  Q1,
  Q2,
  Q3,
}

impl Phase1Question {
  pub fn label(self) -> &'static str {
    match self {
      Phase1Question::Q1 => "ผลการเลือกตั้งที่ผ่านมา สะท้อนอะไรบ้าง",
      Phase1Question::Q2 => "เพราะอะไร คะแนนพรรคจึงลดลงในการเลือกตั้ง 69",
      Phase1Question::Q3 => "ต้องทำอะไรบ้าง เพื่อให้ชนะเลือกตั้งในครั้งหน้า",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase1Answers {
  #[serde(default)]
  pub q1: String,
  #[serde(default)]
  pub q2: String,
  #[serde(default)]
  pub q3: String,
}

impl Phase1Answers {
  pub fn answer(&self, question: Phase1Question) -> &str {
    match question {
      Phase1Question::Q1 => &self.q1,
      Phase1Question::Q2 => &self.q2,
      Phase1Question::Q3 => &self.q3,
    }
  }

  /// `true` if at least one question has a non-blank answer.
  pub fn has_answers(&self) -> bool {
    [&self.q1, &self.q2, &self.q3]
      .iter()
      .any(|a| !a.trim().is_empty())
  }
}

// ─── Phase 2 ─────────────────────────────────────────────────────────────────

/// Answers for one base, keyed by question id.
pub type BaseAnswers = BTreeMap<String, String>;

/// One of the four phase-2 stations.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::EnumIter,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Base {
  Base1,
  Base2,
  Base3,
  Base4,
}

impl Base {
  pub fn title(self) -> &'static str {
    match self {
      Base::Base1 => "ฐาน 1",
      Base::Base2 => "ฐาน 2",
      Base::Base3 => "ฐาน 3",
      Base::Base4 => "ฐาน 4",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase2Answers {
  #[serde(default)]
  pub base1: BaseAnswers,
  #[serde(default)]
  pub base2: BaseAnswers,
  #[serde(default)]
  pub base3: BaseAnswers,
  #[serde(default)]
  pub base4: BaseAnswers,
}

impl Phase2Answers {
  pub fn base(&self, base: Base) -> &BaseAnswers {
    match base {
      Base::Base1 => &self.base1,
      Base::Base2 => &self.base2,
      Base::Base3 => &self.base3,
      Base::Base4 => &self.base4,
    }
  }

  fn base_mut(&mut self, base: Base) -> &mut BaseAnswers {
    match base {
      Base::Base1 => &mut self.base1,
      Base::Base2 => &mut self.base2,
      Base::Base3 => &mut self.base3,
      Base::Base4 => &mut self.base4,
    }
  }

  /// Replace every base present in `patch`; bases absent from it are kept.
  pub fn merge(&mut self, patch: Phase2Patch) {
    for (base, answers) in patch.into_bases() {
      *self.base_mut(base) = answers;
    }
  }

  /// Bases with at least one non-blank answer, in order.
  pub fn answered_bases(&self) -> Vec<Base> {
    use strum::IntoEnumIterator as _;
    Base::iter()
      .filter(|b| self.base(*b).values().any(|a| !a.trim().is_empty()))
      .collect()
  }

  pub fn has_answers(&self) -> bool { !self.answered_bases().is_empty() }
}

/// A partial phase-2 update: only the bases being submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Phase2Patch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base1: Option<BaseAnswers>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base2: Option<BaseAnswers>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base3: Option<BaseAnswers>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base4: Option<BaseAnswers>,
}

impl Phase2Patch {
  /// A patch that submits a single base.
  pub fn single(base: Base, answers: BaseAnswers) -> Self {
    let mut patch = Self::default();
    match base {
      Base::Base1 => patch.base1 = Some(answers),
      Base::Base2 => patch.base2 = Some(answers),
      Base::Base3 => patch.base3 = Some(answers),
      Base::Base4 => patch.base4 = Some(answers),
    }
    patch
  }

  fn into_bases(self) -> impl Iterator<Item = (Base, BaseAnswers)> {
    [
      (Base::Base1, self.base1),
      (Base::Base2, self.base2),
      (Base::Base3, self.base3),
      (Base::Base4, self.base4),
    ]
    .into_iter()
    .filter_map(|(base, answers)| answers.map(|a| (base, a)))
  }
}

// ─── Stored record ───────────────────────────────────────────────────────────

/// Free-form context the form may attach on first submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMeta {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub area: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

impl FeedbackMeta {
  /// Trimmed copy, or `None` when every field is blank.
  pub fn normalized(self) -> Option<Self> {
    let clean = |v: Option<String>| {
      v.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    };
    let meta = FeedbackMeta { area: clean(self.area), name: clean(self.name) };
    (meta.area.is_some() || meta.name.is_some()).then_some(meta)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub id:                Uuid,
  pub line_user_id:      String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub line_display_name: Option<String>,
  pub phase1:            Phase1Answers,
  #[serde(default)]
  pub phase2:            Phase2Answers,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub meta:              Option<FeedbackMeta>,
  pub created_at:        DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at:        Option<DateTime<Utc>>,
}

impl Feedback {
  pub fn progress(&self) -> Progress {
    Progress {
      phase1_submitted: self.phase1.has_answers(),
      submitted_bases:  self.phase2.answered_bases(),
    }
  }
}

impl Record for Feedback {
  const COLLECTION: Collection = Collection::Feedback;

  fn key(&self) -> String { self.id.to_string() }

  fn line_user_id(&self) -> &str { &self.line_user_id }
}

/// Which parts of the questionnaire a respondent has already answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
  pub phase1_submitted: bool,
  pub submitted_bases:  Vec<Base>,
}

// ─── Submissions ─────────────────────────────────────────────────────────────

/// Body of `POST /feedback`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
  pub line_user_id:      Option<String>,
  pub line_display_name: Option<String>,
  pub phase1:            Option<Phase1Answers>,
  pub phase2:            Option<Phase2Patch>,
  pub meta:              Option<FeedbackMeta>,
}

/// Body of `PATCH /feedback`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPatch {
  pub id:           Option<String>,
  pub line_user_id: Option<String>,
  pub phase1:       Option<Phase1Answers>,
  pub phase2:       Option<Phase2Patch>,
}
