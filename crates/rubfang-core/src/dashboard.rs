//! Read-side views for the dashboard: the registration-joined listing, its
//! filters, and per-question aggregation.

use std::{
  cmp::Ordering,
  collections::{BTreeSet, HashMap},
};

use serde::Serialize;
use strum::IntoEnumIterator as _;

use crate::{
  error::Invalid,
  feedback::{Base, Feedback, Phase1Question},
  registration::{Registration, Role},
};

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Registration attributes copied onto a listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Respondent {
  pub full_name:    String,
  pub role:         Role,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub province_id:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub district_id:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub province:     Option<String>,
  pub group_number: u8,
  #[serde(skip)]
  area:             String,
}

impl From<&Registration> for Respondent {
  fn from(reg: &Registration) -> Self {
    Respondent {
      full_name:    reg.full_name.clone(),
      role:         reg.role,
      province_id:  reg.province_id.clone(),
      district_id:  reg.district_id.clone(),
      province:     reg.province.clone(),
      group_number: reg.group_number,
      area:         reg.area(),
    }
  }
}

/// One feedback record, plus its owner's registration when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackListing {
  #[serde(flatten)]
  pub feedback:   Feedback,
  #[serde(flatten)]
  pub respondent: Option<Respondent>,
}

impl FeedbackListing {
  pub fn group_number(&self) -> Option<u8> {
    self.respondent.as_ref().map(|r| r.group_number)
  }

  fn display_name(&self) -> String {
    self
      .respondent
      .as_ref()
      .map(|r| r.full_name.trim())
      .filter(|n| !n.is_empty())
      .or_else(|| {
        self
          .feedback
          .line_display_name
          .as_deref()
          .map(str::trim)
          .filter(|n| !n.is_empty())
      })
      .unwrap_or("—")
      .to_string()
  }
}

/// Attach registrations to feedback by identity, oldest feedback first.
pub fn join(feedback: Vec<Feedback>, registrations: &[Registration]) -> Vec<FeedbackListing> {
  let by_user: HashMap<&str, &Registration> = registrations
    .iter()
    .map(|r| (r.line_user_id.as_str(), r))
    .collect();

  let mut rows: Vec<FeedbackListing> = feedback
    .into_iter()
    .map(|fb| {
      let respondent = by_user
        .get(fb.line_user_id.as_str())
        .map(|r| Respondent::from(*r));
      FeedbackListing { feedback: fb, respondent }
    })
    .collect();
  rows.sort_by_key(|row| row.feedback.created_at);
  rows
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// Query filters for the `all=true` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
  pub has_phase1:    bool,
  pub has_phase2:    bool,
  /// Empty means every group. Rows without a registration never match a
  /// non-empty group list.
  pub group_numbers: Vec<u8>,
}

impl ListFilter {
  pub fn matches(&self, row: &FeedbackListing) -> bool {
    (!self.has_phase1 || row.feedback.phase1.has_answers())
      && (!self.has_phase2 || row.feedback.phase2.has_answers())
      && matches_groups(&self.group_numbers, row)
  }

  pub fn apply(&self, rows: Vec<FeedbackListing>) -> Vec<FeedbackListing> {
    rows.into_iter().filter(|row| self.matches(row)).collect()
  }
}

/// Parse `"5"` or `"1,2,3"`. Blank input means every group. Tokens that are
/// not group numbers are skipped, but input with no group number at all is
/// rejected rather than read as "every group".
pub fn parse_group_numbers(raw: &str) -> Result<Vec<u8>, Invalid> {
  if raw.trim().is_empty() {
    return Ok(Vec::new());
  }
  let groups: Vec<u8> = raw
    .split(',')
    .filter_map(|t| t.trim().parse::<u8>().ok())
    .filter(|n| *n > 0)
    .collect();
  if groups.is_empty() {
    return Err(Invalid::GroupFilter(raw.trim().to_string()));
  }
  Ok(groups)
}

fn matches_groups(groups: &[u8], row: &FeedbackListing) -> bool {
  groups.is_empty()
    || row
      .group_number()
      .is_some_and(|g| groups.contains(&g))
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryFilter {
  /// Restrict phase-2 sections to one base.
  pub base:          Option<Base>,
  pub group_numbers: Vec<u8>,
}

/// A single non-blank answer and who gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerEntry {
  pub text: String,
  pub name: String,
  pub role: String,
  pub area: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSection {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub base:        Option<Base>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub base_title:  Option<&'static str>,
  pub question_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label:       Option<&'static str>,
  pub answers:     Vec<AnswerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
  /// Respondents left after the group filter.
  pub total:  usize,
  pub phase1: Vec<QuestionSection>,
  pub phase2: Vec<QuestionSection>,
}

/// Aggregate answers per question.
///
/// Phase-2 question ids are not fixed, so each base lists the ids seen in the
/// data, in natural order (`q2` before `q10`).
pub fn summarize(rows: &[FeedbackListing], filter: &SummaryFilter) -> Summary {
  let rows: Vec<&FeedbackListing> = rows
    .iter()
    .filter(|row| matches_groups(&filter.group_numbers, row))
    .collect();

  let phase1 = Phase1Question::iter()
    .map(|q| QuestionSection {
      base:        None,
      base_title:  None,
      question_id: q.as_ref().to_string(),
      label:       Some(q.label()),
      answers:     collect_answers(&rows, |row| Some(row.feedback.phase1.answer(q))),
    })
    .collect();

  let mut phase2 = Vec::new();
  for base in Base::iter().filter(|b| filter.base.is_none_or(|only| only == *b)) {
    let ids: BTreeSet<&str> = rows
      .iter()
      .flat_map(|row| row.feedback.phase2.base(base).keys())
      .map(String::as_str)
      .collect();
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.sort_by(|a, b| natural_cmp(a, b));

    for id in ids {
      phase2.push(QuestionSection {
        base:        Some(base),
        base_title:  Some(base.title()),
        question_id: id.to_string(),
        label:       None,
        answers:     collect_answers(&rows, |row| {
          row.feedback.phase2.base(base).get(id).map(String::as_str)
        }),
      });
    }
  }

  Summary { total: rows.len(), phase1, phase2 }
}

fn collect_answers<'a, F>(rows: &[&'a FeedbackListing], pick: F) -> Vec<AnswerEntry>
where
  F: Fn(&'a FeedbackListing) -> Option<&'a str>,
{
  rows
    .iter()
    .filter_map(|&row| {
      let text = pick(row)?.trim();
      (!text.is_empty()).then(|| AnswerEntry {
        text: text.to_string(),
        name: row.display_name(),
        role: row
          .respondent
          .as_ref()
          .map_or("—", |r| r.role.label())
          .to_string(),
        area: row
          .respondent
          .as_ref()
          .map_or_else(|| "—".to_string(), |r| r.area.clone()),
      })
    })
    .collect()
}

/// Compare `q2` < `q10`: split off the trailing digits and compare those
/// numerically when the prefixes agree.
fn natural_cmp(a: &str, b: &str) -> Ordering {
  fn split(s: &str) -> (&str, Option<u64>) {
    let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (head, tail) = s.split_at(s.len() - digits);
    (head, tail.parse().ok())
  }
  let (ha, na) = split(a);
  let (hb, nb) = split(b);
  ha.cmp(hb).then(na.cmp(&nb)).then_with(|| a.cmp(b))
}
