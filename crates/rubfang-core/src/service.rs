//! [`Survey`]: the upsert and merge rules, over any [`DocumentStore`].
//!
//! Every write is a read-modify-write of one whole collection. Writes to a
//! collection are serialised within the process; across processes the last
//! write wins.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
  Error, Result,
  dashboard::{self, FeedbackListing, ListFilter, Summary, SummaryFilter},
  error::Invalid,
  feedback::{Feedback, FeedbackMeta, FeedbackPatch, FeedbackSubmission, Phase2Answers, Progress},
  registration::{Registration, RegistrationInput, non_blank},
  store::DocumentStore,
};

/// Deployment-specific validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyRules {
  /// Highest accepted `groupNumber`; the lowest is always 1.
  pub max_group_number: u8,
}

impl Default for SurveyRules {
  fn default() -> Self { Self { max_group_number: 30 } }
}

pub struct Survey<S> {
  store:         Arc<S>,
  rules:         SurveyRules,
  registrations: Mutex<()>,
  feedback:      Mutex<()>,
}

impl<S: DocumentStore> Survey<S> {
  pub fn new(store: Arc<S>, rules: SurveyRules) -> Self {
    Self {
      store,
      rules,
      registrations: Mutex::new(()),
      feedback: Mutex::new(()),
    }
  }

  pub fn rules(&self) -> SurveyRules { self.rules }

  // ── Registrations ─────────────────────────────────────────────────────────

  /// Create or replace the registration for the submitted identity.
  ///
  /// On replacement every field is overwritten except `createdAt`.
  pub async fn register(&self, input: RegistrationInput) -> Result<Registration> {
    let new = input.validate(self.rules.max_group_number)?;

    let _guard = self.registrations.lock().await;
    let mut list = self.store.get::<Registration>().await.map_err(Error::store)?;
    let now = Utc::now();

    let record = match list.iter_mut().find(|r| r.line_user_id == new.line_user_id) {
      Some(existing) => {
        *existing = new.into_record(existing.created_at, now);
        existing.clone()
      }
      None => {
        let record = new.into_record(now, now);
        list.push(record.clone());
        record
      }
    };

    self.store.put(list).await.map_err(Error::store)?;
    tracing::debug!(line_user_id = %record.line_user_id, "registration saved");
    Ok(record)
  }

  pub async fn registration(&self, line_user_id: &str) -> Result<Option<Registration>> {
    let list = self.store.get::<Registration>().await.map_err(Error::store)?;
    Ok(list.into_iter().find(|r| r.line_user_id == line_user_id))
  }

  // ── Feedback writes ───────────────────────────────────────────────────────

  /// First submission of phase 1, or a resubmission by the same identity.
  ///
  /// An existing record keeps its id: `phase1` is replaced, supplied bases
  /// are merged, and `lineDisplayName` is refreshed when given.
  pub async fn submit_feedback(&self, input: FeedbackSubmission) -> Result<Feedback> {
    let line_user_id = non_blank(input.line_user_id).ok_or(Invalid::MissingLineUserId)?;
    let phase1 = input
      .phase1
      .filter(|p| p.has_answers())
      .ok_or(Invalid::MissingPhase1)?;
    let line_display_name = non_blank(input.line_display_name);
    let meta = input.meta.and_then(FeedbackMeta::normalized);

    let _guard = self.feedback.lock().await;
    let mut list = self.store.get::<Feedback>().await.map_err(Error::store)?;
    let now = Utc::now();

    let record = match list.iter_mut().find(|f| f.line_user_id == line_user_id) {
      Some(existing) => {
        existing.phase1 = phase1;
        if let Some(patch) = input.phase2 {
          existing.phase2.merge(patch);
        }
        if line_display_name.is_some() {
          existing.line_display_name = line_display_name;
        }
        if meta.is_some() {
          existing.meta = meta;
        }
        existing.updated_at = Some(now);
        existing.clone()
      }
      None => {
        let mut phase2 = Phase2Answers::default();
        if let Some(patch) = input.phase2 {
          phase2.merge(patch);
        }
        let record = Feedback {
          id: Uuid::new_v4(),
          line_user_id,
          line_display_name,
          phase1,
          phase2,
          meta,
          created_at: now,
          updated_at: None,
        };
        list.push(record.clone());
        record
      }
    };

    self.store.put(list).await.map_err(Error::store)?;
    tracing::debug!(id = %record.id, line_user_id = %record.line_user_id, "feedback submitted");
    Ok(record)
  }

  /// Owner-checked partial update: `phase1` replaces, `phase2` merges by base.
  ///
  /// Nothing is written unless the whole update applies.
  pub async fn patch_feedback(&self, patch: FeedbackPatch) -> Result<Feedback> {
    let (Some(id), Some(line_user_id)) = (non_blank(patch.id), non_blank(patch.line_user_id))
    else {
      return Err(Invalid::MissingPatchKeys.into());
    };
    if patch.phase1.is_none() && patch.phase2.is_none() {
      return Err(Invalid::EmptyPatch.into());
    }

    let _guard = self.feedback.lock().await;
    let mut list = self.store.get::<Feedback>().await.map_err(Error::store)?;

    let record = list
      .iter_mut()
      .find(|f| f.id.to_string().eq_ignore_ascii_case(&id))
      .ok_or_else(|| Error::FeedbackNotFound(id.clone()))?;

    if record.line_user_id != line_user_id {
      return Err(Error::NotOwner { id, line_user_id });
    }

    if let Some(phase1) = patch.phase1 {
      record.phase1 = phase1;
    }
    if let Some(phase2) = patch.phase2 {
      record.phase2.merge(phase2);
    }
    record.updated_at = Some(Utc::now());
    let record = record.clone();

    self.store.put(list).await.map_err(Error::store)?;
    tracing::debug!(id = %record.id, "feedback updated");
    Ok(record)
  }

  // ── Feedback reads ────────────────────────────────────────────────────────

  pub async fn feedback_for(&self, line_user_id: &str) -> Result<Option<Feedback>> {
    let list = self.store.get::<Feedback>().await.map_err(Error::store)?;
    Ok(list.into_iter().find(|f| f.line_user_id == line_user_id))
  }

  pub async fn feedback_by_id(&self, id: &str) -> Result<Option<Feedback>> {
    let list = self.store.get::<Feedback>().await.map_err(Error::store)?;
    Ok(list.into_iter().find(|f| f.id.to_string().eq_ignore_ascii_case(id.trim())))
  }

  /// What the identity has answered so far; all-false if nothing.
  pub async fn progress(&self, line_user_id: &str) -> Result<Progress> {
    Ok(
      self
        .feedback_for(line_user_id)
        .await?
        .map(|f| f.progress())
        .unwrap_or_default(),
    )
  }

  /// Every feedback record joined with its owner's registration.
  pub async fn listing(&self, filter: &ListFilter) -> Result<Vec<FeedbackListing>> {
    Ok(filter.apply(self.joined().await?))
  }

  pub async fn summary(&self, filter: &SummaryFilter) -> Result<Summary> {
    Ok(dashboard::summarize(&self.joined().await?, filter))
  }

  async fn joined(&self) -> Result<Vec<FeedbackListing>> {
    let feedback = self.store.get::<Feedback>().await.map_err(Error::store)?;
    let registrations = self.store.get::<Registration>().await.map_err(Error::store)?;
    Ok(dashboard::join(feedback, &registrations))
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use serde_json::json;

  use super::*;
  use crate::{
    feedback::{Base, Phase1Answers, Phase2Patch},
    memory::MemoryStore,
    registration::Role,
  };

  fn survey() -> Survey<MemoryStore> {
    Survey::new(Arc::new(MemoryStore::new()), SurveyRules::default())
  }

  fn registration(user: &str, name: &str, group: i64) -> RegistrationInput {
    serde_json::from_value(json!({
      "lineUserId": user,
      "fullName": name,
      "role": "mp_list",
      "groupNumber": group
    }))
    .unwrap()
  }

  fn phase1(q1: &str) -> Phase1Answers {
    Phase1Answers { q1: q1.into(), q2: "b".into(), q3: "c".into() }
  }

  fn submission(user: &str, q1: &str) -> FeedbackSubmission {
    FeedbackSubmission {
      line_user_id: Some(user.into()),
      phase1: Some(phase1(q1)),
      ..Default::default()
    }
  }

  fn base_answers(pairs: &[(&str, &str)]) -> crate::feedback::BaseAnswers {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  // ── Registration ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn reregistration_keeps_one_record_and_created_at() {
    let s = survey();
    let first = s.register(registration("U1", "First", 5)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = s.register(registration("U1", "Second", 6)).await.unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);

    let all = s.store.get::<Registration>().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].full_name, "Second");
    assert_eq!(all[0].group_number, 6);
  }

  #[tokio::test]
  async fn role_change_clears_area_fields() {
    let s = survey();
    let input: RegistrationInput = serde_json::from_value(json!({
      "lineUserId": "U1",
      "fullName": "Test",
      "role": "provincial_team",
      "province": "chiangmai",
      "groupNumber": 2
    }))
    .unwrap();
    s.register(input).await.unwrap();
    s.register(registration("U1", "Test", 2)).await.unwrap();

    let stored = s.registration("U1").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::MpList);
    assert_eq!(stored.province, None);
  }

  #[tokio::test]
  async fn invalid_registration_writes_nothing() {
    let s = survey();
    let err = s.register(registration("U1", "Test", 31)).await.unwrap_err();
    assert!(matches!(err, Error::Invalid(Invalid::GroupNumberOutOfRange { max: 30 })));
    assert!(s.registration("U1").await.unwrap().is_none());
  }

  // ── Feedback ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn resubmitting_phase1_keeps_the_same_record() {
    let s = survey();
    let first = s.submit_feedback(submission("U1", "a")).await.unwrap();
    assert_eq!(first.phase2, Phase2Answers::default());
    assert_eq!(first.updated_at, None);

    let second = s.submit_feedback(submission("U1", "changed")).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.phase1.q1, "changed");
    assert!(second.updated_at.is_some());

    let all = s.store.get::<Feedback>().await.unwrap();
    assert_eq!(all.len(), 1);
  }

  #[tokio::test]
  async fn resubmission_merges_phase2_and_keeps_display_name() {
    let s = survey();
    let mut input = submission("U1", "a");
    input.line_display_name = Some("LINE name".into());
    input.phase2 = Some(Phase2Patch::single(Base::Base1, base_answers(&[("q1", "x")])));
    s.submit_feedback(input).await.unwrap();

    let mut again = submission("U1", "a");
    again.phase2 = Some(Phase2Patch::single(Base::Base2, base_answers(&[("q1", "y")])));
    let merged = s.submit_feedback(again).await.unwrap();

    assert_eq!(merged.phase2.base1, base_answers(&[("q1", "x")]));
    assert_eq!(merged.phase2.base2, base_answers(&[("q1", "y")]));
    assert_eq!(merged.line_display_name.as_deref(), Some("LINE name"));
  }

  #[tokio::test]
  async fn meta_is_stored_and_kept_when_omitted() {
    let s = survey();
    let mut input = submission("U1", "a");
    input.meta = Some(FeedbackMeta { area: Some(" เขต 3 ".into()), name: None });
    let created = s.submit_feedback(input).await.unwrap();
    assert_eq!(
      created.meta,
      Some(FeedbackMeta { area: Some("เขต 3".into()), name: None })
    );

    let again = s.submit_feedback(submission("U1", "b")).await.unwrap();
    assert_eq!(again.meta, created.meta);

    let stored = s.feedback_for("U1").await.unwrap().unwrap();
    assert_eq!(stored.meta, created.meta);
  }

  #[tokio::test]
  async fn submission_requires_identity_and_answers() {
    let s = survey();
    let err = s
      .submit_feedback(FeedbackSubmission {
        phase1: Some(phase1("a")),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Invalid(Invalid::MissingLineUserId)));

    let err = s
      .submit_feedback(FeedbackSubmission {
        line_user_id: Some("U1".into()),
        phase1: Some(Phase1Answers::default()),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Invalid(Invalid::MissingPhase1)));
  }

  #[tokio::test]
  async fn patch_by_other_identity_is_refused_and_changes_nothing() {
    let s = survey();
    let created = s.submit_feedback(submission("U1", "a")).await.unwrap();

    let err = s
      .patch_feedback(FeedbackPatch {
        id: Some(created.id.to_string()),
        line_user_id: Some("U2".into()),
        phase1: Some(phase1("hijacked")),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NotOwner { .. }));

    let stored = s.feedback_by_id(&created.id.to_string()).await.unwrap().unwrap();
    assert_eq!(stored, created);
  }

  #[tokio::test]
  async fn patch_base2_keeps_base1() {
    let s = survey();
    let created = s.submit_feedback(submission("U1", "a")).await.unwrap();

    for (base, key) in [(Base::Base1, "qA"), (Base::Base2, "qB")] {
      s.patch_feedback(FeedbackPatch {
        id: Some(created.id.to_string()),
        line_user_id: Some("U1".into()),
        phase2: Some(Phase2Patch::single(base, base_answers(&[(key, "v")]))),
        ..Default::default()
      })
      .await
      .unwrap();
    }

    let stored = s.feedback_for("U1").await.unwrap().unwrap();
    assert_eq!(stored.phase1, created.phase1);
    assert_eq!(stored.phase2.base1, base_answers(&[("qA", "v")]));
    assert_eq!(stored.phase2.base2, base_answers(&[("qB", "v")]));
    assert_eq!(
      s.progress("U1").await.unwrap().submitted_bases,
      vec![Base::Base1, Base::Base2]
    );
  }

  #[tokio::test]
  async fn patch_errors() {
    let s = survey();
    let created = s.submit_feedback(submission("U1", "a")).await.unwrap();

    let err = s
      .patch_feedback(FeedbackPatch {
        id: Some(created.id.to_string()),
        line_user_id: Some("U1".into()),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Invalid(Invalid::EmptyPatch)));

    let err = s
      .patch_feedback(FeedbackPatch {
        id: Some(Uuid::new_v4().to_string()),
        line_user_id: Some("U1".into()),
        phase1: Some(phase1("x")),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::FeedbackNotFound(_)));

    let err = s
      .patch_feedback(FeedbackPatch { id: Some(created.id.to_string()), ..Default::default() })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Invalid(Invalid::MissingPatchKeys)));
  }

  #[tokio::test]
  async fn unknown_identity_reads_as_none() {
    let s = survey();
    assert!(s.feedback_for("nobody").await.unwrap().is_none());
    assert_eq!(s.progress("nobody").await.unwrap(), Progress::default());
  }

  #[tokio::test]
  async fn listing_joins_registrations() {
    let s = survey();
    s.register(registration("U1", "Registered", 7)).await.unwrap();
    s.submit_feedback(submission("U1", "a")).await.unwrap();
    s.submit_feedback(submission("U2", "b")).await.unwrap();

    let rows = s.listing(&ListFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].group_number(), Some(7));
    assert_eq!(rows[1].group_number(), None);

    let group7 = s
      .listing(&ListFilter { group_numbers: vec![7], ..Default::default() })
      .await
      .unwrap();
    assert_eq!(group7.len(), 1);

    let summary = s.summary(&SummaryFilter::default()).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.phase1[0].answers.len(), 2);
  }

  #[tokio::test]
  async fn concurrent_first_submissions_are_all_kept() {
    let s = Arc::new(survey());
    let tasks: Vec<_> = (0..16)
      .map(|i| {
        let s = s.clone();
        tokio::spawn(async move { s.submit_feedback(submission(&format!("U{i}"), "a")).await })
      })
      .collect();
    for t in tasks {
      t.await.unwrap().unwrap();
    }
    let all = s.store.get::<Feedback>().await.unwrap();
    assert_eq!(all.len(), 16);
  }
}
