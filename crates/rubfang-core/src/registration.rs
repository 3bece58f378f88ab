//! Respondent registration: one record per LINE identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  error::Invalid,
  store::{Collection, Record},
};

// ─── Role ────────────────────────────────────────────────────────────────────

/// What the respondent does for the party.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  /// Constituency candidate; carries `provinceId` and `districtId`.
  MpConstituency,
  /// Party-list candidate.
  MpList,
  /// Provincial team member; carries `province`.
  ProvincialTeam,
  /// Party centre staff.
  FaTeam,
}

impl Role {
  /// Display label used on the dashboard.
  pub fn label(self) -> &'static str {
    match self {
      Role::MpConstituency => "ผู้สมัคร สส. เขต",
      Role::MpList => "ผู้สมัคร สส. บัญชีรายชื่อ",
      Role::ProvincialTeam => "ทีมจังหวัด",
      Role::FaTeam => "ทีมฟา",
    }
  }
}

// ─── Stored record ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub line_user_id:      String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub line_display_name: Option<String>,
  pub full_name:         String,
  pub role:              Role,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub province_id:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub district_id:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub province:          Option<String>,
  pub group_number:      u8,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl Registration {
  /// Human-readable area: `"<province> เขต <district>"` for constituency
  /// candidates, the province for provincial teams, `"—"` otherwise.
  pub fn area(&self) -> String {
    match (&self.province_id, &self.district_id, &self.province) {
      (Some(p), Some(d), _) => format!("{p} เขต {d}"),
      (_, _, Some(p)) => p.clone(),
      _ => "—".to_string(),
    }
  }
}

impl Record for Registration {
  const COLLECTION: Collection = Collection::Registrations;

  fn key(&self) -> String { self.line_user_id.clone() }

  fn line_user_id(&self) -> &str { &self.line_user_id }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// `groupNumber` as submitted: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GroupNumber {
  Number(serde_json::Number),
  Text(String),
}

impl GroupNumber {
  /// The integral value, if the submission is a whole number.
  pub fn as_integer(&self) -> Option<i64> {
    let value = match self {
      GroupNumber::Number(n) => {
        if let Some(i) = n.as_i64() {
          return Some(i);
        }
        n.as_f64()?
      }
      GroupNumber::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
  }
}

impl From<i64> for GroupNumber {
  fn from(n: i64) -> Self { GroupNumber::Number(n.into()) }
}

/// Body of `POST /registration`, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
  pub line_user_id:      Option<String>,
  pub line_display_name: Option<String>,
  pub full_name:         Option<String>,
  pub role:              Option<String>,
  pub province_id:       Option<String>,
  pub district_id:       Option<String>,
  pub province:          Option<String>,
  pub group_number:      Option<GroupNumber>,
}

/// A registration that passed validation, ready to be stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
  pub line_user_id:      String,
  pub line_display_name: Option<String>,
  pub full_name:         String,
  pub role:              Role,
  pub province_id:       Option<String>,
  pub district_id:       Option<String>,
  pub province:          Option<String>,
  pub group_number:      u8,
}

impl RegistrationInput {
  /// Check required fields and the group bound, and drop the
  /// role-conditioned fields that do not apply to the submitted role.
  pub fn validate(self, max_group_number: u8) -> Result<NewRegistration, Invalid> {
    let (Some(line_user_id), Some(full_name), Some(role)) = (
      non_blank(self.line_user_id),
      non_blank(self.full_name),
      non_blank(self.role),
    ) else {
      return Err(Invalid::MissingRegistrationFields);
    };

    let role: Role = role.parse().map_err(|_| Invalid::UnknownRole(role))?;

    let group_number = self
      .group_number
      .as_ref()
      .and_then(GroupNumber::as_integer)
      .filter(|n| (1..=i64::from(max_group_number)).contains(n))
      .ok_or(Invalid::GroupNumberOutOfRange { max: max_group_number })?;

    let (province_id, district_id, province) = match role {
      Role::MpConstituency => {
        match (non_blank(self.province_id), non_blank(self.district_id)) {
          (Some(p), Some(d)) => (Some(p), Some(d), None),
          _ => return Err(Invalid::MissingConstituency),
        }
      }
      Role::ProvincialTeam => match non_blank(self.province) {
        Some(p) => (None, None, Some(p)),
        None => return Err(Invalid::MissingProvince),
      },
      Role::MpList | Role::FaTeam => (None, None, None),
    };

    Ok(NewRegistration {
      line_user_id,
      line_display_name: non_blank(self.line_display_name),
      full_name,
      role,
      province_id,
      district_id,
      province,
      group_number: group_number as u8,
    })
  }
}

impl NewRegistration {
  pub fn into_record(
    self,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
  ) -> Registration {
    Registration {
      line_user_id: self.line_user_id,
      line_display_name: self.line_display_name,
      full_name: self.full_name,
      role: self.role,
      province_id: self.province_id,
      district_id: self.district_id,
      province: self.province,
      group_number: self.group_number,
      created_at,
      updated_at,
    }
  }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn input(value: serde_json::Value) -> RegistrationInput {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn list_candidate_drops_area_fields() {
    let reg = input(json!({
      "lineUserId": "U1",
      "fullName": "  Test  ",
      "role": "mp_list",
      "provinceId": "bangkok",
      "districtId": "bkk-1",
      "province": "bangkok",
      "groupNumber": 5
    }))
    .validate(30)
    .unwrap();

    assert_eq!(reg.full_name, "Test");
    assert_eq!(reg.role, Role::MpList);
    assert_eq!(reg.province_id, None);
    assert_eq!(reg.district_id, None);
    assert_eq!(reg.province, None);
  }

  #[test]
  fn constituency_keeps_province_and_district_only() {
    let reg = input(json!({
      "lineUserId": "U1",
      "fullName": "Test",
      "role": "mp_constituency",
      "provinceId": "bangkok",
      "districtId": "bkk-1",
      "province": "ignored",
      "groupNumber": 1
    }))
    .validate(30)
    .unwrap();

    assert_eq!(reg.province_id.as_deref(), Some("bangkok"));
    assert_eq!(reg.district_id.as_deref(), Some("bkk-1"));
    assert_eq!(reg.province, None);
  }

  #[test]
  fn constituency_without_district_is_rejected() {
    let err = input(json!({
      "lineUserId": "U1",
      "fullName": "Test",
      "role": "mp_constituency",
      "provinceId": "bangkok",
      "groupNumber": 1
    }))
    .validate(30)
    .unwrap_err();
    assert_eq!(err, Invalid::MissingConstituency);
  }

  #[test]
  fn provincial_team_requires_province() {
    let err = input(json!({
      "lineUserId": "U1",
      "fullName": "Test",
      "role": "provincial_team",
      "groupNumber": 1
    }))
    .validate(30)
    .unwrap_err();
    assert_eq!(err, Invalid::MissingProvince);
  }

  #[test]
  fn group_number_bounds() {
    for bad in [json!(0), json!(31), json!(-1), json!(2.5), json!("x"), json!(null)] {
      let err = input(json!({
        "lineUserId": "U1",
        "fullName": "Test",
        "role": "fa_team",
        "groupNumber": bad
      }))
      .validate(30)
      .unwrap_err();
      assert_eq!(err, Invalid::GroupNumberOutOfRange { max: 30 }, "{bad}");
    }

    for good in [json!(1), json!(30), json!("12"), json!(7.0)] {
      let result = input(json!({
        "lineUserId": "U1",
        "fullName": "Test",
        "role": "fa_team",
        "groupNumber": good
      }))
      .validate(30);
      assert!(result.is_ok(), "{good}");
    }
  }

  #[test]
  fn wider_bound_accepts_forty() {
    let reg = input(json!({
      "lineUserId": "U1",
      "fullName": "Test",
      "role": "fa_team",
      "groupNumber": 40
    }))
    .validate(40)
    .unwrap();
    assert_eq!(reg.group_number, 40);
  }

  #[test]
  fn missing_required_fields() {
    let err = input(json!({ "lineUserId": "U1", "fullName": "   ", "role": "mp_list" }))
      .validate(30)
      .unwrap_err();
    assert_eq!(err, Invalid::MissingRegistrationFields);
  }

  #[test]
  fn unknown_role() {
    let err = input(json!({
      "lineUserId": "U1",
      "fullName": "Test",
      "role": "mayor",
      "groupNumber": 1
    }))
    .validate(30)
    .unwrap_err();
    assert_eq!(err, Invalid::UnknownRole("mayor".into()));
  }

  #[test]
  fn area_labels() {
    let now = Utc::now();
    let mut reg = NewRegistration {
      line_user_id:      "U1".into(),
      line_display_name: None,
      full_name:         "Test".into(),
      role:              Role::MpConstituency,
      province_id:       Some("bangkok".into()),
      district_id:       Some("3".into()),
      province:          None,
      group_number:      1,
    }
    .into_record(now, now);
    assert_eq!(reg.area(), "bangkok เขต 3");

    reg.province_id = None;
    reg.district_id = None;
    reg.province = Some("เชียงใหม่".into());
    assert_eq!(reg.area(), "เชียงใหม่");

    reg.province = None;
    assert_eq!(reg.area(), "—");
  }
}
