//! Conversion between records and the rows that hold them.

use rubfang_core::store::Record;

use crate::Result;

/// One collection row, ready for binding.
pub struct RawRow {
  pub record_key:   String,
  pub line_user_id: String,
  pub position:     i64,
  pub body:         String,
}

pub fn encode_rows<R: Record>(records: &[R]) -> Result<Vec<RawRow>> {
  records
    .iter()
    .zip(0_i64..)
    .map(|(record, position)| {
      Ok(RawRow {
        record_key: record.key(),
        line_user_id: record.line_user_id().to_owned(),
        position,
        body: serde_json::to_string(record)?,
      })
    })
    .collect()
}

pub fn decode_bodies<R: Record>(bodies: Vec<String>) -> Result<Vec<R>> {
  bodies
    .iter()
    .map(|body| Ok(serde_json::from_str(body)?))
    .collect()
}
