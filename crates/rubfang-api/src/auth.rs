//! Dashboard password login and the signed session cookie.
//!
//! A correct password earns a `dashboard_access` cookie whose value is
//! `<expiry>.<hex hmac-sha256 of expiry>`. The cookie is checked by the
//! [`DashboardSession`] extractor, or by [`DashboardAuth::authorize`] where
//! only some query shapes need it.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  extract::{FromRequestParts, State, rejection::JsonRejection},
  http::request::Parts,
  response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac, digest::InvalidLength};
use rand_core::{OsRng, RngCore as _};
use rubfang_core::store::DocumentStore;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::{AppState, error::ApiError};

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "dashboard_access";
const SESSION_PATH: &str = "/dashboard";
const SESSION_TTL_SECS: i64 = 60 * 60 * 24;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Dashboard credentials and session signing key for this instance.
#[derive(Clone)]
pub struct DashboardAuth {
  /// PHC string produced by argon2. `None` disables dashboard login.
  password_hash:  Option<String>,
  mac:            HmacSha256,
  secure_cookies: bool,
}

impl DashboardAuth {
  /// Build from configuration. Without a `session_secret` a random key is
  /// generated, so sessions do not survive a restart.
  pub fn new(
    password_hash: Option<String>,
    session_secret: Option<&str>,
    secure_cookies: bool,
  ) -> Result<Self, InvalidLength> {
    let mac = match session_secret.filter(|s| !s.is_empty()) {
      Some(secret) => HmacSha256::new_from_slice(secret.as_bytes())?,
      None => {
        let mut key = [0_u8; 32];
        OsRng.fill_bytes(&mut key);
        HmacSha256::new_from_slice(&key)?
      }
    };
    Ok(Self {
      password_hash: password_hash.filter(|h| !h.trim().is_empty()),
      mac,
      secure_cookies,
    })
  }

  /// Check `password` against the configured hash.
  pub fn verify_password(&self, password: &str) -> Result<(), ApiError> {
    let Some(hash) = &self.password_hash else {
      return Err(ApiError::Misconfigured("ไม่ได้ตั้งค่ารหัสผ่าน Dashboard".to_string()));
    };
    let parsed = PasswordHash::new(hash).map_err(|e| {
      tracing::error!(error = %e, "dashboard password hash is not a valid PHC string");
      ApiError::Misconfigured("ไม่ได้ตั้งค่ารหัสผ่าน Dashboard".to_string())
    })?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| ApiError::Unauthorized("รหัสผ่านไม่ถูกต้อง".to_string()))
  }

  fn sign(&self, payload: &str) -> HmacSha256 {
    let mut mac = self.mac.clone();
    mac.update(payload.as_bytes());
    mac
  }

  /// A session token valid until `now` plus one day.
  pub fn issue(&self, now: DateTime<Utc>) -> String {
    let expiry = (now + Duration::seconds(SESSION_TTL_SECS)).timestamp().to_string();
    let signature = hex::encode(self.sign(&expiry).finalize().into_bytes());
    format!("{expiry}.{signature}")
  }

  /// `true` if `token` was issued by this instance and has not expired.
  pub fn validate(&self, token: &str, now: DateTime<Utc>) -> bool {
    let Some((expiry, signature)) = token.split_once('.') else {
      return false;
    };
    let Ok(expires_at) = expiry.parse::<i64>() else {
      return false;
    };
    let Ok(signature) = hex::decode(signature) else {
      return false;
    };
    expires_at > now.timestamp() && self.sign(expiry).verify_slice(&signature).is_ok()
  }

  /// Session cookie carrying `token`.
  pub fn cookie(&self, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
      .path(SESSION_PATH)
      .max_age(time::Duration::seconds(SESSION_TTL_SECS))
      .http_only(true)
      .same_site(SameSite::Lax)
      .secure(self.secure_cookies)
      .build()
  }

  /// `Ok` if `jar` holds a valid session cookie.
  pub fn authorize(&self, jar: &CookieJar, now: DateTime<Utc>) -> Result<(), ApiError> {
    match jar.get(SESSION_COOKIE) {
      Some(cookie) if self.validate(cookie.value(), now) => Ok(()),
      _ => Err(ApiError::Unauthorized("กรุณาเข้าสู่ระบบ Dashboard".to_string())),
    }
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Zero-size marker: present in the handler means the request carried a
/// valid dashboard session.
pub struct DashboardSession;

impl<S> FromRequestParts<AppState<S>> for DashboardSession
where
  S: DocumentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let jar = CookieJar::from_headers(&parts.headers);
    state.auth.authorize(&jar, Utc::now())?;
    Ok(DashboardSession)
  }
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub password: String,
}

/// `POST /api/dashboard-auth`: body: `{"password":"..."}`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + 'static,
{
  let Json(body) = body?;
  if let Err(e) = state.auth.verify_password(&body.password) {
    if matches!(e, ApiError::Unauthorized(_)) {
      tracing::warn!("rejected dashboard login");
    }
    return Err(e);
  }

  let token = state.auth.issue(Utc::now());
  Ok((jar.add(state.auth.cookie(token)), Json(json!({ "ok": true }))))
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::{HeaderMap, HeaderValue, header};

  use super::*;

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn auth(secret: Option<&str>) -> DashboardAuth {
    DashboardAuth::new(Some(hash("secret")), secret, false).unwrap()
  }

  #[test]
  fn password_check() {
    let auth = auth(None);
    assert!(auth.verify_password("secret").is_ok());
    assert!(matches!(
      auth.verify_password("wrong"),
      Err(ApiError::Unauthorized(_))
    ));
  }

  #[test]
  fn missing_hash_is_misconfiguration() {
    let auth = DashboardAuth::new(None, None, false).unwrap();
    assert!(matches!(
      auth.verify_password("anything"),
      Err(ApiError::Misconfigured(_))
    ));
  }

  #[test]
  fn issued_token_validates_until_expiry() {
    let auth = auth(Some("key"));
    let now = Utc::now();
    let token = auth.issue(now);

    assert!(auth.validate(&token, now));
    assert!(auth.validate(&token, now + Duration::hours(23)));
    assert!(!auth.validate(&token, now + Duration::hours(25)));
  }

  #[test]
  fn tampered_or_foreign_tokens_are_rejected() {
    let auth = auth(Some("key"));
    let now = Utc::now();
    let token = auth.issue(now);

    let (expiry, signature) = token.split_once('.').unwrap();
    let later: i64 = expiry.parse::<i64>().unwrap() + 3600;
    assert!(!auth.validate(&format!("{later}.{signature}"), now));
    assert!(!auth.validate("1", now));
    assert!(!auth.validate("abc.zz", now));

    let other = DashboardAuth::new(None, Some("other key"), false).unwrap();
    assert!(!other.validate(&token, now));
  }

  #[test]
  fn cookie_attributes() {
    let cookie = auth(None).cookie("t".into());
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "t");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/dashboard"));
    assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86400)));
    assert!(!cookie.to_string().contains("Secure"));

    let secure = DashboardAuth::new(None, None, true).unwrap().cookie("t".into());
    assert_eq!(secure.secure(), Some(true));
    assert!(secure.to_string().contains("Secure"));
  }

  #[test]
  fn session_is_found_among_other_cookies() {
    let auth = auth(Some("key"));
    let now = Utc::now();
    let token = auth.issue(now);

    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_str(&format!("theme=dark; dashboard_access={token}; lang=th")).unwrap(),
    );
    let jar = CookieJar::from_headers(&headers);
    assert!(auth.authorize(&jar, now).is_ok());

    assert!(matches!(
      auth.authorize(&CookieJar::new(), now),
      Err(ApiError::Unauthorized(_))
    ));
  }
}
