//! The LINE login and registration gate as an explicit state machine.
//!
//! The gate sits in front of the questionnaire. Content is shown only in
//! [`GateState::Registered`]. The machine is pure: callers feed it what the
//! identity provider and the registration lookup reported and render
//! whatever state comes back.
//!
//! ```text
//!  NotReady ──ready(no profile)──▶ LoggedOut ──logged in──▶ CheckingRegistration
//!     │                                ▲                        │         │
//!     │ failed / no client id          │ logout          found  │         │ missing
//!     ▼                                │                        ▼         ▼
//!   Error (terminal)                   └──────────── Registered ◀─▶ Unregistered
//!                                                        edit profile / saved
//! ```

/// The identity the provider reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
  pub user_id:      String,
  pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
  /// The provider has not finished initialising.
  NotReady,
  /// Missing configuration or a provider failure. Nothing leaves this state
  /// for the rest of the session.
  Error(String),
  LoggedOut,
  /// Logged in; the registration lookup is in flight. `edit` records an
  /// edit-profile request that arrived before the lookup finished.
  CheckingRegistration { profile: Profile, edit: bool },
  /// Logged in, registration form shown.
  Unregistered(Profile),
  /// Logged in and registered; the wrapped content is shown.
  Registered(Profile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
  /// The provider initialised. `profile` is set when a session already exists.
  ProviderReady { profile: Option<Profile> },
  /// Initialisation or login failed.
  ProviderFailed(String),
  LoggedIn(Profile),
  /// The registration lookup answered: `true` if a record exists.
  RegistrationChecked(bool),
  /// The lookup request itself failed; treated as "not registered".
  RegistrationLookupFailed,
  /// The registration form was submitted successfully.
  RegistrationSaved,
  /// The respondent asked to edit their profile.
  EditProfile,
  LoggedOut,
}

/// Message shown when the login client id is not configured.
pub const MISSING_CLIENT_ID: &str = "ไม่ได้ตั้งค่า LINE client id";

impl GateState {
  /// Initial state for a session. Without a client id the provider can never
  /// initialise, so the gate starts in [`GateState::Error`].
  pub fn start(client_id: Option<&str>) -> Self {
    match client_id.map(str::trim) {
      Some(id) if !id.is_empty() => GateState::NotReady,
      _ => GateState::Error(MISSING_CLIENT_ID.to_string()),
    }
  }

  /// Apply `event`. Events that make no sense in the current state leave it
  /// unchanged.
  pub fn on(self, event: GateEvent) -> Self {
    use GateEvent as E;
    use GateState as S;

    match (self, event) {
      (state @ S::Error(_), _) => state,

      (_, E::ProviderFailed(message)) => S::Error(message),

      (S::NotReady, E::ProviderReady { profile: None }) => S::LoggedOut,
      (S::NotReady, E::ProviderReady { profile: Some(profile) })
      | (S::LoggedOut, E::LoggedIn(profile)) => {
        S::CheckingRegistration { profile, edit: false }
      }

      (S::CheckingRegistration { profile, edit }, E::RegistrationChecked(found)) => {
        if found && !edit {
          S::Registered(profile)
        } else {
          S::Unregistered(profile)
        }
      }
      (S::CheckingRegistration { profile, .. }, E::RegistrationLookupFailed) => {
        S::Unregistered(profile)
      }
      (S::CheckingRegistration { profile, .. }, E::EditProfile) => {
        S::CheckingRegistration { profile, edit: true }
      }

      (S::Unregistered(profile), E::RegistrationSaved) => S::Registered(profile),
      (S::Registered(profile), E::EditProfile) => S::Unregistered(profile),

      (
        S::CheckingRegistration { .. } | S::Unregistered(_) | S::Registered(_),
        E::LoggedOut,
      ) => S::LoggedOut,

      (state, _) => state,
    }
  }

  /// `true` only when the wrapped content may be rendered.
  pub fn shows_content(&self) -> bool { matches!(self, GateState::Registered(_)) }

  /// The logged-in identity, if any.
  pub fn profile(&self) -> Option<&Profile> {
    match self {
      GateState::CheckingRegistration { profile, .. }
      | GateState::Unregistered(profile)
      | GateState::Registered(profile) => Some(profile),
      _ => None,
    }
  }

  /// The identity whose registration must be looked up next, if any.
  pub fn pending_lookup(&self) -> Option<&str> {
    match self {
      GateState::CheckingRegistration { profile, .. } => Some(&profile.user_id),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn alice() -> Profile {
    Profile { user_id: "U1".into(), display_name: "Alice".into() }
  }

  fn run(start: GateState, events: impl IntoIterator<Item = GateEvent>) -> GateState {
    events.into_iter().fold(start, GateState::on)
  }

  #[test]
  fn missing_client_id_is_an_error() {
    assert_eq!(
      GateState::start(None),
      GateState::Error(MISSING_CLIENT_ID.to_string())
    );
    assert!(matches!(GateState::start(Some("  ")), GateState::Error(_)));
    assert_eq!(GateState::start(Some("liff-1")), GateState::NotReady);
  }

  #[test]
  fn login_then_registration() {
    let state = run(GateState::NotReady, [
      GateEvent::ProviderReady { profile: None },
      GateEvent::LoggedIn(alice()),
    ]);
    assert_eq!(state.pending_lookup(), Some("U1"));
    assert!(!state.shows_content());

    let state = state.on(GateEvent::RegistrationChecked(false));
    assert_eq!(state, GateState::Unregistered(alice()));

    let state = state.on(GateEvent::RegistrationSaved);
    assert!(state.shows_content());
  }

  #[test]
  fn existing_session_and_registration_show_content() {
    let state = run(GateState::NotReady, [
      GateEvent::ProviderReady { profile: Some(alice()) },
      GateEvent::RegistrationChecked(true),
    ]);
    assert_eq!(state, GateState::Registered(alice()));
  }

  #[test]
  fn edit_profile_overrides_registration() {
    let registered = GateState::Registered(alice());
    assert_eq!(
      registered.on(GateEvent::EditProfile),
      GateState::Unregistered(alice())
    );

    let early_edit = run(GateState::LoggedOut, [
      GateEvent::LoggedIn(alice()),
      GateEvent::EditProfile,
      GateEvent::RegistrationChecked(true),
    ]);
    assert_eq!(early_edit, GateState::Unregistered(alice()));
  }

  #[test]
  fn lookup_failure_shows_registration_form() {
    let state = run(GateState::LoggedOut, [
      GateEvent::LoggedIn(alice()),
      GateEvent::RegistrationLookupFailed,
    ]);
    assert_eq!(state, GateState::Unregistered(alice()));
  }

  #[test]
  fn error_is_terminal() {
    let state = run(GateState::NotReady, [
      GateEvent::ProviderFailed("init failed".into()),
      GateEvent::ProviderReady { profile: Some(alice()) },
      GateEvent::LoggedIn(alice()),
      GateEvent::RegistrationChecked(true),
    ]);
    assert_eq!(state, GateState::Error("init failed".into()));
    assert!(state.profile().is_none());
  }

  #[test]
  fn logout_returns_to_login() {
    let state = run(GateState::Registered(alice()), [GateEvent::LoggedOut]);
    assert_eq!(state, GateState::LoggedOut);
    assert_eq!(state.on(GateEvent::RegistrationSaved), GateState::LoggedOut);
  }

  #[test]
  fn out_of_order_events_are_ignored() {
    assert_eq!(
      GateState::NotReady.on(GateEvent::RegistrationChecked(true)),
      GateState::NotReady
    );
    assert_eq!(
      GateState::Unregistered(alice()).on(GateEvent::LoggedIn(alice())),
      GateState::Unregistered(alice())
    );
  }
}
