//! Authenticated client for The Gym Group mobile API.
//!
//! # Design
//! `GymClient` owns the session (cookies and fixed headers), the credentials
//! and the identifiers learned at login. Every call goes through
//! `GymClient::request`, which re-authenticates once when the server
//! answers 403 and then replays the original request with retry disabled,
//! so an expired session costs one extra round-trip and a bad one can never
//! loop. Successful logins are snapshotted to the state file so the next
//! process can skip authentication entirely.

use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpResponse, Transport, UreqTransport};
use crate::session::Session;
use crate::state::{Identity, PersistedState, StateStore};

pub const ENDPOINT_LOGIN: &str = "exerciser/login";

/// Blocking client for the Netpulse-hosted Gym Group API.
pub struct GymClient<T = UreqTransport> {
    username: String,
    password: String,
    base_url: String,
    store: StateStore,
    session: Session,
    transport: T,
    user_id: Option<String>,
    home_gym: Option<String>,
}

impl GymClient<UreqTransport> {
    /// Client against the vendor API, keeping state in `state.json`.
    pub fn new(username: &str, password: &str) -> Self {
        Self::with_config(ClientConfig::new(username, password))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> GymClient<T> {
    /// Restore the saved session or, failing that, log in.
    ///
    /// A failed login is logged and leaves the client without identifiers;
    /// later calls fail until `login` succeeds.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let mut client = Self {
            username: config.username,
            password: config.password,
            base_url: config.base_url,
            store: StateStore::new(config.state_file),
            session: Session::new(),
            transport,
            user_id: None,
            home_gym: None,
        };

        if !client.load_state() {
            debug!("state file didn't exist or failed to load, logging in..");
            if let Err(e) = client.login() {
                error!("authentication failed, check credentials: {e}");
            }
        }

        client
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn home_gym(&self) -> Option<&str> {
        self.home_gym.as_deref()
    }

    fn load_state(&mut self) -> bool {
        let Some((state, identity)) = self.store.load() else {
            return false;
        };
        self.session.extend_cookies(state.cookies);
        self.user_id = Some(identity.user_id);
        self.home_gym = Some(identity.home_gym);
        debug!("restored session for UUID {:?}", self.user_id);
        true
    }

    /// Send `method` to `path` (relative to the base URL) with the session's
    /// cookies and headers.
    ///
    /// Only GET and POST are accepted. A 403 with `allow_retry` set triggers
    /// one login followed by one replay of the request with retry disabled.
    /// Transport failures and any other non-2xx status fail immediately.
    pub(crate) fn request(
        &mut self,
        method: HttpMethod,
        path: &str,
        form: Option<&[(&str, &str)]>,
        allow_retry: bool,
    ) -> Result<HttpResponse, ApiError> {
        if !matches!(method, HttpMethod::Get | HttpMethod::Post) {
            error!("invalid HTTP method {method} passed to request");
            return Err(ApiError::UnsupportedMethod(method));
        }

        let url = self.resolve(path)?;
        debug!("API {method} to URL '{url}'..");

        let request = self.session.build_request(method, url, form);
        let response = match self.transport.execute(&request) {
            Ok(response) => response,
            Err(e) => {
                error!("{e} on API {method}");
                return Err(e.into());
            }
        };
        self.session.store_cookies(&response);

        if response.is_success() {
            debug!("API {method} to '{path}' succeeded with HTTP {}", response.status);
            return Ok(response);
        }

        error!("HTTP error {} on API {method} to '{path}'", response.status);
        if response.status != 403 {
            return Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            });
        }
        if !allow_retry {
            return Err(ApiError::Forbidden {
                body: response.body,
            });
        }

        error!("server returned auth failure, logging in..");
        if let Err(e) = self.login() {
            error!("authentication retry failed: {e}");
            return Err(e);
        }
        self.request(method, path, form, false)
    }

    fn resolve(&self, path: &str) -> Result<String, ApiError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        let url = base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;
        Ok(url.into())
    }

    /// Authenticate with the stored credentials and persist the new session.
    ///
    /// Fails without touching the network when either credential is empty.
    /// A state file that cannot be written is logged; the in-memory session
    /// stays usable.
    pub fn login(&mut self) -> Result<(), ApiError> {
        if self.username.is_empty() || self.password.is_empty() {
            error!("username or password were not specified");
            return Err(ApiError::MissingCredentials);
        }

        debug!("authenticating with username '{}'", self.username);
        let username = self.username.clone();
        let password = self.password.clone();
        let form = [("username", username.as_str()), ("password", password.as_str())];

        let response = self
            .request(HttpMethod::Post, ENDPOINT_LOGIN, Some(&form[..]), false)
            .inspect_err(|_| error!("there was a failure to log in"))?;

        let login_resp: Value = serde_json::from_str(&response.body).map_err(|e| {
            error!("login response was not valid JSON: {e}");
            ApiError::DeserializationError(e.to_string())
        })?;
        let identity = Identity::from_login_response(&login_resp)
            .inspect_err(|e| error!("login response lacked identifiers: {e}"))?;

        debug!("authenticated as UUID {}", identity.user_id);
        self.user_id = Some(identity.user_id);
        self.home_gym = Some(identity.home_gym);

        debug!("storing cookies to {}", self.store.path().display());
        let state = PersistedState {
            cookies: self.session.cookies().clone(),
            login_resp,
        };
        if let Err(e) = self.store.save(&state) {
            warn!("failed to persist session state: {e}");
        }

        Ok(())
    }

    /// Current member count at `location_id`.
    ///
    /// `Ok(None)` means the server answered without a `currentCapacity`
    /// field.
    pub fn get_gym_occupancy(&mut self, location_id: &str) -> Result<Option<i64>, ApiError> {
        let Some(user_id) = self.user_id.as_deref() else {
            error!("cannot fetch gym occupancy before logging in");
            return Err(ApiError::NotLoggedIn);
        };
        let path = format!(
            "thegymgroup/v1.0/exerciser/{}/gym-busyness?gymLocationId={}",
            urlencoding::encode(user_id),
            urlencoding::encode(location_id)
        );

        let response = self
            .request(HttpMethod::Get, &path, None, true)
            .inspect_err(|_| error!("failed to retrieve gym occupancy"))?;

        let body: Value = serde_json::from_str(&response.body).map_err(|e| {
            error!("gym occupancy response was not valid JSON: {e}");
            ApiError::DeserializationError(e.to_string())
        })?;
        debug!("gym occupancy JSON: {body}");

        match body.get("currentCapacity") {
            None | Some(Value::Null) => Ok(None),
            Some(capacity) => capacity.as_i64().map(Some).ok_or_else(|| {
                error!("currentCapacity was not an integer: {capacity}");
                ApiError::DeserializationError(format!("currentCapacity: {capacity}"))
            }),
        }
    }

    /// Occupancy of the member's home club.
    pub fn get_home_gym_occupancy(&mut self) -> Result<Option<i64>, ApiError> {
        let Some(home_gym) = self.home_gym.clone() else {
            error!("no home gym known, log in first");
            return Err(ApiError::NoHomeGym);
        };
        self.get_gym_occupancy(&home_gym)
    }
}
