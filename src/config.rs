//! Client configuration and device identity.
//!
//! Collects everything the session and client need to identify themselves
//! to the service:
//! * Application name/version for the `User-Agent`
//! * A stable mobile device ID, derived from the machine ID
//! * The ICU locale (`hl` query parameter) and subscription tier (`tier`)
//! * The directory where OAuth tokens are persisted per account

use std::path::PathBuf;

use uuid::Uuid;

/// Namespace for deriving stable device IDs from machine IDs.
const DEVICE_ID_NAMESPACE: &[u8] = b"music.google.com";

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,

    /// Account name used to keep stored tokens for different accounts apart.
    /// May be empty for a single-account setup.
    pub username: String,

    /// Mobile device ID sent as the `X-Device-ID` header. Streaming requires
    /// the ID of a device that was linked to the account.
    pub device_id: String,

    /// ICU locale used to localize some responses, e.g. `en_US`.
    pub locale: String,

    pub user_agent: String,

    /// Directory holding `<username>/<client>.token` files.
    pub token_dir: PathBuf,
}

impl Config {
    /// Creates a configuration for the given account.
    ///
    /// The device ID is derived from the machine ID so repeated runs on the
    /// same host present the same device to the service. When no machine ID
    /// can be obtained, a random ID is generated instead and a warning is
    /// logged; such an ID will not match any linked device.
    #[must_use]
    pub fn new(username: &str) -> Self {
        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();

        let device_uuid = match machine_uid::get() {
            Ok(machine_id) => {
                let namespace = Uuid::new_v5(&Uuid::NAMESPACE_DNS, DEVICE_ID_NAMESPACE);
                Uuid::new_v5(&namespace, machine_id.as_bytes())
            }
            Err(e) => {
                warn!("could not get machine id, using random device id: {e}");
                let random_bytes = fastrand::u128(..).to_ne_bytes();
                uuid::Builder::from_random_bytes(random_bytes).into_uuid()
            }
        };
        // Android device IDs are bare hex strings, not hyphenated UUIDs.
        let device_id = device_uuid.simple().to_string();
        trace!("device id: {device_id}");

        // Additional `User-Agent` string checks on top of `reqwest::HeaderValue`.
        let illegal_chars = |chr| chr == '/' || chr == ';';
        if app_name.is_empty()
            || app_name.contains(illegal_chars)
            || app_version.is_empty()
            || app_version.contains(illegal_chars)
        {
            panic!("application name and/or version invalid (\"{app_name}\"; \"{app_version}\")");
        }

        let os_name = match std::env::consts::OS {
            "macos" => "osx",
            other => other,
        };
        let os_version = sysinfo::System::os_version().unwrap_or_else(|| String::from("0"));
        if os_name.is_empty()
            || os_name.contains(illegal_chars)
            || os_version.is_empty()
            || os_version.contains(illegal_chars)
        {
            panic!("os name and/or version invalid (\"{os_name}\"; \"{os_version}\")");
        }

        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name}/{os_version})");
        trace!("user agent: {user_agent}");

        let token_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(&app_name);

        Self {
            app_name,
            app_version,

            username: username.to_owned(),
            device_id,

            locale: String::from("en_US"),

            user_agent,

            token_dir,
        }
    }
}
