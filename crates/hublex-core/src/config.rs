//! Configuration types for hublex.
//!
//! [`Config::load`] reads `~/.config/hublex/config.toml`, creating it with
//! hardcoded defaults if it does not yet exist. [`Config::defaults`] returns
//! the same defaults without touching the filesystem (useful in tests).
//!
//! The keyword-to-category tables under `[keywords]` drive the heuristic
//! query classification. Extending coverage (new cities, new renewal-term
//! synonyms) is a config edit, not a code change.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[remote]
base_url  = "https://api.hubapi.com"
token_env = "HUBLEX_CRM_TOKEN"

[server]
addr = "0.0.0.0:8000"

[cache]
ttl_secs         = 3600
encyclopedia_dir = "encyclopedia"
sample_size      = 100

[search]
default_limit      = 200
max_limit          = 1000
display_properties = [
    "name", "domain", "hubspot_owner_id", "account_status",
    "next_renewal_date", "renewal_status", "city", "state", "industry",
]

[keywords]
owner_cues              = ["owner", "owned by", "'s", "portfolio"]
identity_cues           = ["my name", "in my name", "my "]
renewal                 = ["renewal", "renew", "texting renewal", "text renewal", "upcoming renewal"]
renewal_property_tokens = ["renewal", "renew", "next_", "due", "expire"]
priority_date_token     = "texting"

[keywords.cities]
dallas           = "Dallas"
texas            = "TX"
houston          = "Houston"
austin           = "Austin"
"san antonio"    = "San Antonio"
"new york"       = "New York"
chicago          = "Chicago"
"los angeles"    = "Los Angeles"
miami            = "Miami"
atlanta          = "Atlanta"
denver           = "Denver"
seattle          = "Seattle"
portland         = "Portland"
phoenix          = "Phoenix"
"salt lake city" = "Salt Lake City"
provo            = "Provo"
utah             = "UT"

[keywords.tiers]
enterprise   = ["enterprise", "large", "big"]
small        = ["small", "startup"]
professional = ["professional", "pro"]
standard     = ["standard", "regular"]
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration, loaded from
/// `~/.config/hublex/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub keywords: KeywordTables,
}

/// `[remote]` section — where the CRM API lives.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_base_url() -> String { "https://api.hubapi.com".to_string() }
fn default_token_env() -> String { "HUBLEX_CRM_TOKEN".to_string() }

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
        }
    }
}

/// `[server]` section of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String { "0.0.0.0:8000".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: default_addr() }
    }
}

/// `[cache]` section — expiry and persistence locations.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Schema and value cache entries expire this many seconds after fetch.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Directory holding one encyclopedia JSON file per object type.
    #[serde(default = "default_encyclopedia_dir")]
    pub encyclopedia_dir: PathBuf,
    /// How many live records an export samples per object type.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_ttl_secs() -> u64 { 3600 }
fn default_encyclopedia_dir() -> PathBuf { PathBuf::from("encyclopedia") }
fn default_sample_size() -> usize { 100 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            encyclopedia_dir: default_encyclopedia_dir(),
            sample_size: default_sample_size(),
        }
    }
}

/// `[search]` section — limits and the display properties requested from
/// the remote search API.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default)]
    pub display_properties: Vec<String>,
}

fn default_limit() -> usize { 200 }
fn default_max_limit() -> usize { 1000 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            display_properties: Vec::new(),
        }
    }
}

/// `[keywords]` section — the heuristic classification tables.
///
/// These are data, not code: the resolvers consult them but never hardcode
/// the vocabulary themselves.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordTables {
    /// Cues that must be present before owner resolution activates.
    #[serde(default = "default_owner_cues")]
    pub owner_cues: Vec<String>,
    /// Cues that trigger identity-hint (caller email) owner matching.
    #[serde(default = "default_identity_cues")]
    pub identity_cues: Vec<String>,
    /// Vocabulary that triggers renewal/date resolution.
    #[serde(default = "default_renewal")]
    pub renewal: Vec<String>,
    /// Tokens that mark a property name as renewal/expiry-related.
    #[serde(default = "default_renewal_property_tokens")]
    pub renewal_property_tokens: Vec<String>,
    /// A property name containing this token outranks generic renewal
    /// properties (the channel-qualified variant).
    #[serde(default = "default_priority_date_token")]
    pub priority_date_token: String,
    /// Location term → internal value. Two-character values are state
    /// codes; anything longer is a city name.
    #[serde(default)]
    pub cities: BTreeMap<String, String>,
    /// Tier label (lowercased) → synonyms that also match it.
    #[serde(default)]
    pub tiers: BTreeMap<String, Vec<String>>,
}

fn default_owner_cues() -> Vec<String> {
    ["owner", "owned by", "'s", "portfolio"]
        .map(String::from)
        .to_vec()
}
fn default_identity_cues() -> Vec<String> {
    ["my name", "in my name", "my "].map(String::from).to_vec()
}
fn default_renewal() -> Vec<String> {
    // Bare "next" or "upcoming" is not renewal intent on its own; only the
    // renewal-qualified phrases trigger date resolution.
    [
        "renewal",
        "renew",
        "texting renewal",
        "text renewal",
        "upcoming renewal",
    ]
    .map(String::from)
    .to_vec()
}
fn default_renewal_property_tokens() -> Vec<String> {
    ["renewal", "renew", "next_", "due", "expire"]
        .map(String::from)
        .to_vec()
}
fn default_priority_date_token() -> String { "texting".to_string() }

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            owner_cues: default_owner_cues(),
            identity_cues: default_identity_cues(),
            renewal: default_renewal(),
            renewal_property_tokens: default_renewal_property_tokens(),
            priority_date_token: default_priority_date_token(),
            cities: BTreeMap::new(),
            tiers: BTreeMap::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `~/.config/hublex/config.toml`, layered on top of the
    /// built-in defaults. Creates the file with defaults if it does not
    /// exist.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = config_path();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = std::fs::write(&path, DEFAULT_CONFIG.trim_start());
        }

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(false))
            .build()?
            .try_deserialize()
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache.ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("hublex")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
