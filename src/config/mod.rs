pub mod cli;

use crate::domain::model::Network;
use crate::utils::error::{PipelineError, Result};
use crate::utils::validation::{
    normalize_customer_id, parse_id_list, require_non_empty, validate_path, validate_url,
    Validate,
};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_SHEET_RANGE: &str = "A:A";

/// Upper bound for `ADS_MAX_RETRIES`.
pub const MAX_ADS_RETRIES: u32 = 10;

#[derive(Clone, Parser)]
#[command(name = "ads-keyword-metrics")]
#[command(about = "Fetch Google Ads keyword plan metrics for a keyword list")]
pub struct CliConfig {
    #[arg(long, env = "LANGUAGE_ID", default_value_t = 1000)]
    pub language_id: u64,

    #[arg(long, env = "LOCATION_IDS", default_value = "2392")]
    pub location_ids: String,

    #[arg(long, env = "NETWORK", default_value = "GOOGLE_SEARCH")]
    pub network: String,

    #[arg(long, env = "SHEET_ID")]
    pub sheet_id: Option<String>,

    #[arg(long, env = "SHEET_TAB")]
    pub sheet_tab: Option<String>,

    #[arg(long, env = "SHEET_RANGE", default_value = DEFAULT_SHEET_RANGE)]
    pub sheet_range: String,

    #[arg(long, env = "OUT_TAB", default_value = "Results")]
    pub out_tab: String,

    #[arg(long, env = "COUNTRY", default_value = "SK")]
    pub country: String,

    #[arg(long, env = "LANG_TAG", default_value = "sk")]
    pub lang_tag: String,

    #[arg(long, env = "KEYWORDS_CSV", default_value = "keywords.csv")]
    pub keywords_csv: String,

    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: String,

    #[arg(long, env = "ADS_DEVELOPER_TOKEN", hide_env_values = true)]
    pub ads_developer_token: Option<String>,

    #[arg(long, env = "ADS_CLIENT_ID", hide_env_values = true)]
    pub ads_client_id: Option<String>,

    #[arg(long, env = "ADS_CLIENT_SECRET", hide_env_values = true)]
    pub ads_client_secret: Option<String>,

    #[arg(long, env = "ADS_REFRESH_TOKEN", hide_env_values = true)]
    pub ads_refresh_token: Option<String>,

    #[arg(long, env = "ADS_CLIENT_CUSTOMER_ID")]
    pub ads_client_customer_id: Option<String>,

    #[arg(long, env = "ADS_LOGIN_CUSTOMER_ID")]
    pub ads_login_customer_id: Option<String>,

    #[arg(long, env = "ADS_API_BASE", default_value = "https://googleads.googleapis.com")]
    pub ads_api_base: String,

    #[arg(long, env = "ADS_API_VERSION", default_value = "v21")]
    pub ads_api_version: String,

    #[arg(long, env = "ADS_MAX_RETRIES", default_value_t = 2)]
    pub ads_max_retries: u32,

    #[arg(long, env = "ADS_RETRY_BACKOFF_MS", default_value_t = 500)]
    pub ads_retry_backoff_ms: u64,

    #[arg(
        long,
        env = "GOOGLE_OAUTH_TOKEN_URL",
        default_value = "https://oauth2.googleapis.com/token"
    )]
    pub oauth_token_url: String,

    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_JSON", hide_env_values = true)]
    pub service_account_json: Option<String>,

    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_KEY", default_value = "sa.json")]
    pub service_account_key: String,

    #[arg(long, env = "SHEETS_API_BASE", default_value = "https://sheets.googleapis.com/v4")]
    pub sheets_api_base: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log process CPU and memory after each phase")]
    pub monitor: bool,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("language_id", &self.language_id)
            .field("location_ids", &self.location_ids)
            .field("network", &self.network)
            .field("sheet_id", &self.sheet_id)
            .field("sheet_tab", &self.sheet_tab)
            .field("sheet_range", &self.sheet_range)
            .field("out_tab", &self.out_tab)
            .field("keywords_csv", &self.keywords_csv)
            .field("output_dir", &self.output_dir)
            .field("ads_api_base", &self.ads_api_base)
            .field("ads_api_version", &self.ads_api_version)
            .field("sheets_api_base", &self.sheets_api_base)
            .finish_non_exhaustive()
    }
}

/// Where keywords come from.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordSource {
    Sheet {
        spreadsheet_id: String,
        tab: Option<String>,
        range: String,
    },
    Csv {
        path: String,
    },
}

/// Spreadsheet sink settings; present only when a spreadsheet id is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOutput {
    pub spreadsheet_id: String,
    pub tab: String,
    pub country: String,
    pub language_tag: String,
}

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub language_id: u64,
    pub location_ids: Vec<u64>,
    pub network: Network,
    pub source: KeywordSource,
    pub sheet_output: Option<SheetOutput>,
    pub output_dir: String,
}

#[derive(Clone)]
pub struct AdsCredentials {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub customer_id: String,
    pub login_customer_id: Option<String>,
}

impl fmt::Debug for AdsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdsCredentials")
            .field("developer_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("customer_id", &self.customer_id)
            .field("login_customer_id", &self.login_customer_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AdsSettings {
    pub credentials: AdsCredentials,
    pub api_base: String,
    pub api_version: String,
    pub token_url: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Clone)]
pub enum ServiceAccountSource {
    Inline(String),
    File(PathBuf),
}

impl fmt::Debug for ServiceAccountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceAccountSource::Inline(_) => f.write_str("Inline(<redacted>)"),
            ServiceAccountSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub api_base: String,
    pub service_account: ServiceAccountSource,
}

/// Everything `main` needs, assembled once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub run: RunContext,
    pub ads: AdsSettings,
    pub sheets: Option<SheetsSettings>,
}

impl CliConfig {
    fn spreadsheet_id(&self) -> Option<String> {
        self.sheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    pub fn run_context(&self) -> Result<RunContext> {
        let location_ids = parse_id_list("LOCATION_IDS", &self.location_ids)?;
        let spreadsheet_id = self.spreadsheet_id();

        let source = match &spreadsheet_id {
            Some(id) => {
                let range = match self.sheet_range.trim() {
                    "" => DEFAULT_SHEET_RANGE.to_string(),
                    r => r.to_string(),
                };
                KeywordSource::Sheet {
                    spreadsheet_id: id.clone(),
                    tab: self
                        .sheet_tab
                        .as_deref()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                    range,
                }
            }
            None => KeywordSource::Csv {
                path: self.keywords_csv.clone(),
            },
        };

        let sheet_output = spreadsheet_id.map(|id| SheetOutput {
            spreadsheet_id: id,
            tab: self.out_tab.trim().to_string(),
            country: self.country.clone(),
            language_tag: self.lang_tag.clone(),
        });

        Ok(RunContext {
            language_id: self.language_id,
            location_ids,
            network: Network::from_setting(&self.network),
            source,
            sheet_output,
            output_dir: self.output_dir.clone(),
        })
    }

    pub fn ads_settings(&self) -> Result<AdsSettings> {
        let customer_id = require_non_empty(
            "ADS_CLIENT_CUSTOMER_ID",
            self.ads_client_customer_id.as_deref(),
        )?;
        let login_customer_id = self
            .ads_login_customer_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| normalize_customer_id("ADS_LOGIN_CUSTOMER_ID", id))
            .transpose()?;

        let credentials = AdsCredentials {
            developer_token: require_non_empty(
                "ADS_DEVELOPER_TOKEN",
                self.ads_developer_token.as_deref(),
            )?,
            client_id: require_non_empty("ADS_CLIENT_ID", self.ads_client_id.as_deref())?,
            client_secret: require_non_empty(
                "ADS_CLIENT_SECRET",
                self.ads_client_secret.as_deref(),
            )?,
            refresh_token: require_non_empty(
                "ADS_REFRESH_TOKEN",
                self.ads_refresh_token.as_deref(),
            )?,
            customer_id: normalize_customer_id("ADS_CLIENT_CUSTOMER_ID", &customer_id)?,
            login_customer_id,
        };

        Ok(AdsSettings {
            credentials,
            api_base: self.ads_api_base.trim_end_matches('/').to_string(),
            api_version: self.ads_api_version.clone(),
            token_url: self.oauth_token_url.clone(),
            max_retries: self.ads_max_retries,
            retry_backoff_ms: self.ads_retry_backoff_ms,
        })
    }

    pub fn sheets_settings(&self) -> Option<SheetsSettings> {
        self.spreadsheet_id()?;

        let service_account = match self
            .service_account_json
            .as_deref()
            .filter(|json| !json.trim().is_empty())
        {
            Some(json) => ServiceAccountSource::Inline(json.to_string()),
            None => ServiceAccountSource::File(PathBuf::from(&self.service_account_key)),
        };

        Some(SheetsSettings {
            api_base: self.sheets_api_base.trim_end_matches('/').to_string(),
            service_account,
        })
    }

    /// Validates the raw settings and assembles the immutable configuration.
    pub fn into_app_config(self) -> Result<AppConfig> {
        self.validate()?;
        Ok(AppConfig {
            run: self.run_context()?,
            ads: self.ads_settings()?,
            sheets: self.sheets_settings(),
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("ADS_API_BASE", &self.ads_api_base)?;
        validate_url("GOOGLE_OAUTH_TOKEN_URL", &self.oauth_token_url)?;
        validate_path("OUTPUT_DIR", &self.output_dir)?;
        if self.ads_max_retries > MAX_ADS_RETRIES {
            return Err(PipelineError::InvalidConfigValueError {
                field: "ADS_MAX_RETRIES".to_string(),
                value: self.ads_max_retries.to_string(),
                reason: format!("must be at most {}", MAX_ADS_RETRIES),
            });
        }

        if self.spreadsheet_id().is_some() {
            validate_url("SHEETS_API_BASE", &self.sheets_api_base)?;
            validate_path("OUT_TAB", self.out_tab.trim())?;
        } else {
            validate_path("KEYWORDS_CSV", &self.keywords_csv)?;
        }
        Ok(())
    }
}
