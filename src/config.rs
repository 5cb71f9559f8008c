use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::library::{Framework, LibraryKind};

pub const CONFIG_FILE_NAME: &str = ".autoglotrc.json";

pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/*.test.tsx",
    "**/*.test.ts",
    "**/*.test.jsx",
    "**/*.test.js",
    "**/*.spec.tsx",
    "**/*.spec.ts",
    "**/*.spec.vue",
    "**/__tests__/**",
];

/// Settings for the LLM-assisted identifier and translation pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// Chat-completions style endpoint URL.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base retry delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Retry delay ceiling in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "AUTOGLOT_API_KEY".to_string()
}

fn default_max_concurrency() -> usize {
    3
}

fn default_batch_size() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            max_concurrency: default_max_concurrency(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default = "default_source_root")]
    pub source_root: String,
    /// Directory segment that anchors identifier prefixes (see `assign::prefix`).
    #[serde(default = "default_anchor_dir")]
    pub anchor_dir: String,
    #[serde(default = "default_framework")]
    pub framework: Framework,
    #[serde(default = "default_library")]
    pub library: LibraryKind,
    /// Import path for the non-hook global accessor (e.g. "@/i18n").
    #[serde(default = "default_global_import")]
    pub global_import: String,
    /// Optional namespace passed to hook/HOC bindings.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_locales_root", alias = "localesDir")]
    pub locales_root: String,
    /// Optional second locale directory whose entries override the primary.
    #[serde(default)]
    pub override_locales_root: Option<String>,
    #[serde(default = "default_source_locale")]
    pub source_locale: String,
    #[serde(default = "default_target_locales")]
    pub target_locales: Vec<String>,
    /// Attribute/prop names never extracted unless their value still
    /// contains ideographic text.
    #[serde(default = "default_technical_attributes")]
    pub technical_attributes: Vec<String>,
    /// Exact-match dictionary mapping common phrases to semantic parts.
    #[serde(default = "default_phrase_dictionary")]
    pub phrase_dictionary: HashMap<String, String>,
    #[serde(default = "default_ignore_test_files")]
    pub ignore_test_files: bool,
    #[serde(default)]
    pub llm: LlmConfig,
}

fn default_includes() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_source_root() -> String {
    "./".to_string()
}

fn default_anchor_dir() -> String {
    "src".to_string()
}

fn default_framework() -> Framework {
    Framework::React
}

fn default_library() -> LibraryKind {
    LibraryKind::ReactI18next
}

fn default_global_import() -> String {
    "@/i18n".to_string()
}

fn default_locales_root() -> String {
    "./locales".to_string()
}

fn default_source_locale() -> String {
    "zh".to_string()
}

fn default_target_locales() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_technical_attributes() -> Vec<String> {
    [
        "className",
        "class",
        "style",
        "id",
        "key",
        "ref",
        "name",
        "type",
        "href",
        "src",
        "width",
        "height",
        "size",
        "align",
        "valign",
        "color",
        "variant",
        "mode",
        "theme",
        "data-testid",
    ]
    .map(String::from)
    .to_vec()
}

fn default_phrase_dictionary() -> HashMap<String, String> {
    [
        ("确认", "confirm"),
        ("取消", "cancel"),
        ("保存", "save"),
        ("删除", "delete"),
        ("编辑", "edit"),
        ("搜索", "search"),
        ("提交", "submit"),
        ("重置", "reset"),
        ("加载中", "loading"),
        ("操作成功", "success"),
        ("操作失败", "failed"),
    ]
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .into_iter()
    .collect()
}

fn default_ignore_test_files() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignores: Vec::new(),
            includes: default_includes(),
            source_root: default_source_root(),
            anchor_dir: default_anchor_dir(),
            framework: default_framework(),
            library: default_library(),
            global_import: default_global_import(),
            namespace: None,
            locales_root: default_locales_root(),
            override_locales_root: None,
            source_locale: default_source_locale(),
            target_locales: default_target_locales(),
            technical_attributes: default_technical_attributes(),
            phrase_dictionary: default_phrase_dictionary(),
            ignore_test_files: default_ignore_test_files(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob patterns in `ignores` or `includes` are
    /// invalid, or if the library variant does not belong to the framework.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        // Include patterns without wildcards are treated as literal
        // directory paths, so bracketed route segments stay valid unescaped.
        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'includes': \"{}\"", pattern)
                })?;
            }
        }

        if self.library.framework() != self.framework {
            anyhow::bail!(
                "Library '{}' does not belong to framework '{}'",
                self.library,
                self.framework
            );
        }

        if self.target_locales.is_empty() {
            anyhow::bail!("'targetLocales' must list at least one locale");
        }

        Ok(())
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
