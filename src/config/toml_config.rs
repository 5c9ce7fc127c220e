use crate::adapters::LettreTransportConfig;
use crate::core::dispatch::DispatchOptions;
use crate::domain::model::SendMode;
use crate::utils::error::{MailerError, Result};
use crate::utils::validation::{
    validate_mailbox, validate_mailbox_list, validate_path, validate_required_field,
    validate_smtp_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub mail: MailConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub from: String,
    pub on_behalf_of: Option<String>,
    pub reply_to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub mode: SendMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_dir")]
    pub dir: String,
    #[serde(default)]
    pub open: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            dir: default_preview_dir(),
            open: false,
        }
    }
}

fn default_preview_dir() -> String {
    "./outbox".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub url: String,
}

impl MailerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MailerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MailerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SMTP_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MailerError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性 (送出模式需要 SMTP)
    pub fn validate_for_mode(&self, mode: SendMode) -> Result<()> {
        validate_mailbox("mail.from", &self.mail.from)?;

        if let Some(owner) = non_blank(&self.mail.on_behalf_of) {
            validate_mailbox("mail.on_behalf_of", &owner)?;
        }
        if let Some(reply_to) = non_blank(&self.mail.reply_to) {
            validate_mailbox("mail.reply_to", &reply_to)?;
        }
        if let Some(cc) = &self.mail.cc {
            validate_mailbox_list("mail.cc", cc)?;
        }
        if let Some(bcc) = &self.mail.bcc {
            validate_mailbox_list("mail.bcc", bcc)?;
        }
        for attachment in &self.mail.attachments {
            validate_path("mail.attachments", attachment)?;
        }

        validate_path("preview.dir", &self.preview.dir)?;

        if let Some(smtp) = &self.smtp {
            validate_smtp_url("smtp.url", &smtp.url)?;
        }
        if mode == SendMode::Send {
            validate_required_field("smtp", &self.smtp)?;
        }

        Ok(())
    }

    /// 取得預設模式
    pub fn mode(&self) -> SendMode {
        self.mail.mode
    }

    /// 每列郵件共用的設定
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            mode: self.mail.mode,
            cc: non_blank(&self.mail.cc),
            bcc: non_blank(&self.mail.bcc),
            reply_to: non_blank(&self.mail.reply_to),
            on_behalf_of: non_blank(&self.mail.on_behalf_of),
            attachments: self.mail.attachments.iter().map(PathBuf::from).collect(),
        }
    }

    pub fn transport_config(&self) -> LettreTransportConfig {
        LettreTransportConfig {
            from: self.mail.from.trim().to_string(),
            smtp_url: self.smtp.as_ref().map(|s| s.url.clone()),
            preview_dir: PathBuf::from(&self.preview.dir),
            open_previews: self.preview.open,
        }
    }
}

impl Validate for MailerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_for_mode(self.mail.mode)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
