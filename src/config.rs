use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // JWT設定
    /// 署名用シークレット（起動時に一度だけ読み込む。変更すると発行済みトークンは全て無効）
    pub jwt_secret: SecretBox<String>,
    #[serde(default = "default_jwt_ttl_secs")]
    pub jwt_ttl_secs: i64,

    // SMTP設定（オプション - email機能有効時のみ使用）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,
    #[serde(default)]
    pub smtp_from_address: Option<String>,

    // パスワードリセット設定
    #[serde(default = "default_password_reset_code_ttl_secs")]
    pub password_reset_code_ttl_secs: i64,

    // お問い合わせ通知の宛先（未設定なら通知しない）
    #[serde(default)]
    pub contact_notification_to: Option<String>,

    // 初期管理者（両方設定されている場合のみ起動時に作成）
    #[serde(default)]
    pub admin_email: Option<String>,
    pub admin_password: Option<SecretBox<String>>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_JWT_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_PASSWORD_RESET_CODE_TTL_SECS: i64 = 15 * 60;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_database_max_connections() -> u32 {
    DEFAULT_DATABASE_MAX_CONNECTIONS
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_jwt_ttl_secs() -> i64 {
    DEFAULT_JWT_TTL_SECS
}

fn default_password_reset_code_ttl_secs() -> i64 {
    DEFAULT_PASSWORD_RESET_CODE_TTL_SECS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// SMTP送信に必要な設定が揃っているか
    pub fn smtp_configured(&self) -> bool {
        self.smtp_host.is_some()
            && self.smtp_username.is_some()
            && self.smtp_password.is_some()
            && self.smtp_from_address.is_some()
    }
}
