use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use corpsite::{
    app::create_router,
    config::Config,
    services::{LogMailer, Mailer},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ログ初期化（JSON形式、環境変数でレベル制御）
    init_tracing();

    tracing::info!("corpsite 起動中...");

    // 設定読み込み
    let config = Config::load().map_err(|e| {
        tracing::error!(error = ?e, "設定の読み込みに失敗");
        anyhow::anyhow!("Failed to load config: {}", e)
    })?;

    tracing::info!(host = %config.host, port = %config.port, "設定読み込み完了");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            tracing::error!(error = ?e, "アドレスのパースに失敗");
            anyhow::anyhow!("Failed to parse address: {}", e)
        })?;

    // データベース接続プール作成
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(config.database_url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "データベース接続に失敗");
            anyhow::anyhow!("Failed to connect to database: {}", e)
        })?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "マイグレーションに失敗");
            anyhow::anyhow!("Failed to run migrations: {}", e)
        })?;

    tracing::info!("データベース接続完了");

    let mailer = build_mailer(&config)?;

    // 初期管理者の設定は AppState に移す前に取り出す
    let bootstrap_admin = match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => Some((email.clone(), password.expose_secret().clone())),
        _ => None,
    };

    // AppState 構築
    let state = AppState::new(db_pool, mailer, config).map_err(|e| {
        tracing::error!(error = ?e, "AppState の構築に失敗");
        anyhow::anyhow!("Failed to create AppState: {}", e)
    })?;

    if let Some((email, password)) = bootstrap_admin {
        state
            .auth_service
            .ensure_admin(&email, &password)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "初期管理者の作成に失敗");
                anyhow::anyhow!("Failed to bootstrap admin: {}", e)
            })?;
        tracing::info!(email = %email, "初期管理者を確認");
    }

    let notifier = state.notifier.clone();
    let app = create_router(state);

    // サーバー起動
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(error = ?e, addr = %addr, "ポートのバインドに失敗");
        anyhow::anyhow!("Failed to bind to {}: {}", addr, e)
    })?;

    tracing::info!(addr = %addr, "サーバー起動");

    // Graceful shutdown 対応
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // サーバーの成否に関わらず未送信の通知を送り切る
    notifier.shutdown().await;

    served.map_err(|e| {
        tracing::error!(error = ?e, "サーバーエラー");
        anyhow::anyhow!("Server error: {}", e)
    })?;

    tracing::info!("サーバー終了");

    Ok(())
}

/// tracing の初期化（JSON形式）
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,corpsite=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// メーラーの選択（SMTP設定があり email 機能が有効な場合のみ実送信）
fn build_mailer(config: &Config) -> anyhow::Result<Arc<dyn Mailer>> {
    if let Some(smtp) = smtp_mailer(config)? {
        tracing::info!(smtp_host = ?config.smtp_host, "SMTP メーラーを使用");
        return Ok(smtp);
    }

    tracing::info!("開発モードのメーラーを使用（ログ出力のみ）");
    Ok(Arc::new(LogMailer))
}

#[cfg(feature = "email")]
fn smtp_mailer(config: &Config) -> anyhow::Result<Option<Arc<dyn Mailer>>> {
    let mailer = corpsite::services::email::SmtpMailer::from_config(config)?;
    Ok(mailer.map(|m| Arc::new(m) as Arc<dyn Mailer>))
}

#[cfg(not(feature = "email"))]
fn smtp_mailer(config: &Config) -> anyhow::Result<Option<Arc<dyn Mailer>>> {
    if config.smtp_configured() {
        tracing::warn!("SMTP 設定がありますが email 機能が無効です");
    }
    Ok(None)
}

/// Graceful shutdown シグナル待機
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Ctrl+C ハンドラーのインストールに失敗");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "SIGTERM ハンドラーのインストールに失敗");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, starting graceful shutdown");
        }
    }
}
