use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use super::email::{Mailer, OutgoingEmail};

/// 送信待ちキューの上限
const QUEUE_CAPACITY: usize = 256;

/// 非同期通知（fire-and-forget）
///
/// レスポンスは配信を待たない。配信失敗はログに残して破棄する。
/// 終了時は `shutdown` でキューに残った通知を送り切ってからワーカーを停止する。
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<OutgoingEmail>,
    stop: Arc<watch::Sender<bool>>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Notifier {
    /// ワーカータスクを起動（tokio ランタイム内で呼ぶこと）
    pub fn spawn(mailer: Arc<dyn Mailer>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (stop, stop_rx) = watch::channel(false);
        let worker = tokio::spawn(run_worker(rx, stop_rx, mailer));

        Self {
            tx,
            stop: Arc::new(stop),
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// 通知をキューに積む（待たない）
    pub fn notify(&self, email: OutgoingEmail) {
        if let Err(e) = self.tx.try_send(email) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "worker stopped",
            };
            tracing::warn!(reason, "通知を破棄");
        }
    }

    /// キューを送り切ってワーカーを停止
    pub async fn shutdown(&self) {
        self.stop.send_replace(true);

        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            tracing::error!(error = ?e, "通知ワーカーが異常終了");
        }
        tracing::info!("通知ワーカー停止");
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<OutgoingEmail>,
    mut stop: watch::Receiver<bool>,
    mailer: Arc<dyn Mailer>,
) {
    loop {
        tokio::select! {
            biased;
            Some(email) = rx.recv() => deliver(mailer.as_ref(), email).await,
            _ = stop.changed() => break,
            else => break,
        }
    }

    // 停止後に残っている分を配信
    rx.close();
    while let Some(email) = rx.recv().await {
        deliver(mailer.as_ref(), email).await;
    }
}

async fn deliver(mailer: &dyn Mailer, email: OutgoingEmail) {
    let to = email.to.clone();
    match mailer.send(email).await {
        Ok(()) => tracing::info!(to = %to, "通知メール送信完了"),
        Err(e) => tracing::error!(error = ?e, to = %to, "通知メールの送信に失敗（破棄）"),
    }
}
