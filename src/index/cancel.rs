//! Single-slot stop signal for the running index job / 运行中任务的停止信号
//!
//! Behaves like a one-buffered channel with a non-blocking send: a stop
//! request is delivered at most once, and dropped silently when nobody can
//! take it. Install/clear are exclusive to the job that owns the slot, so
//! the slot doubles as the single-flight gate for new jobs.

use parking_lot::Mutex;
use tokio::sync::mpsc;

pub struct CancelSlot {
    tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl CancelSlot {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    /// Install a fresh signal channel and hand back its receiver.
    /// Returns `None` when a job already owns the slot.
    /// 安装新的信号通道，已被占用时返回 None
    pub fn try_install(&self) -> Option<mpsc::Receiver<()>> {
        let mut slot = self.tx.lock();
        if slot.is_some() {
            return None;
        }
        let (tx, rx) = mpsc::channel(1);
        *slot = Some(tx);
        Some(rx)
    }

    /// Non-blocking stop request. Returns `false` when no job is running.
    /// 非阻塞停止请求
    pub fn request_stop(&self) -> bool {
        match *self.tx.lock() {
            Some(ref tx) => {
                // 至多一次投递：缓冲已满则静默丢弃
                let _ = tx.try_send(());
                true
            }
            None => false,
        }
    }

    /// Remove the installed channel when the job ends / 任务结束时移除通道
    pub fn clear(&self) {
        *self.tx.lock() = None;
    }

    pub fn is_installed(&self) -> bool {
        self.tx.lock().is_some()
    }
}

impl Default for CancelSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_exclusive() {
        let slot = CancelSlot::new();
        assert!(!slot.is_installed());

        let _rx = slot.try_install().unwrap();
        assert!(slot.is_installed());
        assert!(slot.try_install().is_none());

        slot.clear();
        assert!(!slot.is_installed());
        assert!(slot.try_install().is_some());
    }

    #[test]
    fn test_request_stop_without_job() {
        let slot = CancelSlot::new();
        assert!(!slot.request_stop());
    }

    #[test]
    fn test_double_stop_delivers_once() {
        let slot = CancelSlot::new();
        let mut rx = slot.try_install().unwrap();

        // 连续两次停止请求，只有一个信号入队
        assert!(slot.request_stop());
        assert!(slot.request_stop());

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_after_clear_fails() {
        let slot = CancelSlot::new();
        let _rx = slot.try_install().unwrap();
        slot.clear();
        assert!(!slot.request_stop());
    }
}
