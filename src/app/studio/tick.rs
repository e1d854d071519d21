use super::Studio;
use crate::kernel::Action as KernelAction;
use std::time::{Duration, Instant};

impl Studio {
    /// 处理到期的防抖提交与自动保存，再收取异步结果
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.dispatch_kernel(KernelAction::Tick { now });
        changed |= self.poll_messages();
        changed |= self.poll_console();
        changed
    }

    pub fn poll_messages(&mut self) -> bool {
        let mut changed = false;
        while let Ok(msg) = self.rx.try_recv() {
            changed |= self.handle_message(msg);
        }
        changed
    }

    /// 控制台记录按到达顺序追加
    pub fn poll_console(&mut self) -> bool {
        let mut changed = false;
        while let Some(record) = self.console_rx.try_recv() {
            changed |= self.dispatch_kernel(KernelAction::Console(record));
        }
        changed
    }

    /// 阻塞等待所有已发起的构建完成；超时返回 false
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll_messages();
            self.poll_console();
            if self.builds_in_flight == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(msg) => {
                    self.handle_message(msg);
                }
                Err(_) => return false,
            }
        }
    }

    /// 等待下一条运行时消息（如目录读取结果）
    pub fn wait_message(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.handle_message(msg);
                self.poll_console();
                true
            }
            Err(_) => false,
        }
    }
}
