use rustc_hash::FxHashMap;
use std::time::{Duration, Instant};

/// 每个文件一个提交截止时间；再次编辑会取消并重新计时
#[derive(Debug, Clone)]
pub struct CommitDebouncer {
    delay: Duration,
    deadlines: FxHashMap<String, Instant>,
}

impl CommitDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadlines: FxHashMap::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, path: &str, now: Instant) {
        self.deadlines.insert(path.to_string(), now + self.delay);
    }

    /// 返回是否确实有待提交的编辑
    pub fn cancel(&mut self, path: &str) -> bool {
        self.deadlines.remove(path).is_some()
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.deadlines.contains_key(path)
    }

    pub fn pending_count(&self) -> usize {
        self.deadlines.len()
    }

    /// 取出所有已到期的路径（按路径排序）
    pub fn take_due(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        due.sort();
        for path in &due {
            self.deadlines.remove(path);
        }
        due
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/debounce.rs"]
mod tests;
