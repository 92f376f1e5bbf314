use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static PERF_ENABLED: AtomicBool = AtomicBool::new(true);
static SLOW_TASK_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static INSTRUCTION_COUNT: Cell<u64> = Cell::new(0);
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 读取性能统计开关
///
/// 开关：
/// - 默认开启
/// - `SHIP_STOWAGE_PERF=0` 关闭
/// - `SHIP_STOWAGE_SLOW_TASK_MS=500` 配置慢任务阈值（毫秒）
pub fn install_from_env() {
    let enabled = std::env::var("SHIP_STOWAGE_PERF")
        .map(|v| is_true(&v))
        .unwrap_or(true);
    PERF_ENABLED.store(enabled, Ordering::Relaxed);

    let slow_ms = std::env::var("SHIP_STOWAGE_SLOW_TASK_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 2000 } else { 500 });
    SLOW_TASK_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);
}

/// 记录本线程当前任务生成的指令数
pub fn record_instructions(count: usize) {
    if !PERF_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    INSTRUCTION_COUNT.with(|c| c.set(c.get().saturating_add(count as u64)));
}

/// 性能统计 Guard：记录 elapsed_ms + 指令数
///
/// 使用方式：
/// ```ignore
/// let _perf = ship_stowage::perf::PerfGuard::new("simulate_travel", "naive_scan", "travel_1");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    strategy: String,
    travel: String,
    start: Instant,
    instruction_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str, strategy: &str, travel: &str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        let instruction_start = INSTRUCTION_COUNT.with(|c| c.get());
        Self {
            op,
            strategy: strategy.to_string(),
            travel: travel.to_string(),
            start: Instant::now(),
            instruction_start,
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let instruction_end = INSTRUCTION_COUNT.with(|c| c.get());
        let instructions = instruction_end.saturating_sub(self.instruction_start);

        if PERF_ENABLED.load(Ordering::Relaxed) {
            tracing::info!(
                target: "perf",
                op = self.op,
                strategy = %self.strategy,
                travel = %self.travel,
                elapsed_ms,
                instructions,
                "done"
            );

            let threshold = SLOW_TASK_THRESHOLD_MS.load(Ordering::Relaxed);
            if threshold > 0 && elapsed_ms >= threshold {
                tracing::warn!(
                    target: "perf",
                    op = self.op,
                    strategy = %self.strategy,
                    travel = %self.travel,
                    elapsed_ms,
                    "slow task"
                );
            }
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_counted_only_inside_guard() {
        record_instructions(5);
        let before = INSTRUCTION_COUNT.with(|c| c.get());
        {
            let _perf = PerfGuard::new("test", "naive_scan", "travel_1");
            record_instructions(3);
            record_instructions(2);
        }
        let after = INSTRUCTION_COUNT.with(|c| c.get());
        assert_eq!(after - before, 5, "Guard 外的指令不计入");
        assert_eq!(PERF_DEPTH.with(|d| d.get()), 0);
    }

    #[test]
    fn test_is_true() {
        assert!(is_true(" Yes "));
        assert!(is_true("1"));
        assert!(!is_true("off"));
    }
}
