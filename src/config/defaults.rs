use std::time::Duration;

pub(super) fn default_position() -> String {
    "top-right".to_string()
}

pub(super) const fn default_max_toasts() -> usize {
    5
}

pub(super) const fn default_enable_sounds() -> bool {
    true
}

pub(super) const fn default_duration() -> Duration {
    Duration::from_millis(4_000)
}

pub(super) const fn default_settle_duration() -> Duration {
    Duration::from_millis(4_000)
}

pub(super) const fn default_eviction_delay() -> Duration {
    Duration::from_millis(50)
}

pub(super) const fn default_progress_tick() -> Duration {
    Duration::from_millis(100)
}
