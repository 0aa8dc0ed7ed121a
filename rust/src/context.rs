//! Per-call scheduling state.

/// Mutable state threaded through one scheduling call.
///
/// Holds the uid counter so concurrent calls never share identifiers.
#[derive(Debug)]
pub struct ScheduleContext {
    next_uid: u32,
    /// Logging verbosity for this call.
    pub verbosity: u8,
}

impl ScheduleContext {
    pub fn new(verbosity: u8) -> Self {
        Self {
            next_uid: 1,
            verbosity,
        }
    }

    /// Allocate the next task or buffer uid.
    pub fn next_uid(&mut self) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }
}
