use core::time::Duration;

/// Join process counters
///
/// Counters only grow; they are never cleared by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Active and passive scans issued
    pub scans: u32,
    /// Calls to join, including retries after access denial
    pub join_attempts: u32,
    /// Successful associations
    pub join_successes: u32,
    /// Failed associations
    pub join_failures: u32,
    /// PAN advertisement solicits sent
    pub pas_sent: u32,
    /// PAN advertisement solicits suppressed
    pub pas_suppressed: u32,
    /// PAN configuration solicits sent
    pub pcs_sent: u32,
    /// PAN configuration solicits suppressed
    pub pcs_suppressed: u32,
    /// PAN advertisement solicits heard from neighbours
    pub pas_received: u32,
    /// PAN configuration solicits heard from neighbours
    pub pcs_received: u32,
    /// PAN advertisements received
    pub pa_received: u32,
    /// PAN configurations received
    pub pc_received: u32,
    /// Polls sent
    pub polls_sent: u32,
    /// Polls that failed with no-ack or channel-access failure
    pub poll_failures: u32,
    /// Data requests that failed with no-ack or channel-access failure
    pub data_failures: u32,
    /// Sync loss indications
    pub sync_losses: u32,
    /// Orphan scans issued
    pub orphan_scans: u32,
    /// Orphan recoveries completed
    pub orphan_recoveries: u32,
    /// Incoming frames dropped by the security check
    pub security_drops: u32,
    /// FH frames ignored because their IEs could not be parsed
    pub ie_parse_failures: u32,
    /// Attribute writes the MAC refused
    pub attribute_failures: u32,
    /// Time from the last rejoin request to its confirmation
    pub rejoin_delay: Option<Duration>,
}
