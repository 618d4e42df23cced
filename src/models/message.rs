use serde::Deserialize;

/// Token counters reported on an assistant message.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct MessageUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
}

/// Running sums over every usage record in a transcript.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UsageTotals {
    pub input: u64,
    pub output: u64,
    pub cache_write: u64,
    pub cache_read: u64,
    /// Number of usage records seen, including all-zero ones
    pub records: usize,
}

impl UsageTotals {
    pub fn add(&mut self, usage: &MessageUsage) {
        self.input += usage.input_tokens.unwrap_or(0);
        self.output += usage.output_tokens.unwrap_or(0);
        self.cache_write += usage.cache_creation_input_tokens.unwrap_or(0);
        self.cache_read += usage.cache_read_input_tokens.unwrap_or(0);
        self.records += 1;
    }
}
