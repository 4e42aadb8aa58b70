//! Content sniffing for binary data

/// Default number of leading bytes inspected
pub const DEFAULT_SNIFF_LIMIT: usize = 8192;

/// Share of control bytes (in percent) above which content counts as binary
const CONTROL_BYTE_PERCENT: usize = 30;

fn is_control(byte: u8) -> bool {
    match byte {
        b'\t' | b'\n' | b'\r' | 0x0c | 0x1b => false,
        byte => byte < 0x20 || byte == 0x7f,
    }
}

/// Binary when the sample has a NUL byte or too many control bytes
pub fn is_binary(content: &[u8], limit: usize) -> bool {
    let sample = &content[..content.len().min(limit)];
    if sample.is_empty() {
        return false;
    }

    if sample.contains(&0) {
        return true;
    }

    let control = sample.iter().filter(|&&b| is_control(b)).count();
    control * 100 > sample.len() * CONTROL_BYTE_PERCENT
}
