use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const REFERRAL_CODE_LENGTH: usize = 8;

/// Eight characters drawn uniformly from `[A-Za-z0-9]`.
pub fn generate_referral_code() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LENGTH)
        .map(char::from)
        .collect()
}
