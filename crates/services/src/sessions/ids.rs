use prep_core::Clock;
use prep_core::model::SessionId;
use rand::Rng;
use rand::distr::Alphanumeric;

const SUFFIX_LEN: usize = 6;

/// `<unix-millis>-<6 random alphanumerics>`, generated once per session.
pub(crate) fn new_session_id(clock: &Clock) -> SessionId {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    SessionId::from_parts(clock.now_millis(), &suffix.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::fixed_clock;

    #[test]
    fn session_id_has_timestamp_and_suffix() {
        let clock = fixed_clock();
        let id = new_session_id(&clock);
        let (millis, suffix) = id.as_str().split_once('-').unwrap();
        assert_eq!(millis, clock.now_millis().to_string());
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
