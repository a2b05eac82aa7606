use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("pocketbook=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
    });
}

/// Generates the next record identifier for a collection.
///
/// Identifiers follow the `prefix_NNN` scheme: the numeric suffix is the
/// maximum suffix found among the existing identifiers plus one, zero-padded
/// to three digits. Identifiers that do not match the scheme are ignored.
pub fn next_record_id<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let marker = format!("{prefix}_");
    let max = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(&marker))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}_{:03}", prefix, max + 1)
}

#[cfg(test)]
mod tests {
    use super::next_record_id;

    #[test]
    fn first_id_starts_at_one() {
        assert_eq!(next_record_id("rec", []), "rec_001");
    }

    #[test]
    fn increments_past_the_maximum_suffix() {
        let ids = ["rec_001", "rec_017", "rec_004"];
        assert_eq!(next_record_id("rec", ids), "rec_018");
    }

    #[test]
    fn ignores_foreign_and_malformed_ids() {
        let ids = ["txn_120", "rec_abc", "rec_", "rec_002"];
        assert_eq!(next_record_id("rec", ids), "rec_003");
    }

    #[test]
    fn widens_beyond_three_digits() {
        let ids = ["ntf_999"];
        assert_eq!(next_record_id("ntf", ids), "ntf_1000");
    }
}
