// Posts and stories are keyed by UUIDv7 so ids sort by creation time.
// PostgreSQL cannot generate v7 ids, so they are minted app-side.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Parse a path or body id, accepting only canonical hyphenated UUIDs.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    Uuid::try_parse(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuidv7_is_valid() {
        let id = uuidv7();
        assert_eq!(id.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn uuidv7_is_monotonic() {
        let a = uuidv7();
        let b = uuidv7();
        assert!(b >= a);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_none());
        let id = uuidv7();
        assert_eq!(parse_id(&id.to_string()), Some(id));
    }

    #[test]
    fn parse_id_rejects_non_hyphenated_forms() {
        let id = uuidv7();
        assert_eq!(parse_id(&id.hyphenated().to_string()), Some(id));
        assert!(parse_id(&id.simple().to_string()).is_none());
        assert!(parse_id(&id.braced().to_string()).is_none());
        assert!(parse_id(&id.urn().to_string()).is_none());
    }
}
