/// Map a library source tag to its GamesDB platform code
///
/// GamesDB only knows a handful of external platforms; anything else is
/// reported as unsupported before any network traffic happens.
pub fn gamesdb_platform(source: &str) -> Option<&'static str> {
    match source {
        "heroic_gog" => Some("gog"),
        "heroic_epic" => Some("epic"),
        "steam" => Some("steam"),
        "itch" => Some("itch"),
        _ => None,
    }
}

/// External release id: the last `_`-delimited segment of a game id
pub fn title_id(game_id: &str) -> &str {
    game_id.rsplit('_').next().unwrap_or(game_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_platforms() {
        assert_eq!(gamesdb_platform("heroic_gog"), Some("gog"));
        assert_eq!(gamesdb_platform("heroic_epic"), Some("epic"));
        assert_eq!(gamesdb_platform("steam"), Some("steam"));
        assert_eq!(gamesdb_platform("itch"), Some("itch"));
    }

    #[test]
    fn test_unsupported_platforms() {
        assert_eq!(gamesdb_platform("lutris"), None);
        assert_eq!(gamesdb_platform("flatpak"), None);
        assert_eq!(gamesdb_platform(""), None);
        // Tags are exact, not prefixed
        assert_eq!(gamesdb_platform("steam_flatpak"), None);
    }

    #[test]
    fn test_title_id_takes_last_segment() {
        assert_eq!(title_id("steam_730"), "730");
        assert_eq!(title_id("heroic_epic_fn_abc123"), "abc123");
        assert_eq!(title_id("730"), "730");
        assert_eq!(title_id(""), "");
    }
}
