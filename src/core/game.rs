/// Host-owned game record, borrowed by the engine for one lookup
///
/// The host application owns its game objects; the engine only needs the
/// external identifier plus the loading/persistence hooks invoked around a
/// lookup. All methods must be callable from a background task.
pub trait GameRecord: Send + Sync {
    /// Source tag the entry originated from (storefront/launcher integration)
    fn source(&self) -> &str;

    /// External game id, e.g. `steam_730`
    fn game_id(&self) -> &str;

    /// Adjust the record's loading counter (+1 when a lookup starts, -1 when it settles)
    fn set_loading(&self, delta: i32);

    /// Persist the record (batch import path)
    fn save(&self);

    /// Refresh the record in place (interactive path)
    fn update(&self);
}
