//! Common repository traits.
//!
//! Generic interfaces for the database operations the repositories share.

/// Trait for creating new entities in the database.
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with ID assigned)
/// * `CreateData` - Row data for creation
pub trait Create<Entity, CreateData> {
    /// Creates a new entity in the database.
    ///
    /// # Returns
    /// * `Ok(Entity)` - Created entity
    /// * `Err(sqlx::Error)` - Error during insertion (unique violations are
    ///   propagated so callers can treat them as domain signals)
    async fn create(&self, data: &CreateData) -> Result<Entity, sqlx::Error>;
}

/// Trait for reading a single entity by primary key.
pub trait Read<Entity, Id> {
    /// Reads an entity by its primary key.
    ///
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that ID
    /// * `Err(sqlx::Error)` - Error during reading
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}
