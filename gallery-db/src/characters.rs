//! Character aggregate storage.
//!
//! A character lives in three tables (`characters`, `stats`,
//! `customizations`) that share one primary key value. Every function here
//! takes the connection of an already open transaction; the caller decides
//! where the transaction boundary sits.

use gallery_core::{Character, CharacterId, Customization, Stats};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{DbError, DbResult, SqlResultExt};

/// Page size used when the caller passes a limit of 0
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Character repository for database operations
pub struct CharacterRepository;

impl CharacterRepository {
    /// Insert the base record, then stats and customization under the new id.
    pub async fn insert(
        conn: &mut SqliteConnection,
        character: &Character,
    ) -> DbResult<CharacterId> {
        let result = sqlx::query(
            "INSERT INTO characters (name, body_type, species, class)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&character.name)
        .bind(character.body_type.as_str())
        .bind(character.species.as_str())
        .bind(character.class.as_str())
        .execute(&mut *conn)
        .await
        .during("insert character")?;

        let id = CharacterId::new(result.last_insert_rowid());

        Self::insert_stats(conn, id, &character.stats).await?;
        Self::insert_customization(conn, id, &character.customization).await?;

        info!("Created character {} ({})", id, character.name);
        Ok(id)
    }

    async fn insert_stats(
        conn: &mut SqliteConnection,
        id: CharacterId,
        stats: &Stats,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO stats (id, strength, dexterity, constitution, intelligence, wisdom, charisma)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.get())
        .bind(stats.strength)
        .bind(stats.dexterity)
        .bind(stats.constitution)
        .bind(stats.intelligence)
        .bind(stats.wisdom)
        .bind(stats.charisma)
        .execute(&mut *conn)
        .await
        .during("insert stats")?;

        Ok(())
    }

    async fn insert_customization(
        conn: &mut SqliteConnection,
        id: CharacterId,
        customization: &Customization,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO customizations (id, hair, face, shirt, pants, shoes)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.get())
        .bind(customization.hair)
        .bind(customization.face)
        .bind(customization.shirt)
        .bind(customization.pants)
        .bind(customization.shoes)
        .execute(&mut *conn)
        .await
        .during("insert customization")?;

        Ok(())
    }

    /// Read the three records of a character.
    ///
    /// A miss on any of them means the character does not exist.
    pub async fn get(conn: &mut SqliteConnection, id: CharacterId) -> DbResult<Character> {
        let base = sqlx::query_as::<_, CharacterRow>(
            "SELECT id, name, body_type, species, class
             FROM characters
             WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .during("get character")?
        .ok_or(DbError::CharacterNotFound(id))?;

        let stats = sqlx::query_as::<_, StatsRow>(
            "SELECT strength, dexterity, constitution, intelligence, wisdom, charisma
             FROM stats
             WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .during("get stats")?
        .ok_or(DbError::CharacterNotFound(id))?;

        let customization = sqlx::query_as::<_, CustomizationRow>(
            "SELECT hair, face, shirt, pants, shoes
             FROM customizations
             WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .during("get customization")?
        .ok_or(DbError::CharacterNotFound(id))?;

        debug!("Loaded character {}", id);
        base.into_character(stats.into(), customization.into())
    }

    /// List characters ordered by id with their stats and customization.
    pub async fn list(
        conn: &mut SqliteConnection,
        page: u32,
        limit: u32,
    ) -> DbResult<Vec<Character>> {
        let limit = effective_page_size(limit);
        let offset = i64::from(page) * i64::from(limit);

        let rows = sqlx::query_as::<_, CharacterAggregateRow>(
            "SELECT c.id, c.name, c.body_type, c.species, c.class,
                    s.strength, s.dexterity, s.constitution, s.intelligence, s.wisdom, s.charisma,
                    cu.hair, cu.face, cu.shirt, cu.pants, cu.shoes
             FROM characters c
             JOIN stats s ON s.id = c.id
             JOIN customizations cu ON cu.id = c.id
             ORDER BY c.id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
        .during("list characters")?;

        rows.into_iter().map(Character::try_from).collect()
    }

    /// Total number of stored characters
    pub async fn count(conn: &mut SqliteConnection) -> DbResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM characters")
            .fetch_one(&mut *conn)
            .await
            .during("count characters")?;

        Ok(total.max(0) as u64)
    }

    /// Replace all three records of an existing character.
    ///
    /// Fails with `CharacterNotFound` before touching stats or customization
    /// when the base record is missing.
    pub async fn update(conn: &mut SqliteConnection, character: &Character) -> DbResult<()> {
        let id = character.id;

        let result = sqlx::query(
            "UPDATE characters
             SET name = ?, body_type = ?, species = ?, class = ?
             WHERE id = ?",
        )
        .bind(&character.name)
        .bind(character.body_type.as_str())
        .bind(character.species.as_str())
        .bind(character.class.as_str())
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .during("update character")?;

        if result.rows_affected() == 0 {
            return Err(DbError::CharacterNotFound(id));
        }

        let stats = &character.stats;
        let result = sqlx::query(
            "UPDATE stats
             SET strength = ?, dexterity = ?, constitution = ?,
                 intelligence = ?, wisdom = ?, charisma = ?
             WHERE id = ?",
        )
        .bind(stats.strength)
        .bind(stats.dexterity)
        .bind(stats.constitution)
        .bind(stats.intelligence)
        .bind(stats.wisdom)
        .bind(stats.charisma)
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .during("update stats")?;

        if result.rows_affected() == 0 {
            return Err(DbError::CharacterNotFound(id));
        }

        let customization = &character.customization;
        let result = sqlx::query(
            "UPDATE customizations
             SET hair = ?, face = ?, shirt = ?, pants = ?, shoes = ?
             WHERE id = ?",
        )
        .bind(customization.hair)
        .bind(customization.face)
        .bind(customization.shirt)
        .bind(customization.pants)
        .bind(customization.shoes)
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .during("update customization")?;

        if result.rows_affected() == 0 {
            return Err(DbError::CharacterNotFound(id));
        }

        info!("Updated character {}", id);
        Ok(())
    }

    /// Delete a character; stats, customization and inventory cascade.
    pub async fn delete(conn: &mut SqliteConnection, id: CharacterId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM characters WHERE id = ?")
            .bind(id.get())
            .execute(&mut *conn)
            .await
            .during("delete character")?;

        if result.rows_affected() == 0 {
            return Err(DbError::CharacterNotFound(id));
        }

        info!("Removed character {}", id);
        Ok(())
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`, 0 meaning default.
pub fn effective_page_size(limit: u32) -> u32 {
    match limit {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CharacterRow {
    id: i64,
    name: String,
    body_type: String,
    species: String,
    class: String,
}

impl CharacterRow {
    fn into_character(
        self,
        stats: Stats,
        customization: Customization,
    ) -> DbResult<Character> {
        Ok(Character {
            id: CharacterId::new(self.id),
            name: self.name,
            body_type: decode(&self.body_type)?,
            species: decode(&self.species)?,
            class: decode(&self.class)?,
            stats,
            customization,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    strength: u8,
    dexterity: u8,
    constitution: u8,
    intelligence: u8,
    wisdom: u8,
    charisma: u8,
}

impl From<StatsRow> for Stats {
    fn from(row: StatsRow) -> Self {
        Stats {
            strength: row.strength,
            dexterity: row.dexterity,
            constitution: row.constitution,
            intelligence: row.intelligence,
            wisdom: row.wisdom,
            charisma: row.charisma,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomizationRow {
    hair: u32,
    face: u32,
    shirt: u32,
    pants: u32,
    shoes: u32,
}

impl From<CustomizationRow> for Customization {
    fn from(row: CustomizationRow) -> Self {
        Customization {
            hair: row.hair,
            face: row.face,
            shirt: row.shirt,
            pants: row.pants,
            shoes: row.shoes,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CharacterAggregateRow {
    #[sqlx(flatten)]
    base: CharacterRow,
    #[sqlx(flatten)]
    stats: StatsRow,
    #[sqlx(flatten)]
    customization: CustomizationRow,
}

impl TryFrom<CharacterAggregateRow> for Character {
    type Error = DbError;

    fn try_from(row: CharacterAggregateRow) -> DbResult<Self> {
        row.base
            .into_character(row.stats.into(), row.customization.into())
    }
}

/// Parse a stored enumeration value.
pub(crate) fn decode<T>(raw: &str) -> DbResult<T>
where
    T: std::str::FromStr<Err = gallery_core::ParseError>,
{
    raw.parse().map_err(|e: gallery_core::ParseError| DbError::Decode(e.to_string()))
}
