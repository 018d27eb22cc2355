//! Item catalog storage.

use gallery_core::{Item, ItemId};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::characters::decode;
use crate::error::{DbError, DbResult, SqlResultExt};

const ITEM_COLUMNS: &str = "id, name, type, description, equippable, rarity,
     damage, defense, heal_amount, mana_cost, duration, cooldown, capacity";

/// Item repository for database operations
pub struct ItemRepository;

impl ItemRepository {
    /// Insert a new catalog entry and return the generated id.
    ///
    /// A duplicate name surfaces as `DbError::Conflict`.
    pub async fn insert(conn: &mut SqliteConnection, item: &Item) -> DbResult<ItemId> {
        let [damage, defense, heal_amount, mana_cost, duration, cooldown, capacity] =
            attribute_columns(item)?;

        let result = sqlx::query(
            "INSERT INTO items (name, type, description, equippable, rarity,
                                damage, defense, heal_amount, mana_cost, duration, cooldown, capacity)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.name)
        .bind(item.item_type.as_str())
        .bind(&item.description)
        .bind(item.equippable)
        .bind(item.rarity)
        .bind(damage)
        .bind(defense)
        .bind(heal_amount)
        .bind(mana_cost)
        .bind(duration)
        .bind(cooldown)
        .bind(capacity)
        .execute(&mut *conn)
        .await
        .during("insert item")?;

        let id = ItemId::new(result.last_insert_rowid());
        info!("Created item {} ({})", id, item.name);
        Ok(id)
    }

    /// Insert or overwrite a catalog entry keyed by its explicit id.
    pub async fn upsert_with_id(conn: &mut SqliteConnection, item: &Item) -> DbResult<()> {
        if !item.id.is_assigned() {
            return Err(DbError::InvalidInput(format!(
                "seed item '{}' has no id",
                item.name
            )));
        }

        let [damage, defense, heal_amount, mana_cost, duration, cooldown, capacity] =
            attribute_columns(item)?;

        sqlx::query(
            "INSERT INTO items (id, name, type, description, equippable, rarity,
                                damage, defense, heal_amount, mana_cost, duration, cooldown, capacity)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                description = excluded.description,
                equippable = excluded.equippable,
                rarity = excluded.rarity,
                damage = excluded.damage,
                defense = excluded.defense,
                heal_amount = excluded.heal_amount,
                mana_cost = excluded.mana_cost,
                duration = excluded.duration,
                cooldown = excluded.cooldown,
                capacity = excluded.capacity",
        )
        .bind(item.id.get())
        .bind(&item.name)
        .bind(item.item_type.as_str())
        .bind(&item.description)
        .bind(item.equippable)
        .bind(item.rarity)
        .bind(damage)
        .bind(defense)
        .bind(heal_amount)
        .bind(mana_cost)
        .bind(duration)
        .bind(cooldown)
        .bind(capacity)
        .execute(&mut *conn)
        .await
        .during("seed item")?;

        Ok(())
    }

    /// Raise the id counter so that generated ids land above every stored id.
    ///
    /// Never lowers the counter.
    pub async fn advance_sequence(conn: &mut SqliteConnection) -> DbResult<()> {
        let max_id: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM items")
            .fetch_one(&mut *conn)
            .await
            .during("read max item id")?;

        let Some(max_id) = max_id else {
            return Ok(());
        };

        let current: Option<i64> =
            sqlx::query_scalar("SELECT seq FROM sqlite_sequence WHERE name = 'items'")
                .fetch_optional(&mut *conn)
                .await
                .during("read item sequence")?;

        match current {
            Some(seq) if seq >= max_id => {}
            Some(_) => {
                sqlx::query("UPDATE sqlite_sequence SET seq = ? WHERE name = 'items' AND seq < ?")
                    .bind(max_id)
                    .bind(max_id)
                    .execute(&mut *conn)
                    .await
                    .during("advance item sequence")?;
                debug!("Advanced item sequence to {}", max_id);
            }
            None => {
                sqlx::query("INSERT INTO sqlite_sequence (name, seq) VALUES ('items', ?)")
                    .bind(max_id)
                    .execute(&mut *conn)
                    .await
                    .during("advance item sequence")?;
                debug!("Initialized item sequence at {}", max_id);
            }
        }

        Ok(())
    }

    /// Every catalog entry ordered by id.
    pub async fn list_all(conn: &mut SqliteConnection) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC"
        ))
        .fetch_all(&mut *conn)
        .await
        .during("list items")?;

        debug!("Loaded {} catalog items", rows.len());
        rows.into_iter().map(Item::try_from).collect()
    }

    pub async fn get(conn: &mut SqliteConnection, id: ItemId) -> DbResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"
        ))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .during("get item")?
        .ok_or(DbError::ItemNotFound(id))?;

        row.try_into()
    }
}

/// Database row for an item
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    id: i64,
    name: String,
    #[sqlx(rename = "type")]
    item_type: String,
    description: String,
    equippable: bool,
    rarity: u8,
    damage: Option<i64>,
    defense: Option<i64>,
    heal_amount: Option<i64>,
    mana_cost: Option<i64>,
    duration: Option<i64>,
    cooldown: Option<i64>,
    capacity: Option<i64>,
}

impl TryFrom<ItemRow> for Item {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        Ok(Item {
            id: ItemId::new(row.id),
            name: row.name,
            item_type: decode(&row.item_type)?,
            description: row.description,
            equippable: row.equippable,
            rarity: row.rarity,
            damage: attribute_value("damage", row.damage)?,
            defense: attribute_value("defense", row.defense)?,
            heal_amount: attribute_value("heal_amount", row.heal_amount)?,
            mana_cost: attribute_value("mana_cost", row.mana_cost)?,
            duration: attribute_value("duration", row.duration)?,
            cooldown: attribute_value("cooldown", row.cooldown)?,
            capacity: attribute_value("capacity", row.capacity)?,
        })
    }
}

/// Optional attributes in column order, narrowed to SQLite's signed integers.
fn attribute_columns(item: &Item) -> DbResult<[Option<i64>; 7]> {
    let attributes = [
        ("damage", item.damage),
        ("defense", item.defense),
        ("heal_amount", item.heal_amount),
        ("mana_cost", item.mana_cost),
        ("duration", item.duration),
        ("cooldown", item.cooldown),
        ("capacity", item.capacity),
    ];

    let mut columns = [None; 7];
    for (column, (name, value)) in columns.iter_mut().zip(attributes) {
        *column = value
            .map(|value| {
                i64::try_from(value).map_err(|_| {
                    DbError::InvalidInput(format!(
                        "{name} of item '{}' is too large to store: {value}",
                        item.name
                    ))
                })
            })
            .transpose()?;
    }
    Ok(columns)
}

fn attribute_value(name: &str, raw: Option<i64>) -> DbResult<Option<u64>> {
    raw.map(|raw| {
        u64::try_from(raw).map_err(|_| DbError::Decode(format!("negative {name}: {raw}")))
    })
    .transpose()
}
