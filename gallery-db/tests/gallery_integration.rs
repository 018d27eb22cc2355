use std::time::Duration;

use gallery_core::{
    BodyType, Character, Class, Customization, Item, ItemId, ItemPool, ItemType, Species,
    Stats,
};
use gallery_db::{Gallery, GalleryDbPool};
use tempfile::TempDir;

const DEADLINE: Duration = Duration::from_secs(5);

async fn open_gallery(max_connections: u32) -> (TempDir, Gallery) {
    let dir = tempfile::tempdir().unwrap();
    let db = GalleryDbPool::open(&dir.path().join("gallery.sqlite3"), max_connections)
        .await
        .unwrap();
    (dir, Gallery::new(db, DEADLINE))
}

fn aria() -> Character {
    Character::new(
        "Aria",
        BodyType::TypeA,
        Species::Human,
        Class::Fighter,
        Stats {
            strength: 15,
            dexterity: 12,
            constitution: 14,
            intelligence: 10,
            wisdom: 8,
            charisma: 11,
        },
        Customization {
            hair: 1,
            face: 2,
            shirt: 3,
            pants: 4,
            shoes: 5,
        },
    )
}

fn potion() -> Item {
    let mut item = Item::new(
        "Healing Potion",
        ItemType::Potion,
        "Restores a little health",
        false,
        1,
    );
    item.id = ItemId::new(1);
    item.heal_amount = Some(10);
    item
}

#[tokio::test]
async fn aria_inventory_lifecycle() {
    let (_dir, gallery) = open_gallery(4).await;
    gallery.seed_items(&[potion()]).await.unwrap();

    let mut character = aria();
    gallery.create(&mut character).await.unwrap();
    assert!(character.id.is_assigned());
    assert_eq!(gallery.get(character.id).await.unwrap(), character);

    let item_id = ItemId::new(1);
    gallery
        .add_item_to_character(character.id, item_id, 2)
        .await
        .unwrap();
    gallery
        .add_item_to_character(character.id, item_id, 3)
        .await
        .unwrap();

    let inventory = gallery.get_character_inventory(character.id).await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].item.name, "Healing Potion");
    assert_eq!(inventory[0].quantity, 5);

    gallery
        .remove_item_from_character(character.id, item_id, 10)
        .await
        .unwrap();
    assert!(gallery
        .get_character_inventory(character.id)
        .await
        .unwrap()
        .is_empty());

    gallery.remove(character.id).await.unwrap();
    assert!(gallery.get(character.id).await.unwrap_err().is_not_found());

    gallery.close().await;
}

#[tokio::test]
async fn seeding_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gallery.sqlite3");

    let gallery = Gallery::new(GalleryDbPool::open(&path, 2).await.unwrap(), DEADLINE);
    gallery.seed_items(&[potion()]).await.unwrap();
    gallery.close().await;

    // Second startup seeds again and still creates above the seeded ids
    let gallery = Gallery::new(GalleryDbPool::open(&path, 2).await.unwrap(), DEADLINE);
    gallery
        .seed_pool(&ItemPool::new(vec![potion()]))
        .await
        .unwrap();

    let mut rope = Item::new("Rope", ItemType::AdventuringGear, "Fifty feet", false, 1);
    gallery.create_item(&mut rope).await.unwrap();
    assert!(rope.id.get() > 1);
    assert_eq!(gallery.display_pool_items().await.unwrap().len(), 2);

    gallery.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_not_lost() {
    const ADDS: u8 = 20;

    let (_dir, gallery) = open_gallery(8).await;
    gallery.seed_items(&[potion()]).await.unwrap();
    let mut character = aria();
    gallery.create(&mut character).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..ADDS {
        let gallery = gallery.clone();
        let character_id = character.id;
        handles.push(tokio::spawn(async move {
            gallery
                .add_item_to_character(character_id, ItemId::new(1), 1)
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let inventory = gallery.get_character_inventory(character.id).await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].quantity, ADDS);

    gallery.close().await;
}
